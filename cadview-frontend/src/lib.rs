pub mod cli;
pub mod errors;
pub mod loader;
pub mod svg;

use cadview_config::AppConfig;
use cli::CliOptions;
use errors::FrontendError;
use tracing::info;

/// 启动命令行前端。
pub fn run_cli(config: &AppConfig, options: &CliOptions) -> Result<(), FrontendError> {
    info!(
        input = ?options.input,
        commands = options.commands.len(),
        "启动 CLI 前端"
    );
    cli::run(config, options)
}
