use std::path::PathBuf;

use cadview_config::{AppConfig, ConfigError};
use cadview_frontend::cli::CliOptions;
use cadview_frontend::loader::parse_size;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut options = CliOptions::default();
    let mut config_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--svg" => {
                let Some(path) = args.next() else {
                    eprintln!("`--svg` 需要提供输出文件路径");
                    std::process::exit(1);
                };
                options.svg_output = Some(PathBuf::from(path));
            }
            "--size" => {
                let Some(size) = args.next().as_deref().and_then(parse_size) else {
                    eprintln!("`--size` 需要形如 800x600 的正数尺寸");
                    std::process::exit(1);
                };
                options.size = Some(size);
            }
            "--cmd" => {
                let Some(command) = args.next() else {
                    eprintln!("`--cmd` 需要提供命令");
                    std::process::exit(1);
                };
                options.commands.push(command);
            }
            other if other.starts_with("--") => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
            path => {
                if options.input.is_some() {
                    eprintln!("只能指定一个输入文件：{path}");
                    std::process::exit(1);
                }
                options.input = Some(PathBuf::from(path));
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 CAD 图纸查看器");

    if let Err(err) = cadview_frontend::run_cli(&config, &options) {
        error!(error = %err, "执行 CLI 前端失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    if fmt().with_env_filter(filter).try_init().is_err() {
        // 已初始化
    }
}
