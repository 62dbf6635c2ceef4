use std::path::PathBuf;

use cadview_engine::errors::EngineError;
use cadview_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("配置项 {field} 的颜色 {value:?} 无效，应为 #RRGGBB")]
    InvalidColor { field: &'static str, value: String },
    #[error("写入输出文件 {path:?} 失败: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
