use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `CADVIEW_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("CADVIEW_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 视图相关配置。颜色使用 `#RRGGBB` 字符串。
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "ViewerConfig::default_width")]
    pub viewport_width: f64,
    #[serde(default = "ViewerConfig::default_height")]
    pub viewport_height: f64,
    #[serde(default = "ViewerConfig::default_zoom_step")]
    pub zoom_step: f64,
    #[serde(default = "ViewerConfig::default_color")]
    pub default_color: String,
    #[serde(default = "ViewerConfig::default_background")]
    pub background: String,
}

impl ViewerConfig {
    fn default_width() -> f64 {
        800.0
    }

    fn default_height() -> f64 {
        600.0
    }

    fn default_zoom_step() -> f64 {
        1.2
    }

    fn default_color() -> String {
        "#FFFFFF".to_string()
    }

    fn default_background() -> String {
        "#1E1E1E".to_string()
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            viewport_width: Self::default_width(),
            viewport_height: Self::default_height(),
            zoom_step: Self::default_zoom_step(),
            default_color: Self::default_color(),
            background: Self::default_background(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// 打印场景概览。
    #[default]
    Summary,
    /// 额外渲染为 SVG 文件。
    Svg,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub default_output: OutputMode,
    #[serde(default)]
    pub svg_output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_used_for_missing_sections() {
        let cfg: AppConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.viewer.viewport_width, 800.0);
        assert_eq!(cfg.viewer.viewport_height, 600.0);
        assert_eq!(cfg.viewer.zoom_step, 1.2);
        assert_eq!(cfg.viewer.default_color, "#FFFFFF");
        assert_eq!(cfg.frontend.default_output, OutputMode::Summary);
        assert!(cfg.frontend.svg_output.is_none());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r##"
            [logging]
            level = "debug"

            [viewer]
            viewport_width = 1024.0
            zoom_step = 1.5
            background = "#000000"

            [frontend]
            default_output = "svg"
            svg_output = "out/plan.svg"
            "##
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.viewer.viewport_width, 1024.0);
        assert_eq!(cfg.viewer.viewport_height, 600.0);
        assert_eq!(cfg.viewer.zoom_step, 1.5);
        assert_eq!(cfg.viewer.background, "#000000");
        assert_eq!(cfg.frontend.default_output, OutputMode::Svg);
        assert_eq!(
            cfg.frontend.svg_output.as_deref(),
            Some(Path::new("out/plan.svg"))
        );
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[viewer]\nzoom_step = \"fast\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let missing = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
