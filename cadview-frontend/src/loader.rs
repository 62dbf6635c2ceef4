use std::env;
use std::path::{Path, PathBuf};

use cadview_config::AppConfig;
use cadview_core::color::Rgb;
use cadview_core::scene::Drawing;
use cadview_engine::session::ViewSession;
use cadview_engine::viewport::ViewportSize;
use cadview_io::{DocumentLoader, DrawingFacade, parse_dxf};
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 内置示例：一个简化的电机控制柜布置图。
pub const DEMO_DXF: &str = "0\nSECTION\n2\nENTITIES\n\
0\nLWPOLYLINE\n8\nCABINET\n90\n4\n70\n1\n10\n0\n20\n0\n10\n200\n20\n0\n10\n200\n20\n120\n10\n0\n20\n120\n\
0\nLINE\n8\nRAIL\n62\n8\n10\n10\n20\n90\n11\n190\n21\n90\n\
0\nLINE\n8\nRAIL\n62\n8\n10\n10\n20\n40\n11\n190\n21\n40\n\
0\nCIRCLE\n8\nMOTORS\n10\n60\n20\n65\n40\n15\n\
0\nARC\n8\nMOTORS\n62\n1\n10\n140\n20\n65\n40\n18\n50\n300\n51\n60\n\
0\nTEXT\n8\nLABELS\n10\n52\n20\n62\n40\n6\n1\nM1\n\
0\nMTEXT\n8\nLABELS\n10\n10\n20\n112\n40\n5\n1\nMCC-01\\PMAIN PANEL\n\
0\nENDSEC\n0\nEOF\n";

/// 从环境变量读取示例 DXF 路径，用于 CLI 快速验证。
const SAMPLE_ENV: &str = "CADVIEW_SAMPLE_DXF";

/// 文档来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum DocumentSource {
    File(PathBuf),
    Demo,
}

/// 由配置解析出的视图参数。
#[derive(Debug, Clone, Copy)]
pub struct ViewerSettings {
    pub size: ViewportSize,
    pub zoom_step: f64,
    pub default_color: Rgb,
    pub background: Rgb,
}

impl ViewerSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, FrontendError> {
        let viewer = &config.viewer;
        Ok(Self {
            size: ViewportSize::new(viewer.viewport_width, viewer.viewport_height),
            zoom_step: viewer.zoom_step,
            default_color: parse_color("viewer.default_color", &viewer.default_color)?,
            background: parse_color("viewer.background", &viewer.background)?,
        })
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<Rgb, FrontendError> {
    Rgb::from_hex(value).ok_or_else(|| FrontendError::InvalidColor {
        field,
        value: value.to_string(),
    })
}

/// 解析 `WIDTHxHEIGHT` 形式的视口尺寸，两个分量都必须是正数。
pub fn parse_size(raw: &str) -> Option<ViewportSize> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    let width: f64 = width.trim().parse().ok()?;
    let height: f64 = height.trim().parse().ok()?;
    let usable = |value: f64| value.is_finite() && value > 0.0;
    (usable(width) && usable(height)).then(|| ViewportSize::new(width, height))
}

/// 统一封装加载后的会话与来源。
#[derive(Debug)]
pub struct LoadedSession {
    pub session: ViewSession,
    pub source: DocumentSource,
}

/// 将文件载入会话。读取失败时放弃本次加载，会话保留原有场景。
pub fn load_file_into(
    session: &mut ViewSession,
    loader: &dyn DocumentLoader,
    path: &Path,
) -> Result<(), FrontendError> {
    session.begin_load()?;
    match loader.load(path) {
        Ok(drawing) => {
            session.complete_load(drawing)?;
            info!(path = %path.display(), "图纸加载成功");
            Ok(())
        }
        Err(err) => {
            session.abort_load();
            Err(err.into())
        }
    }
}

/// 加载指定文件；未指定时尝试环境变量 `CADVIEW_SAMPLE_DXF`，
/// 失败则回退到内置示例。
pub fn load_session(
    input: Option<&Path>,
    settings: &ViewerSettings,
) -> Result<LoadedSession, FrontendError> {
    let mut session = ViewSession::new(settings.size).with_default_color(settings.default_color);
    let loader = DrawingFacade::new();

    if let Some(path) = input {
        load_file_into(&mut session, &loader, path)?;
        return Ok(LoadedSession {
            session,
            source: DocumentSource::File(path.to_path_buf()),
        });
    }

    if let Some(path) = env::var_os(SAMPLE_ENV) {
        let path = PathBuf::from(path);
        match load_file_into(&mut session, &loader, &path) {
            Ok(()) => {
                return Ok(LoadedSession {
                    session,
                    source: DocumentSource::File(path),
                });
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载示例图纸失败，回退到内置示例");
            }
        }
    }

    session.load(Drawing::Dxf(parse_dxf(DEMO_DXF)))?;
    Ok(LoadedSession {
        session,
        source: DocumentSource::Demo,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use cadview_core::scene::Entity;

    use super::*;

    fn settings() -> ViewerSettings {
        ViewerSettings::from_config(&AppConfig::default()).expect("default colors are valid")
    }

    #[test]
    fn demo_drawing_parses_into_every_entity_kind() {
        let scene = parse_dxf(DEMO_DXF);
        let kinds: Vec<&str> = scene.entities().iter().map(Entity::kind_name).collect();
        assert_eq!(
            kinds,
            vec!["LWPOLYLINE", "LINE", "LINE", "CIRCLE", "ARC", "TEXT", "MTEXT"]
        );
        let layers: Vec<&str> = scene.layers().collect();
        assert_eq!(layers, vec!["CABINET", "LABELS", "MOTORS", "RAIL"]);
        assert_eq!(scene.extents().max.x(), 200.0);
        assert_eq!(scene.extents().max.y(), 120.0);
    }

    #[test]
    fn explicit_path_loads_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".dxf")
            .tempfile()
            .expect("create temp file");
        write!(file, "0\nSECTION\n2\nENTITIES\n0\nCIRCLE\n10\n0\n20\n0\n40\n5\n").unwrap();

        let loaded = load_session(Some(file.path()), &settings()).expect("load file");
        assert!(matches!(loaded.source, DocumentSource::File(_)));
        assert_eq!(loaded.session.scene().map(|s| s.entities().len()), Some(1));
    }

    #[test]
    fn failed_load_keeps_previous_scene() {
        let mut session = ViewSession::new(ViewportSize::new(100.0, 100.0));
        session.load(Drawing::Dxf(parse_dxf(DEMO_DXF))).unwrap();
        let err = load_file_into(
            &mut session,
            &DrawingFacade::new(),
            Path::new("/no/such/panel.dxf"),
        )
        .unwrap_err();
        assert!(matches!(err, FrontendError::Io(_)));
        assert!(!session.is_loading());
        assert_eq!(session.scene().map(|s| s.entities().len()), Some(7));

        let err = load_file_into(&mut session, &DrawingFacade::new(), Path::new("notes.txt"))
            .unwrap_err();
        assert!(matches!(err, FrontendError::Io(cadview_io::IoError::UnsupportedFormat { .. })));
    }

    #[test]
    fn size_argument_parsing() {
        assert_eq!(parse_size("1024x768"), Some(ViewportSize::new(1024.0, 768.0)));
        assert_eq!(parse_size(" 640X480 "), Some(ViewportSize::new(640.0, 480.0)));
        assert_eq!(parse_size("0x480"), None);
        assert_eq!(parse_size("800"), None);
        assert_eq!(parse_size("widexhigh"), None);
    }

    #[test]
    fn invalid_color_in_config_is_rejected() {
        let mut config = AppConfig::default();
        config.viewer.background = "dark".to_string();
        let err = ViewerSettings::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            FrontendError::InvalidColor {
                field: "viewer.background",
                ..
            }
        ));
    }
}
