pub mod dxf;
pub mod tags;

use std::fs;
use std::path::{Path, PathBuf};

use cadview_core::scene::{Drawing, SvgMarkup};
use thiserror::Error;
use tracing::{info, warn};

pub use dxf::{ParseReport, parse_dxf, parse_dxf_with_report};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported file format {path:?}: only .dxf and .svg can be opened")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 可接受的输入格式，按文件扩展名（不区分大小写）判定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Dxf,
    Svg,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("dxf") => Ok(Self::Dxf),
            Some("svg") => Ok(Self::Svg),
            _ => Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Drawing, IoError>;
}

/// 文件加载入口：按扩展名分派到 DXF 解析或 SVG 透传。
#[derive(Debug, Default)]
pub struct DrawingFacade;

impl DrawingFacade {
    pub fn new() -> Self {
        Self
    }

    /// 对已经读入内存的内容执行同样的分派逻辑。
    pub fn load_bytes(&self, format: SourceFormat, bytes: &[u8]) -> Drawing {
        // 老版本 DXF 常见 ANSI 编码，按有损 UTF-8 解码而不是拒绝。
        let text = String::from_utf8_lossy(bytes);
        match format {
            SourceFormat::Dxf => {
                let (scene, report) = parse_dxf_with_report(&text);
                if scene.is_empty() {
                    warn!(
                        tags = report.tag_count,
                        skipped = report.skipped_total(),
                        "DXF 内容未产生任何实体，使用占位范围"
                    );
                }
                Drawing::Dxf(scene)
            }
            SourceFormat::Svg => Drawing::Svg(SvgMarkup::new(text.into_owned())),
        }
    }
}

impl DocumentLoader for DrawingFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let format = SourceFormat::from_path(path)?;
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), ?format, bytes = bytes.len(), "读取图纸文件");
        Ok(self.load_bytes(format, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_detected_case_insensitively() {
        assert_eq!(
            SourceFormat::from_path(Path::new("plant/Panel.DXF")).unwrap(),
            SourceFormat::Dxf
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("logo.svg")).unwrap(),
            SourceFormat::Svg
        );
        let err = SourceFormat::from_path(Path::new("drawing.dwg")).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat { .. }));
        assert!(SourceFormat::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn non_utf8_bytes_degrade_instead_of_failing() {
        let facade = DrawingFacade::new();
        let mut bytes = b"0\nSECTION\n2\nENTITIES\n0\nTEXT\n10\n1\n20\n1\n1\n".to_vec();
        bytes.extend_from_slice(&[0xC4, 0xE3, b'\n']);
        match facade.load_bytes(SourceFormat::Dxf, &bytes) {
            Drawing::Dxf(scene) => assert_eq!(scene.entities().len(), 1),
            other => panic!("expected dxf scene, got {other:?}"),
        }
    }

    #[test]
    fn svg_is_passed_through_untouched() {
        let markup = "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect width=\"4\"/></svg>";
        match DrawingFacade::new().load_bytes(SourceFormat::Svg, markup.as_bytes()) {
            Drawing::Svg(svg) => assert_eq!(svg.as_str(), markup),
            other => panic!("expected svg, got {other:?}"),
        }
    }
}
