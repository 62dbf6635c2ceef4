use std::fs;
use std::path::{Path, PathBuf};

use cadview_config::{AppConfig, OutputMode};
use cadview_core::scene::{Drawing, Entity, TextKind};
use cadview_engine::command::{CommandBus, CommandContext, CommandRequest};
use cadview_engine::session::ViewSession;
use cadview_engine::viewport::ViewportSize;
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{DocumentSource, LoadedSession, ViewerSettings, load_session};
use crate::svg::{passthrough_svg, render_svg};

/// 命令行传入的运行参数。
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub input: Option<PathBuf>,
    pub commands: Vec<String>,
    pub svg_output: Option<PathBuf>,
    pub size: Option<ViewportSize>,
}

/// 加载图纸、执行命令并打印场景概览；按需导出 SVG。
pub fn run(config: &AppConfig, options: &CliOptions) -> Result<(), FrontendError> {
    let mut settings = ViewerSettings::from_config(config)?;
    if let Some(size) = options.size {
        settings.size = size;
    }

    let mut loaded = load_session(options.input.as_deref(), &settings)?;
    let bus = CommandBus::new();
    for response in run_commands(&bus, &mut loaded.session, settings.zoom_step, &options.commands) {
        println!("{response}");
    }

    for line in describe_session(&loaded, &bus) {
        println!("{line}");
    }

    if let Some(path) = resolve_svg_output(config, options) {
        let document = svg_document(&loaded.session, &settings);
        write_output(&path, &document)?;
        info!(path = %path.display(), bytes = document.len(), "SVG 已导出");
        println!("已导出 SVG：{}", path.display());
    }
    Ok(())
}

/// 依次执行命令行，返回每条命令的结果描述。失败的命令只记录告警，不中断后续命令。
pub fn run_commands(
    bus: &CommandBus,
    session: &mut ViewSession,
    zoom_step: f64,
    lines: &[String],
) -> Vec<String> {
    let mut context = CommandContext::new(session);
    context.zoom_step = zoom_step;
    let mut results = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(request) = CommandRequest::parse(line) else {
            continue;
        };
        let response = bus.dispatch(&request, &mut context);
        let message = response.message.unwrap_or_default();
        if response.success {
            results.push(format!("> {line}: {message}"));
        } else {
            warn!(command = %line, "CLI 命令执行失败: {message}");
            results.push(format!("> {line}: 失败 ({message})"));
        }
    }
    results
}

/// 生成场景概览的文本行。
pub fn describe_session(loaded: &LoadedSession, bus: &CommandBus) -> Vec<String> {
    let session = &loaded.session;
    let mut lines = vec!["Rust 版 CAD 图纸查看器".to_string()];
    match &loaded.source {
        DocumentSource::File(path) => lines.push(format!("已从文件加载图纸：{}", path.display())),
        DocumentSource::Demo => lines.push("已加载内置示例图纸".to_string()),
    }

    match session.drawing() {
        Some(Drawing::Svg(markup)) => {
            lines.push(format!("SVG 文档，原样透传 {} 字节", markup.len()));
        }
        Some(Drawing::Dxf(scene)) => {
            let extents = scene.extents();
            lines.push(format!(
                "图纸范围=({:.2}, {:.2}) - ({:.2}, {:.2})",
                extents.min.x(),
                extents.min.y(),
                extents.max.x(),
                extents.max.y()
            ));
            lines.push("当前图层：".to_string());
            for layer in session.layers() {
                lines.push(format!(
                    "  - {} (可见: {}, 颜色: {})",
                    layer.name, layer.visible, layer.color
                ));
            }
            lines.push("当前实体：".to_string());
            for entity in scene.entities() {
                lines.push(format!("  - {}", describe_entity(entity)));
            }
        }
        None => lines.push("尚未加载图纸".to_string()),
    }

    let viewport = session.viewport();
    let pan = viewport.pan_offset();
    lines.push(format!(
        "视口缩放={:.3}, 平移=({:.2}, {:.2}), 工具={:?}",
        viewport.scale(),
        pan.x(),
        pan.y(),
        viewport.tool()
    ));
    lines.push(format!("支持的命令: {}", bus.available_commands().join(", ")));
    lines
}

fn describe_entity(entity: &Entity) -> String {
    let color = entity
        .color()
        .map(|rgb| rgb.to_hex())
        .unwrap_or_else(|| "随层".to_string());
    let detail = match entity {
        Entity::Line(line) => format!(
            "线段, 起点=({:.2}, {:.2}), 终点=({:.2}, {:.2})",
            line.start.x(),
            line.start.y(),
            line.end.x(),
            line.end.y()
        ),
        Entity::Polyline(polyline) => {
            let coords: Vec<String> = polyline
                .points
                .iter()
                .map(|p| format!("({:.2}, {:.2})", p.x(), p.y()))
                .collect();
            format!(
                "多段线, 顶点数={}, 闭合={}, 顶点={}",
                polyline.points.len(),
                if polyline.closed { "是" } else { "否" },
                coords.join(" -> ")
            )
        }
        Entity::Circle(circle) => format!(
            "圆, 圆心=({:.2}, {:.2}), 半径={:.2}",
            circle.center.x(),
            circle.center.y(),
            circle.radius
        ),
        Entity::Arc(arc) => format!(
            "圆弧, 圆心=({:.2}, {:.2}), 半径={:.2}, 起始角={:.1}°, 结束角={:.1}°",
            arc.center.x(),
            arc.center.y(),
            arc.radius,
            arc.start_angle,
            arc.end_angle
        ),
        Entity::Text(text) => format!(
            "{}, 插入点=({:.2}, {:.2}), 字高={:.2}, 内容={:?}",
            match text.kind {
                TextKind::Single => "单行文字",
                TextKind::Multi => "多行文字",
            },
            text.insert.x(),
            text.insert.y(),
            text.height,
            text.content
        ),
    };
    format!("{detail}, Layer={}, 颜色={color}", entity.layer_name())
}

/// 命令行参数优先；其次在 `svg` 输出模式下使用配置中的路径。
pub fn resolve_svg_output(config: &AppConfig, options: &CliOptions) -> Option<PathBuf> {
    if let Some(path) = &options.svg_output {
        return Some(path.clone());
    }
    match (config.frontend.default_output, &config.frontend.svg_output) {
        (OutputMode::Svg, Some(path)) => Some(path.clone()),
        (OutputMode::Svg, None) => {
            warn!("输出模式为 svg 但未配置 frontend.svg_output，跳过导出");
            None
        }
        (OutputMode::Summary, _) => None,
    }
}

/// SVG 图纸原样输出；DXF 场景按当前视口渲染。
pub fn svg_document(session: &ViewSession, settings: &ViewerSettings) -> String {
    match session.svg() {
        Some(markup) => passthrough_svg(markup),
        None => render_svg(&session.render(), session.container_size(), settings.background),
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), FrontendError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| FrontendError::WriteOutput {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| FrontendError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}
