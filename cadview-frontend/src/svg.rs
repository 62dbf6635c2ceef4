//! 将渲染帧序列化为独立的 SVG 文档。
//!
//! 全局变换写在外层 `<g>` 上（`translate(pan) scale(s, -s)`），图元保持数据坐标；
//! 文本额外包一层局部变换使字形正立。

use std::fmt::Write;

use cadview_core::color::Rgb;
use cadview_core::geometry::Point2;
use cadview_core::scene::SvgMarkup;
use cadview_engine::render::{DrawPrimitive, RenderFrame, RenderItem};
use cadview_engine::viewport::ViewportSize;
use glam::DAffine2;

pub fn render_svg(frame: &RenderFrame, size: ViewportSize, background: Rgb) -> String {
    let mut out = String::new();
    let transform = frame.transform;
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height
    );
    let _ = writeln!(
        out,
        r#"  <rect width="100%" height="100%" fill="{background}"/>"#
    );
    let _ = writeln!(
        out,
        r#"  <g transform="translate({} {}) scale({} {})" fill="none" stroke-width="{}">"#,
        transform.pan.x(),
        transform.pan.y(),
        transform.scale,
        -transform.scale,
        frame.stroke_width
    );
    for item in &frame.items {
        out.push_str("    ");
        write_item(&mut out, item);
        out.push('\n');
    }
    out.push_str("  </g>\n</svg>\n");
    out
}

/// SVG 透传内容原样输出。
pub fn passthrough_svg(markup: &SvgMarkup) -> String {
    markup.as_str().to_string()
}

fn write_item(out: &mut String, item: &RenderItem) {
    let color = item.color;
    let _ = match &item.primitive {
        DrawPrimitive::Segment { from, to } => write!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}"/>"#,
            from.x(),
            from.y(),
            to.x(),
            to.y()
        ),
        DrawPrimitive::Path { points, closed } => {
            write!(out, r#"<path d="{}" stroke="{color}"/>"#, path_data(points, *closed))
        }
        DrawPrimitive::Circle { center, radius } => write!(
            out,
            r#"<circle cx="{}" cy="{}" r="{radius}" stroke="{color}"/>"#,
            center.x(),
            center.y()
        ),
        DrawPrimitive::ArcPath {
            start,
            end,
            radius,
            large_arc,
            sweep,
        } => write!(
            out,
            r#"<path d="M {} {} A {radius} {radius} 0 {} {} {} {}" stroke="{color}"/>"#,
            start.x(),
            start.y(),
            u8::from(*large_arc),
            u8::from(*sweep),
            end.x(),
            end.y()
        ),
        DrawPrimitive::Label {
            anchor,
            height,
            content,
            local_transform,
        } => write!(
            out,
            r#"<text x="{}" y="{}" font-size="{height}" fill="{color}" stroke="none" transform="{}">{}</text>"#,
            anchor.x(),
            anchor.y(),
            matrix_attr(local_transform),
            escape_text(content)
        ),
    };
}

fn path_data(points: &[Point2], closed: bool) -> String {
    let mut data = String::new();
    for (index, point) in points.iter().enumerate() {
        let command = if index == 0 { 'M' } else { 'L' };
        if index > 0 {
            data.push(' ');
        }
        let _ = write!(data, "{command} {} {}", point.x(), point.y());
    }
    if closed && !points.is_empty() {
        data.push_str(" Z");
    }
    data
}

fn matrix_attr(affine: &DAffine2) -> String {
    let m = affine.matrix2;
    let t = affine.translation;
    format!(
        "matrix({} {} {} {} {} {})",
        m.x_axis.x, m.x_axis.y, m.y_axis.x, m.y_axis.y, t.x, t.y
    )
}

fn escape_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
