//! 实体到二维绘图图元的纯映射，不持有状态。

use std::collections::HashMap;

use cadview_core::color::Rgb;
use cadview_core::geometry::Point2;
use cadview_core::scene::{Arc, Entity, Scene};
use glam::{DAffine2, DVec2};

use crate::session::LayerView;
use crate::viewport::ViewTransform;

/// 与渲染后端无关的绘图图元，坐标均为数据空间。
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    Segment {
        from: Point2,
        to: Point2,
    },
    Path {
        points: Vec<Point2>,
        closed: bool,
    },
    Circle {
        center: Point2,
        radius: f64,
    },
    /// 沿用 SVG 椭圆弧参数：`sweep` 恒为逆时针（源坐标系）。
    ArcPath {
        start: Point2,
        end: Point2,
        radius: f64,
        large_arc: bool,
        sweep: bool,
    },
    /// 文本标注。`local_transform` 在锚点处反转 Y 轴，抵消全局翻转使文字正立。
    Label {
        anchor: Point2,
        height: f64,
        content: String,
        local_transform: DAffine2,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub layer: String,
    pub color: Rgb,
    pub primitive: DrawPrimitive,
}

/// 一帧渲染输出：图元列表与当前生效的视图变换。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub transform: ViewTransform,
    pub stroke_width: f64,
    pub items: Vec<RenderItem>,
}

impl RenderFrame {
    pub fn new(transform: ViewTransform, items: Vec<RenderItem>) -> Self {
        Self {
            stroke_width: transform.stroke_width(),
            transform,
            items,
        }
    }
}

/// 按场景顺序生成图元，跳过隐藏图层上的实体。
///
/// 未在图层列表中出现的图层视为可见，颜色回落到 `default_color`。
pub fn render_scene(scene: &Scene, layers: &[LayerView], default_color: Rgb) -> Vec<RenderItem> {
    let lookup: HashMap<&str, &LayerView> = layers
        .iter()
        .map(|layer| (layer.name.as_str(), layer))
        .collect();
    scene
        .entities()
        .iter()
        .filter_map(|entity| {
            let layer = lookup.get(entity.layer_name()).copied();
            render_entity(entity, layer, default_color)
        })
        .collect()
}

pub fn render_entity(
    entity: &Entity,
    layer: Option<&LayerView>,
    default_color: Rgb,
) -> Option<RenderItem> {
    if layer.is_some_and(|layer| !layer.visible) {
        return None;
    }
    let color = entity
        .color()
        .or_else(|| layer.map(|layer| layer.color))
        .unwrap_or(default_color);

    let primitive = match entity {
        Entity::Line(line) => DrawPrimitive::Segment {
            from: line.start,
            to: line.end,
        },
        Entity::Polyline(polyline) => DrawPrimitive::Path {
            points: polyline.points.clone(),
            closed: polyline.closed,
        },
        Entity::Circle(circle) => DrawPrimitive::Circle {
            center: circle.center,
            radius: circle.radius,
        },
        Entity::Arc(arc) => arc_path(arc),
        Entity::Text(text) => DrawPrimitive::Label {
            anchor: text.insert,
            height: text.height,
            content: text.content.clone(),
            local_transform: upright_text_transform(text.insert),
        },
    };

    Some(RenderItem {
        layer: entity.layer_name().to_string(),
        color,
        primitive,
    })
}

/// 由圆心、半径与起止角（度）计算弧路径端点与大弧标志。
pub fn arc_path(arc: &Arc) -> DrawPrimitive {
    let point_at = |degrees: f64| {
        let radians = degrees.to_radians();
        Point2::new(
            arc.center.x() + arc.radius * radians.cos(),
            arc.center.y() + arc.radius * radians.sin(),
        )
    };
    let span = (arc.end_angle - arc.start_angle).rem_euclid(360.0);
    DrawPrimitive::ArcPath {
        start: point_at(arc.start_angle),
        end: point_at(arc.end_angle),
        radius: arc.radius,
        large_arc: span > 180.0,
        sweep: true,
    }
}

/// 以锚点为中心的 Y 轴镜像。
pub fn upright_text_transform(anchor: Point2) -> DAffine2 {
    let offset = anchor.as_vec2();
    DAffine2::from_translation(offset)
        * DAffine2::from_scale(DVec2::new(1.0, -1.0))
        * DAffine2::from_translation(-offset)
}
