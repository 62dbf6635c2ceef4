use std::collections::{BTreeMap, BTreeSet};

use cadview_core::color::{Rgb, aci_color};
use cadview_core::geometry::{Bounds2D, Point2};
use cadview_core::scene::{
    Arc, Circle, DEFAULT_LAYER, Entity, Extents, Line, Polyline, Scene, Text, TextKind,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::tags::{Tag, TagReader};

const ENTITIES_SECTION: &str = "ENTITIES";

/// 解析统计，便于前端或日志说明哪些内容被忽略。
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    /// 读取到的组码/值对数量。
    pub tag_count: usize,
    /// 输出的实体数量。
    pub entity_count: usize,
    /// ENTITIES 段中未支持的实体类型及出现次数。
    pub skipped: BTreeMap<String, usize>,
}

impl ParseReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// 解析 ASCII DXF 文本。输入异常时退化为空场景或部分场景，不会返回错误。
pub fn parse_dxf(source: &str) -> Scene {
    parse_dxf_with_report(source).0
}

/// 同 [`parse_dxf`]，额外返回解析统计。
pub fn parse_dxf_with_report(source: &str) -> (Scene, ParseReport) {
    DxfParser::new(source).parse()
}

enum ParseState {
    Idle,
    /// 当前实体类型不受支持，直到下一个组码 0 之前的组都忽略。
    Skipping,
    Building(EntityBuilder),
}

struct DxfParser<'a> {
    reader: TagReader<'a>,
    section: String,
    state: ParseState,
    entities: Vec<Entity>,
    layers: BTreeSet<String>,
    bounds: Bounds2D,
    report: ParseReport,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: TagReader::new(source),
            section: String::new(),
            state: ParseState::Idle,
            entities: Vec::new(),
            layers: BTreeSet::new(),
            bounds: Bounds2D::empty(),
            report: ParseReport::default(),
        }
    }

    fn parse(mut self) -> (Scene, ParseReport) {
        while let Some(tag) = self.reader.next_tag() {
            self.report.tag_count += 1;
            if tag.code == 0 {
                self.handle_marker(tag.value);
            } else {
                self.handle_field(tag);
            }
        }
        self.commit();

        let extents = if self.bounds.has_x() || self.bounds.has_y() {
            Extents::from_bounds(&self.bounds)
        } else {
            Extents::PLACEHOLDER
        };
        self.report.entity_count = self.entities.len();
        debug!(
            tags = self.report.tag_count,
            entities = self.report.entity_count,
            layers = self.layers.len(),
            skipped = self.report.skipped_total(),
            "DXF 解析完成"
        );
        (
            Scene::new(self.entities, self.layers, extents),
            self.report,
        )
    }

    /// 组码 0：段边界或新实体的开始。任何组码 0 都会先提交正在构建的实体。
    fn handle_marker(&mut self, value: &str) {
        self.commit();
        match value {
            "SECTION" => {
                let name = match self.reader.next_tag() {
                    Some(name_tag) => {
                        self.report.tag_count += 1;
                        name_tag.value.to_string()
                    }
                    None => String::new(),
                };
                trace!(section = %name, line = self.reader.line_number(), "进入段");
                self.section = name;
            }
            "ENDSEC" => self.section.clear(),
            kind if self.section == ENTITIES_SECTION => {
                self.state = match EntityBuilder::start(kind) {
                    Some(builder) => ParseState::Building(builder),
                    None => {
                        *self.report.skipped.entry(kind.to_string()).or_insert(0) += 1;
                        ParseState::Skipping
                    }
                };
            }
            _ => {}
        }
    }

    fn handle_field(&mut self, tag: Tag<'_>) {
        let ParseState::Building(builder) = &mut self.state else {
            return;
        };
        match tag.code {
            8 => {
                self.layers.insert(tag.value.to_string());
                builder.common_mut().layer = Some(tag.value.to_string());
            }
            62 => builder.common_mut().color = aci_color(parse_int(tag.value)),
            _ => builder.apply(tag, &mut self.bounds),
        }
    }

    fn commit(&mut self) {
        if let ParseState::Building(builder) = std::mem::replace(&mut self.state, ParseState::Idle)
        {
            self.entities.push(builder.finish());
        }
    }
}

#[derive(Default)]
struct Common {
    layer: Option<String>,
    color: Option<Rgb>,
}

impl Common {
    fn into_parts(self) -> (String, Option<Rgb>) {
        (
            self.layer.unwrap_or_else(|| DEFAULT_LAYER.to_string()),
            self.color,
        )
    }
}

/// 正在构建的实体。仅在组码 0 或流结束时提交。
enum EntityBuilder {
    Line(LineBuilder),
    Polyline(PolylineBuilder),
    Circle(CircleBuilder),
    Arc(ArcBuilder),
    Text(TextBuilder),
}

impl EntityBuilder {
    fn start(kind: &str) -> Option<Self> {
        let builder = match kind {
            "LINE" => Self::Line(LineBuilder::default()),
            "LWPOLYLINE" => Self::Polyline(PolylineBuilder::default()),
            "CIRCLE" => Self::Circle(CircleBuilder::default()),
            "ARC" => Self::Arc(ArcBuilder::default()),
            "TEXT" => Self::Text(TextBuilder::new(TextKind::Single)),
            "MTEXT" => Self::Text(TextBuilder::new(TextKind::Multi)),
            _ => return None,
        };
        Some(builder)
    }

    fn common_mut(&mut self) -> &mut Common {
        match self {
            Self::Line(b) => &mut b.common,
            Self::Polyline(b) => &mut b.common,
            Self::Circle(b) => &mut b.common,
            Self::Arc(b) => &mut b.common,
            Self::Text(b) => &mut b.common,
        }
    }

    fn apply(&mut self, tag: Tag<'_>, bounds: &mut Bounds2D) {
        match self {
            Self::Line(b) => b.apply(tag, bounds),
            Self::Polyline(b) => b.apply(tag, bounds),
            Self::Circle(b) => b.apply(tag, bounds),
            Self::Arc(b) => b.apply(tag),
            Self::Text(b) => b.apply(tag, bounds),
        }
    }

    fn finish(self) -> Entity {
        match self {
            Self::Line(b) => b.finish(),
            Self::Polyline(b) => b.finish(),
            Self::Circle(b) => b.finish(),
            Self::Arc(b) => b.finish(),
            Self::Text(b) => b.finish(),
        }
    }
}

#[derive(Default)]
struct LineBuilder {
    common: Common,
    start: (f64, f64),
    end: (f64, f64),
}

impl LineBuilder {
    fn apply(&mut self, tag: Tag<'_>, bounds: &mut Bounds2D) {
        match tag.code {
            10 => self.start.0 = parse_number(tag.value),
            20 => self.start.1 = parse_number(tag.value),
            11 => self.end.0 = parse_number(tag.value),
            21 => {
                self.end.1 = parse_number(tag.value);
                // 终点 Y 到达时两个端点都已就绪，再更新范围。
                bounds.include_point(Point2::new(self.start.0, self.start.1));
                bounds.include_point(Point2::new(self.end.0, self.end.1));
            }
            _ => {}
        }
    }

    fn finish(self) -> Entity {
        let (layer, color) = self.common.into_parts();
        Entity::Line(Line {
            start: Point2::new(self.start.0, self.start.1),
            end: Point2::new(self.end.0, self.end.1),
            layer,
            color,
        })
    }
}

/// LWPOLYLINE 每个顶点重复组码 10/20，X 先到，Y 到达时配对成点。
#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum VertexState {
    #[default]
    AwaitingX,
    HaveX(f64),
}

#[derive(Default)]
struct PolylineBuilder {
    common: Common,
    points: Vec<Point2>,
    closed: bool,
    vertex: VertexState,
}

impl PolylineBuilder {
    fn apply(&mut self, tag: Tag<'_>, bounds: &mut Bounds2D) {
        match tag.code {
            10 => self.vertex = VertexState::HaveX(parse_number(tag.value)),
            20 => match self.vertex {
                VertexState::HaveX(x) => {
                    let point = Point2::new(x, parse_number(tag.value));
                    bounds.include_point(point);
                    self.points.push(point);
                    self.vertex = VertexState::AwaitingX;
                }
                VertexState::AwaitingX => {
                    trace!(value = tag.value, "LWPOLYLINE 顶点 Y 缺少对应的 X，忽略");
                }
            },
            70 => self.closed = parse_int(tag.value) & 1 != 0,
            _ => {}
        }
    }

    fn finish(self) -> Entity {
        if let VertexState::HaveX(x) = self.vertex {
            trace!(x, "LWPOLYLINE 末尾存在未配对的 X，丢弃");
        }
        let (layer, color) = self.common.into_parts();
        Entity::Polyline(Polyline {
            points: self.points,
            closed: self.closed,
            layer,
            color,
        })
    }
}

#[derive(Default)]
struct CircleBuilder {
    common: Common,
    center: (f64, f64),
    radius: f64,
}

impl CircleBuilder {
    fn apply(&mut self, tag: Tag<'_>, bounds: &mut Bounds2D) {
        match tag.code {
            10 => self.center.0 = parse_number(tag.value),
            20 => self.center.1 = parse_number(tag.value),
            40 => {
                self.radius = parse_number(tag.value);
                let (cx, cy) = self.center;
                let r = self.radius;
                bounds.include_point(Point2::new(cx - r, cy - r));
                bounds.include_point(Point2::new(cx + r, cy + r));
            }
            _ => {}
        }
    }

    fn finish(self) -> Entity {
        let (layer, color) = self.common.into_parts();
        Entity::Circle(Circle {
            center: Point2::new(self.center.0, self.center.1),
            radius: self.radius,
            layer,
            color,
        })
    }
}

/// 圆弧不参与场景范围计算。
#[derive(Default)]
struct ArcBuilder {
    common: Common,
    center: (f64, f64),
    radius: f64,
    start_angle: f64,
    end_angle: f64,
}

impl ArcBuilder {
    fn apply(&mut self, tag: Tag<'_>) {
        match tag.code {
            10 => self.center.0 = parse_number(tag.value),
            20 => self.center.1 = parse_number(tag.value),
            40 => self.radius = parse_number(tag.value),
            50 => self.start_angle = parse_number(tag.value),
            51 => self.end_angle = parse_number(tag.value),
            _ => {}
        }
    }

    fn finish(self) -> Entity {
        let (layer, color) = self.common.into_parts();
        Entity::Arc(Arc {
            center: Point2::new(self.center.0, self.center.1),
            radius: self.radius,
            start_angle: self.start_angle,
            end_angle: self.end_angle,
            layer,
            color,
        })
    }
}

/// TEXT 与 MTEXT 共用。插入点只有 X 计入场景范围。
struct TextBuilder {
    common: Common,
    kind: TextKind,
    insert: (f64, f64),
    height: f64,
    content: String,
    /// MTEXT 组码 3 的前置文本块。
    chunks: String,
}

impl TextBuilder {
    fn new(kind: TextKind) -> Self {
        Self {
            common: Common::default(),
            kind,
            insert: (0.0, 0.0),
            height: 0.0,
            content: String::new(),
            chunks: String::new(),
        }
    }

    fn apply(&mut self, tag: Tag<'_>, bounds: &mut Bounds2D) {
        match tag.code {
            10 => {
                self.insert.0 = parse_number(tag.value);
                bounds.include_x(self.insert.0);
            }
            20 => self.insert.1 = parse_number(tag.value),
            40 => self.height = parse_number(tag.value),
            1 => self.content = tag.raw.to_string(),
            3 if self.kind == TextKind::Multi => self.chunks.push_str(tag.raw),
            _ => {}
        }
    }

    fn finish(self) -> Entity {
        let content = match self.kind {
            TextKind::Single => self.content,
            TextKind::Multi => {
                let mut raw = self.chunks;
                raw.push_str(&self.content);
                decode_mtext_content(&raw)
            }
        };
        let (layer, color) = self.common.into_parts();
        Entity::Text(Text {
            insert: Point2::new(self.insert.0, self.insert.1),
            height: self.height,
            content,
            kind: self.kind,
            layer,
            color,
        })
    }
}

/// 数值解析失败或非有限值一律按 0 处理。
fn parse_number(raw: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            trace!(value = raw, "数值解析失败，按 0 处理");
            0.0
        }
    }
}

fn parse_int(raw: &str) -> i32 {
    raw.parse::<i32>().unwrap_or_else(|_| {
        trace!(value = raw, "整数解析失败，按 0 处理");
        0
    })
}

fn decode_mtext_content(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('P') | Some('p') => result.push('\n'),
            Some('~') => result.push('\u{a0}'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}
