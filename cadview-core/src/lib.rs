pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，DXF 坐标统一按双精度处理。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，屏幕空间的平移量也使用该类型。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        pub const ZERO: Vector2 = Vector2(DVec2::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框累加器。
    ///
    /// X 与 Y 两个轴独立累加：文本实体只贡献 X，因此可能出现某一轴为空的情况。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        /// 任一轴未收到坐标即视为空。
        #[inline]
        pub fn is_empty(&self) -> bool {
            !self.has_x() || !self.has_y()
        }

        #[inline]
        pub fn has_x(&self) -> bool {
            self.min.x() <= self.max.x()
        }

        #[inline]
        pub fn has_y(&self) -> bool {
            self.min.y() <= self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            self.include_x(point.x());
            self.include_y(point.y());
        }

        pub fn include_x(&mut self, x: f64) {
            self.min.0.x = self.min.0.x.min(x);
            self.max.0.x = self.max.0.x.max(x);
        }

        pub fn include_y(&mut self, y: f64) {
            self.min.0.y = self.min.0.y.min(y);
            self.max.0.y = self.max.0.y.max(y);
        }
    }

    impl Default for Bounds2D {
        fn default() -> Self {
            Self::empty()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bounds_accumulate_axes_independently() {
            let mut bounds = Bounds2D::empty();
            assert!(bounds.is_empty());

            bounds.include_x(4.0);
            assert!(bounds.has_x());
            assert!(!bounds.has_y());
            assert!(bounds.is_empty());

            bounds.include_point(Point2::new(-2.0, 3.0));
            assert!(!bounds.is_empty());
            assert_eq!(bounds.min(), Point2::new(-2.0, 3.0));
            assert_eq!(bounds.max(), Point2::new(4.0, 3.0));
        }
    }
}

pub mod color {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 8 位 RGB 颜色。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Rgb {
        pub r: u8,
        pub g: u8,
        pub b: u8,
    }

    impl Rgb {
        pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

        #[inline]
        pub const fn new(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b }
        }

        /// 解析 `#RRGGBB` 或 `RRGGBB`，格式不符时返回 `None`。
        pub fn from_hex(raw: &str) -> Option<Self> {
            let digits = raw.trim().trim_start_matches('#');
            if digits.len() != 6 || !digits.is_ascii() {
                return None;
            }
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
            Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }

        pub fn to_hex(self) -> String {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        }
    }

    impl fmt::Display for Rgb {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.to_hex())
        }
    }

    /// ACI 调色板（索引 1–9）。7 号随背景在黑/白之间切换，不给出固定颜色，
    /// 交由图层颜色兜底。
    const ACI_PALETTE: [(i32, Rgb); 8] = [
        (1, Rgb::new(0xFF, 0x00, 0x00)),
        (2, Rgb::new(0xFF, 0xFF, 0x00)),
        (3, Rgb::new(0x00, 0xFF, 0x00)),
        (4, Rgb::new(0x00, 0xFF, 0xFF)),
        (5, Rgb::new(0x00, 0x00, 0xFF)),
        (6, Rgb::new(0xFF, 0x00, 0xFF)),
        (8, Rgb::new(0x80, 0x80, 0x80)),
        (9, Rgb::new(0xC0, 0xC0, 0xC0)),
    ];

    /// 根据 ACI 索引查找颜色。BYBLOCK(0)、BYLAYER(256) 与未知索引均返回 `None`。
    pub fn aci_color(index: i32) -> Option<Rgb> {
        ACI_PALETTE
            .iter()
            .find(|(aci, _)| *aci == index)
            .map(|(_, rgb)| *rgb)
    }

    /// 为第 `ordinal` 个图层分配的显示颜色，按调色板顺序循环。
    pub fn layer_palette_color(ordinal: usize) -> Rgb {
        ACI_PALETTE[ordinal % ACI_PALETTE.len()].1
    }

}

pub mod scene {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};

    use crate::color::Rgb;
    use crate::geometry::{Bounds2D, Point2};

    /// 未设置组码 8 时实体所在的默认图层。
    pub const DEFAULT_LAYER: &str = "0";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Polyline(Polyline),
        Circle(Circle),
        Arc(Arc),
        Text(Text),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::Text(text) => &text.layer,
            }
        }

        /// 实体自身的 ACI 颜色；`None` 表示随图层。
        #[inline]
        pub fn color(&self) -> Option<Rgb> {
            match self {
                Entity::Line(line) => line.color,
                Entity::Polyline(polyline) => polyline.color,
                Entity::Circle(circle) => circle.color,
                Entity::Arc(arc) => arc.color,
                Entity::Text(text) => text.color,
            }
        }

        pub fn kind_name(&self) -> &'static str {
            match self {
                Entity::Line(_) => "LINE",
                Entity::Polyline(_) => "LWPOLYLINE",
                Entity::Circle(_) => "CIRCLE",
                Entity::Arc(_) => "ARC",
                Entity::Text(text) => match text.kind {
                    TextKind::Single => "TEXT",
                    TextKind::Multi => "MTEXT",
                },
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
        pub color: Option<Rgb>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        pub points: Vec<Point2>,
        pub closed: bool,
        pub layer: String,
        pub color: Option<Rgb>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
        pub color: Option<Rgb>,
    }

    /// 圆弧。角度沿用 DXF 约定：单位为度，自 +X 轴逆时针。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
        pub color: Option<Rgb>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TextKind {
        /// `TEXT`
        Single,
        /// `MTEXT`
        Multi,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub height: f64,
        pub content: String,
        pub kind: TextKind,
        pub layer: String,
        pub color: Option<Rgb>,
    }

    /// 场景范围。始终有限，不会出现无穷大边界。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Extents {
        pub min: Point2,
        pub max: Point2,
    }

    impl Extents {
        /// 没有任何实体贡献坐标时使用的占位范围。
        pub const PLACEHOLDER: Extents = Extents {
            min: Point2(glam::DVec2::new(0.0, 0.0)),
            max: Point2(glam::DVec2::new(100.0, 100.0)),
        };

        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        /// 由累加器生成范围；未收到坐标的轴沿用占位范围对应的轴。
        pub fn from_bounds(bounds: &Bounds2D) -> Self {
            let placeholder = Self::PLACEHOLDER;
            let (min_x, max_x) = if bounds.has_x() {
                (bounds.min().x(), bounds.max().x())
            } else {
                (placeholder.min.x(), placeholder.max.x())
            };
            let (min_y, max_y) = if bounds.has_y() {
                (bounds.min().y(), bounds.max().y())
            } else {
                (placeholder.min.y(), placeholder.max.y())
            };
            Self::new(Point2::new(min_x, min_y), Point2::new(max_x, max_y))
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            Point2::from_vec((self.min.as_vec2() + self.max.as_vec2()) * 0.5)
        }
    }

    impl Default for Extents {
        fn default() -> Self {
            Self::PLACEHOLDER
        }
    }

    /// 解析结果：有序实体列表、排序后的图层名集合与场景范围。构造后只读。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Scene {
        entities: Vec<Entity>,
        layers: BTreeSet<String>,
        extents: Extents,
    }

    impl Scene {
        pub fn new(entities: Vec<Entity>, layers: BTreeSet<String>, extents: Extents) -> Self {
            Self {
                entities,
                layers,
                extents,
            }
        }

        /// 空场景，范围为占位值。
        pub fn empty() -> Self {
            Self::new(Vec::new(), BTreeSet::new(), Extents::PLACEHOLDER)
        }

        #[inline]
        pub fn entities(&self) -> &[Entity] {
            &self.entities
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &str> + '_ {
            self.layers.iter().map(String::as_str)
        }

        #[inline]
        pub fn has_layer(&self, name: &str) -> bool {
            self.layers.contains(name)
        }

        #[inline]
        pub fn extents(&self) -> Extents {
            self.extents
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }
    }

    impl Default for Scene {
        fn default() -> Self {
            Self::empty()
        }
    }

    /// 原样透传的 SVG 标记，内核不做任何解析。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SvgMarkup(String);

    impl SvgMarkup {
        pub fn new(markup: impl Into<String>) -> Self {
            Self(markup.into())
        }

        #[inline]
        pub fn as_str(&self) -> &str {
            &self.0
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.0.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    }

    /// 一次加载的产物。
    #[derive(Debug, Clone, PartialEq)]
    pub enum Drawing {
        Dxf(Scene),
        Svg(SvgMarkup),
    }

}
