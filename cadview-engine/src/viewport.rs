use cadview_core::geometry::{Point2, Vector2};
use cadview_core::scene::Extents;
use glam::{DAffine2, DVec2};
use tracing::{debug, trace};

pub const DEFAULT_SCALE: f64 = 1.0;
pub const MIN_SCALE: f64 = 0.01;
pub const MAX_SCALE: f64 = 1_000.0;

/// 当前交互工具。只有 `Pan` 下的拖拽会移动视图。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pan,
    Select,
}

/// 容器（画布）尺寸，单位为屏幕像素。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    #[inline]
    fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// 数据坐标到屏幕坐标的仿射映射：`screen = pan + data · (scale, -scale)`。
///
/// DXF 为 Y 轴向上，屏幕为 Y 轴向下，因此 Y 方向取负缩放。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub pan: Vector2,
}

impl ViewTransform {
    #[inline]
    pub fn apply(&self, point: Point2) -> Point2 {
        let data = point.as_vec2();
        Point2::from_vec(self.pan.as_vec2() + DVec2::new(data.x * self.scale, -data.y * self.scale))
    }

    /// 屏幕坐标反算回数据坐标。
    #[inline]
    pub fn invert(&self, screen: Point2) -> Point2 {
        let offset = screen.as_vec2() - self.pan.as_vec2();
        Point2::new(offset.x / self.scale, -offset.y / self.scale)
    }

    #[inline]
    pub fn affine(&self) -> DAffine2 {
        DAffine2::from_scale_angle_translation(
            DVec2::new(self.scale, -self.scale),
            0.0,
            self.pan.as_vec2(),
        )
    }

    /// 线宽取缩放的倒数，使线条在任意缩放下保持约 1 像素。
    #[inline]
    pub fn stroke_width(&self) -> f64 {
        1.0 / self.scale
    }
}

/// 视口状态（缩放、屏幕平移量、当前工具）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f64,
    pub pan: Vector2,
    pub tool: Tool,
}

impl ViewportState {
    #[inline]
    fn clamp_scale(value: f64) -> f64 {
        value.clamp(MIN_SCALE, MAX_SCALE)
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            pan: Vector2::ZERO,
            tool: Tool::default(),
        }
    }
}

/// 视口引擎：维护缩放与平移，负责适配屏幕以及增量平移/缩放。
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    state: ViewportState,
    extents: Option<Extents>,
    drag_anchor: Option<Point2>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> ViewportState {
        self.state
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    #[inline]
    pub fn pan_offset(&self) -> Vector2 {
        self.state.pan
    }

    #[inline]
    pub fn tool(&self) -> Tool {
        self.state.tool
    }

    /// 切换工具会结束进行中的拖拽。
    pub fn set_tool(&mut self, tool: Tool) {
        self.state.tool = tool;
        self.drag_anchor = None;
    }

    #[inline]
    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            scale: self.state.scale,
            pan: self.state.pan,
        }
    }

    /// 新文件加载时调用：恢复 `scale=1, pan=(0,0)` 并清除记录的范围。
    pub fn clear(&mut self) {
        let tool = self.state.tool;
        self.state = ViewportState {
            tool,
            ..ViewportState::default()
        };
        self.extents = None;
        self.drag_anchor = None;
    }

    /// 以统一比例缩放使数据范围适配容器，并让数据中心对齐容器中心。
    ///
    /// 数据宽或高为 0、或容器尺寸不可用时保持当前状态不变。返回是否发生了适配。
    pub fn fit_to_screen(&mut self, extents: Extents, size: ViewportSize) -> bool {
        self.extents = Some(extents);
        let data_width = extents.width();
        let data_height = extents.height();
        if data_width == 0.0 || data_height == 0.0 || !size.is_usable() {
            debug!(data_width, data_height, "范围退化，跳过适配");
            return false;
        }

        let scale = (size.width / data_width).min(size.height / data_height);
        let data_center = extents.center();
        let view_center = size.center();
        self.state.scale = scale;
        self.state.pan = Vector2::new(
            view_center.x - data_center.x() * scale,
            view_center.y + data_center.y() * scale,
        );
        debug!(scale, pan_x = self.state.pan.x(), pan_y = self.state.pan.y(), "视口已适配屏幕");
        true
    }

    /// 乘法缩放，结果限制在 `[MIN_SCALE, MAX_SCALE]`。
    ///
    /// 缩放始终以当前变换原点为中心，不以光标为锚点。
    pub fn zoom(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            trace!(factor, "忽略无效的缩放因子");
            return;
        }
        self.state.scale = ViewportState::clamp_scale(self.state.scale * factor);
    }

    /// 开始拖拽手势。仅在 `Tool::Pan` 下生效，返回是否进入拖拽。
    pub fn begin_drag(&mut self, at: Point2) -> bool {
        if self.state.tool != Tool::Pan {
            return false;
        }
        self.drag_anchor = Some(at);
        true
    }

    /// 拖拽过程中指针移动到 `at`，按与上一位置的差值平移。
    pub fn drag_to(&mut self, at: Point2) {
        if let Some(anchor) = self.drag_anchor {
            let delta = anchor.vector_to(at);
            self.pan(delta.x(), delta.y());
            self.drag_anchor = Some(at);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// 屏幕像素空间的平移，只在 `Pan` 工具的拖拽过程中生效。
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if self.state.tool != Tool::Pan || self.drag_anchor.is_none() {
            return false;
        }
        self.state.pan = Vector2::new(self.state.pan.x() + dx, self.state.pan.y() + dy);
        true
    }

    /// 重新对最近一次的范围执行适配；尚未加载场景时恢复单位变换。
    ///
    /// 范围退化时适配不生效，缩放与平移保持原样。
    pub fn reset(&mut self, size: ViewportSize) {
        self.drag_anchor = None;
        match self.extents {
            Some(extents) => {
                self.fit_to_screen(extents, size);
            }
            None => self.clear(),
        }
    }
}
