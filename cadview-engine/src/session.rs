use std::collections::BTreeSet;

use cadview_core::color::{Rgb, layer_palette_color};
use cadview_core::scene::{DEFAULT_LAYER, Drawing, Scene, SvgMarkup};
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::render::{RenderFrame, render_scene};
use crate::viewport::{Viewport, ViewportSize};

/// 图层的显示状态，加载时由场景的图层集合派生，不回写场景。
#[derive(Debug, Clone, PartialEq)]
pub struct LayerView {
    pub name: String,
    pub color: Rgb,
    pub visible: bool,
}

/// 一个视图会话：持有当前图纸、图层显示列表与视口。
///
/// 所有状态都归会话独占，渲染时显式传入，避免全局可变状态。
#[derive(Debug)]
pub struct ViewSession {
    drawing: Option<Drawing>,
    layers: Vec<LayerView>,
    viewport: Viewport,
    container: ViewportSize,
    load_pending: bool,
    default_color: Rgb,
}

impl ViewSession {
    pub fn new(container: ViewportSize) -> Self {
        Self {
            drawing: None,
            layers: Vec::new(),
            viewport: Viewport::new(),
            container,
            load_pending: false,
            default_color: Rgb::WHITE,
        }
    }

    pub fn with_default_color(mut self, color: Rgb) -> Self {
        self.default_color = color;
        self
    }

    /// 标记开始加载。已有加载未完成时拒绝，保证加载串行。
    pub fn begin_load(&mut self) -> Result<(), EngineError> {
        if self.load_pending {
            return Err(EngineError::LoadInProgress);
        }
        self.load_pending = true;
        Ok(())
    }

    /// 用新图纸替换当前内容：重置视口、重新派生图层，DXF 场景立即适配屏幕。
    pub fn complete_load(&mut self, drawing: Drawing) -> Result<(), EngineError> {
        if !self.load_pending {
            return Err(EngineError::NoLoadPending);
        }
        self.load_pending = false;
        self.viewport.clear();

        match &drawing {
            Drawing::Dxf(scene) => {
                self.layers = derive_layers(scene);
                let fitted = self.viewport.fit_to_screen(scene.extents(), self.container);
                info!(
                    entities = scene.entities().len(),
                    layers = self.layers.len(),
                    fitted,
                    "DXF 场景已载入会话"
                );
            }
            Drawing::Svg(svg) => {
                self.layers.clear();
                info!(bytes = svg.len(), "SVG 内容已载入会话");
            }
        }
        self.drawing = Some(drawing);
        Ok(())
    }

    /// 放弃进行中的加载（例如读取失败），保留之前的场景。
    pub fn abort_load(&mut self) {
        if self.load_pending {
            debug!("加载已取消，保留当前场景");
        }
        self.load_pending = false;
    }

    /// `begin_load` 与 `complete_load` 的组合。
    pub fn load(&mut self, drawing: Drawing) -> Result<(), EngineError> {
        self.begin_load()?;
        self.complete_load(drawing)
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.load_pending
    }

    #[inline]
    pub fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.drawing {
            Some(Drawing::Dxf(scene)) => Some(scene),
            _ => None,
        }
    }

    pub fn svg(&self) -> Option<&SvgMarkup> {
        match &self.drawing {
            Some(Drawing::Svg(svg)) => Some(svg),
            _ => None,
        }
    }

    #[inline]
    pub fn layers(&self) -> &[LayerView] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&LayerView> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> Result<(), EngineError> {
        let layer = self.layer_mut(name)?;
        layer.visible = visible;
        Ok(())
    }

    /// 切换图层可见性，返回切换后的状态。
    pub fn toggle_layer(&mut self, name: &str) -> Result<bool, EngineError> {
        let layer = self.layer_mut(name)?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut LayerView, EngineError> {
        self.layers
            .iter_mut()
            .find(|layer| layer.name == name)
            .ok_or_else(|| EngineError::LayerNotFound(name.to_string()))
    }

    #[inline]
    pub fn default_color(&self) -> Rgb {
        self.default_color
    }

    #[inline]
    pub fn container_size(&self) -> ViewportSize {
        self.container
    }

    /// 更新容器尺寸。不会自动重新适配，需要时调用 [`Self::reset_view`]。
    pub fn set_container_size(&mut self, size: ViewportSize) {
        self.container = size;
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn zoom(&mut self, factor: f64) {
        self.viewport.zoom(factor);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset(self.container);
    }

    /// 生成当前帧。SVG 透传内容不产生图元，由前端原样输出。
    pub fn render(&self) -> RenderFrame {
        let items = match self.scene() {
            Some(scene) => render_scene(scene, &self.layers, self.default_color),
            None => Vec::new(),
        };
        RenderFrame::new(self.viewport.transform(), items)
    }
}

/// 场景图层集合只收录组码 8 声明过的图层；未声明图层的实体落在默认图层 `"0"`，
/// 这里把它补进显示列表，使其同样可以隐藏。
fn derive_layers(scene: &Scene) -> Vec<LayerView> {
    let mut names: BTreeSet<&str> = scene.layers().collect();
    if scene
        .entities()
        .iter()
        .any(|entity| entity.layer_name() == DEFAULT_LAYER)
    {
        names.insert(DEFAULT_LAYER);
    }
    names
        .into_iter()
        .enumerate()
        .map(|(ordinal, name)| LayerView {
            name: name.to_string(),
            color: layer_palette_color(ordinal),
            visible: true,
        })
        .collect()
}
