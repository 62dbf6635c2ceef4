use std::collections::HashMap;

use cadview_core::geometry::Point2;

use crate::session::ViewSession;
use crate::viewport::Tool;

/// 滚轮缩放的默认步进。
pub const DEFAULT_ZOOM_STEP: f64 = 1.2;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    /// 按空白切分命令行，首个单词为命令名。
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let name = words.next()?.to_string();
        Some(Self {
            name,
            args: words.map(str::to_string).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a mut ViewSession,
    pub zoom_step: f64,
}

impl<'a> CommandContext<'a> {
    pub fn new(session: &'a mut ViewSession) -> Self {
        Self {
            session,
            zoom_step: DEFAULT_ZOOM_STEP,
        }
    }
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(ZoomCommand);
        bus.register(ZoomStepCommand::In);
        bus.register(ZoomStepCommand::Out);
        bus.register(ResetViewCommand);
        bus.register(ToggleLayerCommand);
        bus.register(SetToolCommand);
        bus.register(DragCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    /// 按名称排序的可用命令。
    pub fn available_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

fn number_arg(request: &CommandRequest, index: usize) -> Result<f64, CommandResponse> {
    let raw = request
        .args
        .get(index)
        .ok_or_else(|| CommandResponse::err(format!("{} 缺少第 {} 个参数", request.name, index + 1)))?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandResponse::err(format!("{} 的参数 {raw:?} 不是有效数字", request.name)))
}

struct ZoomCommand;

impl CommandHandler for ZoomCommand {
    fn name(&self) -> &'static str {
        "zoom"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let factor = match number_arg(request, 0) {
            Ok(factor) if factor > 0.0 => factor,
            Ok(_) => return CommandResponse::err("缩放因子必须为正数"),
            Err(response) => return response,
        };
        context.session.zoom(factor);
        CommandResponse::ok(format!("缩放={:.3}", context.session.viewport().scale()))
    }
}

enum ZoomStepCommand {
    In,
    Out,
}

impl CommandHandler for ZoomStepCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::In => "zoom_in",
            Self::Out => "zoom_out",
        }
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let factor = match self {
            Self::In => context.zoom_step,
            Self::Out => 1.0 / context.zoom_step,
        };
        context.session.zoom(factor);
        CommandResponse::ok(format!("缩放={:.3}", context.session.viewport().scale()))
    }
}

struct ResetViewCommand;

impl CommandHandler for ResetViewCommand {
    fn name(&self) -> &'static str {
        "reset_view"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.session.reset_view();
        CommandResponse::ok("视口已重置")
    }
}

struct ToggleLayerCommand;

impl CommandHandler for ToggleLayerCommand {
    fn name(&self) -> &'static str {
        "toggle_layer"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        // 图层名可以包含空格，其余参数按单个空格拼回。
        let name = request.args.join(" ");
        if name.is_empty() {
            return CommandResponse::err("toggle_layer 需要图层名");
        }
        match context.session.toggle_layer(&name) {
            Ok(visible) => CommandResponse::ok(format!(
                "图层 {name} 已{}",
                if visible { "显示" } else { "隐藏" }
            )),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct SetToolCommand;

impl CommandHandler for SetToolCommand {
    fn name(&self) -> &'static str {
        "set_tool"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let tool = match request.args.first().map(String::as_str) {
            Some("pan") => Tool::Pan,
            Some("select") => Tool::Select,
            other => return CommandResponse::err(format!("未知工具: {other:?}")),
        };
        context.session.viewport_mut().set_tool(tool);
        CommandResponse::ok(format!("当前工具: {tool:?}"))
    }
}

/// 以一次完整拖拽手势（按下、移动、松开）平移视图。
struct DragCommand;

impl CommandHandler for DragCommand {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let (dx, dy) = match (number_arg(request, 0), number_arg(request, 1)) {
            (Ok(dx), Ok(dy)) => (dx, dy),
            (Err(response), _) | (_, Err(response)) => return response,
        };
        let viewport = context.session.viewport_mut();
        if !viewport.begin_drag(Point2::new(0.0, 0.0)) {
            return CommandResponse::err("当前工具不支持平移");
        }
        viewport.drag_to(Point2::new(dx, dy));
        viewport.end_drag();
        let pan = viewport.pan_offset();
        CommandResponse::ok(format!("平移=({:.2}, {:.2})", pan.x(), pan.y()))
    }
}
