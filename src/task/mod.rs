//! Typed task instances built from declared task definitions.

pub mod flow;
pub mod jsonrpc;
pub mod screen;
pub mod update;

use crate::context::ContextId;
use flow::Flow;
use jsonrpc::JsonRpc;
use screen::Screen;
use std::fmt;
use update::Update;

/// Index of a [`Task`] inside a session. Two instances of the same declared
/// task always have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Screen,
    Jsonrpc,
    Flow,
    WhileLoop,
    ForLoop,
    Update,
    Redirect,
    Event,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Screen => "screen",
            TaskKind::Jsonrpc => "jsonrpc",
            TaskKind::Flow => "flow",
            TaskKind::WhileLoop => "while_loop",
            TaskKind::ForLoop => "for_loop",
            TaskKind::Update => "update",
            TaskKind::Redirect => "redirect",
            TaskKind::Event => "event",
        }
    }

    pub fn is_flow(self) -> bool {
        matches!(self, TaskKind::Flow | TaskKind::WhileLoop | TaskKind::ForLoop)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum TaskBody {
    Screen(Screen),
    Jsonrpc(JsonRpc),
    Flow(Flow),
    Update(Update),
    Redirect { url: String },
    Event { action: String },
}

/// A live task: its declaration turned into state the driver can act on.
#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) kind: TaskKind,
    /// The scope the task runs in.
    pub(crate) context: ContextId,
    /// The flow instance that declared the task. `None` for the root flow.
    pub(crate) owner_flow: Option<TaskId>,
    pub(crate) complete: bool,
    pub(crate) body: TaskBody,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn owner_flow(&self) -> Option<TaskId> {
        self.owner_flow
    }

    pub fn body(&self) -> &TaskBody {
        &self.body
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True while an input-bearing task waits for the driver.
    pub fn requires_input(&self) -> bool {
        if self.complete {
            return false;
        }
        match &self.body {
            TaskBody::Screen(_) => true,
            TaskBody::Jsonrpc(call) => call.destination_path.is_some(),
            _ => false,
        }
    }

    pub(crate) fn as_flow(&self) -> Option<&Flow> {
        match &self.body {
            TaskBody::Flow(flow) => Some(flow),
            _ => None,
        }
    }

    pub(crate) fn as_flow_mut(&mut self) -> Option<&mut Flow> {
        match &mut self.body {
            TaskBody::Flow(flow) => Some(flow),
            _ => None,
        }
    }
}
