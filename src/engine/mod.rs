//! The session: a resumable interpreter over one loaded document.
//!
//! A [`Session`] owns every scope and task it creates in flat arenas and
//! tracks the active scopes on a call stack of [`ContextId`]s. The driver pulls
//! pending tasks with [`Session::get_task`], acts on them, and pulls again.

mod navigation;
mod pending;
mod runner;

pub use pending::PendingTask;

use crate::context::{ContextId, ExecutionContext};
use crate::document::{Document, Repos};
use crate::error::{EngineError, TaskError};
use crate::event::{Event, EventQueue, EventSink};
use crate::history::HistoryEntry;
use crate::path::{JsonPath, PathEvaluator};
use crate::stack::VirtualStack;
use crate::state::StateTree;
use crate::task::flow::{Flow, FlowKind};
use crate::task::{Task, TaskBody, TaskId, TaskKind};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

fn default_max_loop_passes() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}

/// Session settings. Loadable from JSON; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Task names that always interrupt before they run.
    #[serde(default)]
    pub breakpoints: Vec<String>,
    /// Upper bound on passes of any single loop.
    #[serde(default = "default_max_loop_passes")]
    pub max_loop_passes: usize,
    /// Capture history entries when screens are left.
    #[serde(default = "default_true")]
    pub record_history: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breakpoints: Vec::new(),
            max_loop_passes: default_max_loop_passes(),
            record_history: true,
        }
    }
}

pub struct SessionBuilder {
    document: Document,
    config: EngineConfig,
    sink: Option<Arc<dyn EventSink>>,
    evaluator: Arc<dyn PathEvaluator>,
}

impl SessionBuilder {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            config: EngineConfig::default(),
            sink: None,
            evaluator: Arc::new(JsonPath),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_breakpoint(mut self, task_name: &str) -> Self {
        self.config.breakpoints.push(task_name.to_string());
        self
    }

    pub fn with_max_loop_passes(mut self, limit: usize) -> Self {
        self.config.max_loop_passes = limit;
        self
    }

    /// Routes events to `sink` instead of the session's own queue.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_path_evaluator(mut self, evaluator: Arc<dyn PathEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Checks the document and opens the root scope on its starting flow.
    pub fn build(self) -> Result<Session, EngineError> {
        self.document.validate()?;
        let (repos, starting_flow, context) = self.document.into_parts();

        let (sink, queue) = match self.sink {
            Some(sink) => (sink, None),
            None => {
                let queue = Arc::new(EventQueue::new());
                (Arc::clone(&queue) as Arc<dyn EventSink>, Some(queue))
            }
        };

        let mut session = Session {
            repos: Arc::new(repos),
            evaluator: self.evaluator,
            sink,
            queue,
            breakpoints: self.config.breakpoints.iter().cloned().collect(),
            config: self.config,
            contexts: Vec::new(),
            tasks: Vec::new(),
            call_stack: VirtualStack::new(),
            history: VirtualStack::new(),
            root: TaskId(0),
            redirected: None,
        };

        let root_context = session.alloc_context(context, None);
        let config = session
            .repos
            .flows
            .get(&starting_flow)
            .map(|flow| flow.config.clone())
            .ok_or_else(|| TaskError::UnknownFlow(starting_flow.clone()))?;
        let flow = Flow::new(
            &starting_flow,
            FlowKind::Sequence,
            config,
            session.contexts[root_context.0].state(),
            &*session.evaluator,
        )?;
        let root = session.alloc_task(
            &starting_flow,
            TaskKind::Flow,
            root_context,
            None,
            TaskBody::Flow(flow),
        );
        session.root = root;
        session.call_stack.push(root_context);

        info!(starting_flow = %starting_flow, "session started");
        Ok(session)
    }
}

/// A running workflow.
pub struct Session {
    repos: Arc<Repos>,
    evaluator: Arc<dyn PathEvaluator>,
    sink: Arc<dyn EventSink>,
    queue: Option<Arc<EventQueue>>,
    config: EngineConfig,
    breakpoints: AHashSet<String>,
    contexts: Vec<ExecutionContext>,
    tasks: Vec<Task>,
    call_stack: VirtualStack<ContextId>,
    history: VirtualStack<HistoryEntry>,
    root: TaskId,
    /// Set by the first redirect. The session runs nothing after it.
    redirected: Option<String>,
}

impl Session {
    pub fn builder(document: Document) -> SessionBuilder {
        SessionBuilder::new(document)
    }

    /// Starts a session with the default configuration.
    pub fn new(document: Document) -> Result<Self, EngineError> {
        SessionBuilder::new(document).build()
    }

    /// Advances the workflow to the next task that needs the driver.
    ///
    /// Returns `None` once the root flow is exhausted.
    pub fn get_task(&mut self) -> Result<Option<PendingTask<'_>>, EngineError> {
        let next = self.next_pending()?;
        Ok(next.map(|id| PendingTask::new(self, id)))
    }

    /// Re-acquires a task returned earlier by [`Session::get_task`].
    pub fn pending(&mut self, id: TaskId) -> Result<PendingTask<'_>, EngineError> {
        self.task(id)?;
        Ok(PendingTask::new(self, id))
    }

    pub fn task(&self, id: TaskId) -> Result<&Task, EngineError> {
        self.tasks.get(id.0).ok_or(EngineError::UnknownTask(id))
    }

    pub fn context(&self, id: ContextId) -> Option<&ExecutionContext> {
        self.contexts.get(id.0)
    }

    /// Makes every task with this name interrupt once before it runs.
    pub fn set_task_breakpoint(&mut self, task_name: &str) {
        if self.breakpoints.insert(task_name.to_string()) {
            self.config.breakpoints.push(task_name.to_string());
            debug!(task = task_name, "breakpoint set");
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn root(&self) -> TaskId {
        self.root
    }

    /// The root scope's state.
    pub fn state(&self) -> &StateTree {
        let root_context = self.tasks[self.root.0].context;
        self.contexts[root_context.0].state()
    }

    /// The root flow's published result. Empty until the session finishes.
    pub fn result(&self) -> &StateTree {
        let root_context = self.tasks[self.root.0].context;
        self.contexts[root_context.0].result()
    }

    pub fn is_finished(&self) -> bool {
        self.call_stack.is_empty()
    }

    /// The URL of the redirect that stopped this session, if one ran.
    pub fn redirected_to(&self) -> Option<&str> {
        self.redirected.as_deref()
    }

    /// Number of active flow scopes.
    pub fn depth(&self) -> usize {
        self.call_stack.depth()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    /// Drains the session's own event queue. Empty when a custom sink is installed.
    pub fn take_events(&self) -> Vec<Event> {
        self.queue.as_ref().map(|q| q.drain()).unwrap_or_default()
    }

    pub(crate) fn alloc_context(&mut self, state: StateTree, parent: Option<ContextId>) -> ContextId {
        self.contexts.push(ExecutionContext::new(state, parent));
        ContextId(self.contexts.len() - 1)
    }

    pub(crate) fn alloc_task(
        &mut self,
        name: &str,
        kind: TaskKind,
        context: ContextId,
        owner_flow: Option<TaskId>,
        body: TaskBody,
    ) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(Task {
            id,
            name: name.to_string(),
            kind,
            context,
            owner_flow,
            complete: false,
            body,
        });
        self.contexts[context.0].register_task(id, kind.is_flow());
        id
    }

    /// Closes a scope. Every scope but the root one also drops its trees; the
    /// root keeps them so `state` and `result` stay readable once finished.
    pub(crate) fn release_context(&mut self, id: ContextId) {
        let root_context = self.tasks[self.root.0].context;
        let context = &mut self.contexts[id.0];
        if context.release() {
            if id != root_context {
                context.discard();
            }
            debug!(scope = %id, "scope closed");
        }
    }

    pub(crate) fn flow(&self, id: TaskId) -> Result<&Flow, EngineError> {
        let task = self.task(id)?;
        task.as_flow().ok_or_else(|| wrong_kind(task, "flow"))
    }

    pub(crate) fn flow_mut(&mut self, id: TaskId) -> Result<&mut Flow, EngineError> {
        let task = self.tasks.get_mut(id.0).ok_or(EngineError::UnknownTask(id))?;
        let (name, kind) = (task.name.clone(), task.kind);
        task.as_flow_mut().ok_or_else(|| {
            TaskError::WrongTaskKind {
                task: name,
                expected: "flow",
                found: kind.as_str(),
            }
            .into()
        })
    }
}

pub(crate) fn wrong_kind(task: &Task, expected: &'static str) -> EngineError {
    TaskError::WrongTaskKind {
        task: task.name.clone(),
        expected,
        found: task.kind.as_str(),
    }
    .into()
}
