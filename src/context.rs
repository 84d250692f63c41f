//! Execution scopes and their state and result trees.

use crate::state::{self, StateTree};
use crate::task::TaskId;
use std::fmt;

/// Index of an [`ExecutionContext`] inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) usize);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// One activation scope: a sub-task, a flow, or a single loop pass.
///
/// A context owns its `state` and `result`. Children start from a copy of
/// their parent's state, and their result is merged back into the parent
/// when their task completes.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    state: StateTree,
    result: StateTree,
    parent: Option<ContextId>,
    task: Option<TaskId>,
    flow: Option<TaskId>,
    released: bool,
}

impl ExecutionContext {
    pub fn new(state: StateTree, parent: Option<ContextId>) -> Self {
        Self {
            state,
            result: state::empty(),
            parent,
            task: None,
            flow: None,
            released: false,
        }
    }

    pub fn state(&self) -> &StateTree {
        &self.state
    }

    pub fn update_state(&mut self, patch: StateTree) {
        state::merge_into(&mut self.state, patch);
    }

    pub fn result(&self) -> &StateTree {
        &self.result
    }

    pub fn update_result(&mut self, patch: StateTree) {
        state::merge_into(&mut self.result, patch);
    }

    /// Replaces both trees, used when a flow is re-seeded from history.
    pub(crate) fn reset(&mut self, state: StateTree, result: StateTree) {
        self.state = state;
        self.result = result;
        self.released = false;
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    /// The task running in this scope.
    pub fn task(&self) -> Option<TaskId> {
        self.task
    }

    /// The flow this scope owns, if the registered task is a flow.
    pub fn flow(&self) -> Option<TaskId> {
        self.flow
    }

    /// Binds a task to this scope. A flow also becomes the scope's owned flow,
    /// which is what back navigation compares against.
    pub fn register_task(&mut self, task: TaskId, is_flow: bool) {
        self.task = Some(task);
        if is_flow {
            self.flow = Some(task);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Closes the scope. Returns `false` if it was already closed.
    pub(crate) fn release(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }

    /// Frees both trees of a closed scope.
    pub(crate) fn discard(&mut self) {
        self.state = state::empty();
        self.result = state::empty();
    }
}
