//! Resumable flows and loops.
//!
//! A [`Flow`] does not run its tasks itself. It keeps a cursor over its
//! declared tasks, the child currently open and, for loops, the active pass.
//! The session advances it one step at a time.

use super::TaskId;
use super::update;
use crate::context::ContextId;
use crate::document::FlowConfig;
use crate::error::{PathError, TaskError};
use crate::path::PathEvaluator;
use crate::state::{self, StateTree};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Sequence,
    While,
    For,
}

/// The sub-task a flow has open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    pub task: TaskId,
    pub context: ContextId,
    /// Index of the child's declaration in the flow.
    pub position: usize,
    /// Set once the child has been yielded for its breakpoint.
    pub interrupted: bool,
}

/// Progress of a loop across passes.
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    /// Items of a `for_loop`, read once when the loop starts.
    pub items: Vec<Value>,
    pub passes: usize,
    /// One entry per finished pass, in order.
    pub snapshots: Vec<Value>,
    /// No further pass will start.
    pub finished: bool,
}

/// Where a flow stood when a history entry was taken. Loop items never change
/// and snapshots only grow, so a count is enough to rewind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPosition {
    pub cursor: usize,
    pub broke: bool,
    pub passes: usize,
    pub snapshots: usize,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct Flow {
    pub(crate) definition: String,
    pub(crate) kind: FlowKind,
    pub(crate) config: FlowConfig,
    pub(crate) cursor: usize,
    pub(crate) current: Option<Child>,
    pub(crate) iteration: Option<ContextId>,
    pub(crate) broke: bool,
    pub(crate) looping: LoopState,
}

impl Flow {
    /// Creates a flow over the declared flow `definition`.
    ///
    /// `state` is the enclosing state the flow starts from; a `for_loop` reads
    /// its items from it here, once.
    pub fn new(
        definition: &str,
        kind: FlowKind,
        config: FlowConfig,
        state: &StateTree,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Self, TaskError> {
        let mut looping = LoopState::default();
        if kind == FlowKind::For {
            if let Some(path) = &config.iterable_path {
                looping.items = match evaluator.get(state, path)?.into_iter().next() {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(TaskError::NotIterable {
                            flow: definition.to_string(),
                            path: path.clone(),
                        });
                    }
                };
            }
        }
        Ok(Flow {
            definition: definition.to_string(),
            kind,
            config,
            cursor: 0,
            current: None,
            iteration: None,
            broke: false,
            looping,
        })
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn is_loop(&self) -> bool {
        self.kind != FlowKind::Sequence
    }

    pub fn current(&self) -> Option<Child> {
        self.current
    }

    pub fn passes(&self) -> usize {
        self.looping.passes
    }

    pub fn snapshots(&self) -> &[Value] {
        &self.looping.snapshots
    }

    /// The position at which the next child opened is the one at `cursor`.
    pub(crate) fn position_at(&self, cursor: usize) -> FlowPosition {
        FlowPosition {
            cursor,
            broke: self.broke,
            passes: self.looping.passes,
            snapshots: self.looping.snapshots.len(),
            finished: self.looping.finished,
        }
    }

    /// Rewinds to `position`. The open child and pass are dropped; the caller
    /// closes their scopes.
    pub(crate) fn rewind(&mut self, position: FlowPosition) {
        self.cursor = position.cursor;
        self.current = None;
        self.iteration = None;
        self.broke = position.broke;
        self.looping.passes = position.passes;
        self.looping.snapshots.truncate(position.snapshots);
        self.looping.finished = position.finished;
    }

    /// State a new pass starts from. A `for_loop` adds the pass's item: objects
    /// are merged in, anything else is stored under `item`.
    pub(crate) fn pass_seed(&self, state: &StateTree) -> StateTree {
        if self.kind != FlowKind::For {
            return state.clone();
        }
        match self.looping.items.get(self.looping.passes) {
            Some(item @ Value::Object(_)) => state::merge(state, item),
            Some(item) => {
                let mut wrapped = Map::new();
                wrapped.insert("item".to_string(), item.clone());
                state::merge(state, &Value::Object(wrapped))
            }
            None => state.clone(),
        }
    }

    /// Whether a `for_loop` has items left for another pass.
    pub(crate) fn has_items_left(&self) -> bool {
        self.looping.passes < self.looping.items.len()
    }

    /// What one finished pass contributes to the loop's sequence.
    pub(crate) fn pass_snapshot(
        &self,
        iteration_state: &StateTree,
        iteration_result: &StateTree,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Value, PathError> {
        if self.config.result_paths.is_empty() {
            Ok(iteration_result.clone())
        } else {
            update::apply(&self.config.result_paths, iteration_state, evaluator, false)
        }
    }

    /// The result a finished flow publishes to its enclosing scope.
    pub(crate) fn published_result(&self, local: &StateTree, evaluator: &dyn PathEvaluator) -> Result<StateTree, PathError> {
        if self.is_loop() {
            return match &self.config.destination_path {
                Some(path) => evaluator.set(
                    &state::empty(),
                    path,
                    Value::Array(self.looping.snapshots.clone()),
                ),
                None => Ok(state::empty()),
            };
        }
        let mut result = self.config.result.clone().unwrap_or_else(state::empty);
        let computed = update::apply(&self.config.result_paths, local, evaluator, false)?;
        state::merge_into(&mut result, computed);
        match &self.config.destination_path {
            Some(path) => evaluator.set(&state::empty(), path, result),
            None => Ok(result),
        }
    }
}
