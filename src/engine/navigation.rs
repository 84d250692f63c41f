//! History capture and back navigation.
//!
//! A back request is resolved against the flow *instance* that recorded the
//! newest history entry, never against a flow name. Resolution first walks the
//! call stack read-only; scopes are only closed once a matching owner is found.

use super::Session;
use crate::context::ContextId;
use crate::error::EngineError;
use crate::event::Event;
use crate::history::HistoryEntry;
use crate::task::TaskId;
use tracing::{debug, warn};

impl Session {
    /// Records the owning flow of screen `id` as a back-navigation point.
    pub(crate) fn record_history(&mut self, id: TaskId) -> Result<(), EngineError> {
        let task = self.task(id)?;
        let Some(owner) = task.owner_flow else {
            return Ok(());
        };
        let flow = self.flow(owner)?;
        let Some(child) = flow.current.filter(|child| child.task == id) else {
            return Ok(());
        };
        let owner_context = &self.contexts[self.task(owner)?.context.0];

        let entry = HistoryEntry {
            flow: owner,
            position: flow.position_at(child.position),
            state: owner_context.state().clone(),
            result: owner_context.result().clone(),
            iteration: flow.iteration.map(|pass| {
                let pass = &self.contexts[pass.0];
                (pass.state().clone(), pass.result().clone())
            }),
            screen: task.name.clone(),
        };
        let event = Event::SaveHistory {
            flow: flow.definition.clone(),
            task: task.name.clone(),
        };

        debug!(flow = %owner, screen = %entry.screen, "history entry recorded");
        self.history.push(entry);
        self.sink.emit(event);
        Ok(())
    }

    /// Handles a back request raised by task `id`.
    ///
    /// Returns `true` when a flow on the call stack was re-seeded from history.
    pub(crate) fn navigate_back(&mut self, id: TaskId) -> Result<bool, EngineError> {
        let task_name = self.task(id)?.name.clone();
        let target = match self.history.get_head() {
            Ok(entry) => self.find_owner(id, entry.flow)?,
            Err(_) => None,
        };
        let Some(target) = target else {
            warn!(task = %task_name, "back request not handled");
            self.sink.emit(Event::Back {
                task: task_name,
                handled: false,
            });
            return Ok(false);
        };

        let entry = self.history.get_head()?.clone();
        while *self.call_stack.get_head()? != target {
            let scope = *self.call_stack.get_head()?;
            self.call_stack.pop()?;
            if let Some(flow) = self.contexts[scope.0].flow() {
                self.close_open_scopes(flow)?;
            }
            self.release_context(scope);
        }
        self.close_open_scopes(entry.flow)?;

        self.contexts[target.0].reset(entry.state, entry.result);
        let pass = entry.iteration.map(|(state, result)| {
            let pass = self.alloc_context(state, Some(target));
            self.contexts[pass.0].update_result(result);
            pass
        });
        let flow = self.flow_mut(entry.flow)?;
        flow.rewind(entry.position);
        flow.iteration = pass;
        self.history.pop()?;

        debug!(flow = %entry.flow, screen = %entry.screen, "resumed from history");
        self.sink.emit(Event::Back {
            task: task_name,
            handled: true,
        });
        Ok(true)
    }

    /// Walks the call stack from the head, following the chain of owning
    /// flows that starts at the requesting task. Returns the scope of the flow
    /// that is both on that chain and the recorded `owner`.
    fn find_owner(&self, id: TaskId, owner: TaskId) -> Result<Option<ContextId>, EngineError> {
        let mut requester = self.task(id)?.owner_flow;
        for &scope in self.call_stack.iter() {
            let Some(flow) = self.contexts[scope.0].flow() else {
                continue;
            };
            if Some(flow) != requester {
                break;
            }
            if flow == owner {
                return Ok(Some(scope));
            }
            requester = self.task(flow)?.owner_flow;
        }
        Ok(None)
    }

    /// Closes the child scope and the pass scope a flow has open.
    fn close_open_scopes(&mut self, flow_id: TaskId) -> Result<(), EngineError> {
        let flow = self.flow(flow_id)?;
        let open = [flow.current.map(|child| child.context), flow.iteration];
        for scope in open.into_iter().flatten() {
            self.release_context(scope);
        }
        Ok(())
    }
}
