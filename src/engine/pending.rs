use super::{Session, wrong_kind};
use crate::component::{ComponentEvent, ComponentView};
use crate::error::{EngineError, TaskError};
use crate::state::StateTree;
use crate::task::jsonrpc::JsonRpc;
use crate::task::screen::Screen;
use crate::task::{Task, TaskBody, TaskId, TaskKind};
use crate::validator::Checker;
use ahash::AHashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// A task handed to the driver, borrowed from its session.
pub struct PendingTask<'s> {
    session: &'s mut Session,
    id: TaskId,
}

impl<'s> PendingTask<'s> {
    pub(crate) fn new(session: &'s mut Session, id: TaskId) -> Self {
        Self { session, id }
    }

    fn task(&self) -> &Task {
        &self.session.tasks[self.id.0]
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.task().name
    }

    pub fn kind(&self) -> TaskKind {
        self.task().kind
    }

    pub fn requires_input(&self) -> bool {
        self.task().requires_input()
    }

    pub fn is_complete(&self) -> bool {
        self.task().complete
    }

    /// The state the task sees.
    pub fn state(&self) -> &StateTree {
        self.session.contexts[self.task().context.0].state()
    }

    pub fn get_components(&self) -> Result<Vec<ComponentView>, EngineError> {
        self.session.components(self.id)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        self.session.set_field(self.id, field, value.into())
    }

    pub fn click(&mut self, component: &str) -> Result<(), EngineError> {
        self.session.click(self.id, component)
    }

    pub fn errors(&self) -> Result<AHashMap<String, Vec<String>>, EngineError> {
        self.session.errors(self.id)
    }

    pub fn get_endpoint(&self) -> Result<&str, EngineError> {
        Ok(&self.session.remote_call(self.id)?.endpoint)
    }

    pub fn get_payload(&self) -> Result<&Value, EngineError> {
        Ok(&self.session.remote_call(self.id)?.payload)
    }

    pub fn set_result(&mut self, value: impl Into<Value>) -> Result<(), EngineError> {
        self.session.set_result(self.id, value.into())
    }
}

impl Session {
    fn screen(&self, id: TaskId) -> Result<&Screen, EngineError> {
        let task = self.task(id)?;
        match &task.body {
            TaskBody::Screen(screen) => Ok(screen),
            _ => Err(wrong_kind(task, "screen")),
        }
    }

    fn screen_mut(&mut self, id: TaskId) -> Result<(&str, &mut Screen), EngineError> {
        let task = self.tasks.get_mut(id.0).ok_or(EngineError::UnknownTask(id))?;
        if !matches!(task.body, TaskBody::Screen(_)) {
            return Err(wrong_kind(task, "screen"));
        }
        match &mut task.body {
            TaskBody::Screen(screen) => Ok((&task.name, screen)),
            _ => Err(EngineError::UnknownTask(id)),
        }
    }

    pub(crate) fn remote_call(&self, id: TaskId) -> Result<&JsonRpc, EngineError> {
        let task = self.task(id)?;
        match &task.body {
            TaskBody::Jsonrpc(call) => Ok(call),
            _ => Err(wrong_kind(task, "jsonrpc")),
        }
    }

    /// Fails once a task has completed; drivers may only act on open tasks.
    fn ensure_open(&self, id: TaskId) -> Result<(), EngineError> {
        let task = self.task(id)?;
        if task.complete {
            return Err(TaskError::TaskAlreadyComplete(task.name.clone()).into());
        }
        Ok(())
    }

    fn task_state(&self, id: TaskId) -> Result<StateTree, EngineError> {
        let context = self.task(id)?.context;
        Ok(self.contexts[context.0].state().clone())
    }

    /// The shown components of a screen, in row order.
    pub fn components(&self, id: TaskId) -> Result<Vec<ComponentView>, EngineError> {
        let screen = self.screen(id)?;
        let state = self.task_state(id)?;
        let checker = Checker::new(&self.repos, &state, &*self.evaluator);
        let mut views = Vec::new();
        for component in screen.shown(&checker)? {
            views.push(ComponentView {
                name: component.name().to_string(),
                kind: component.kind(),
                value: component.value().cloned(),
                disabled: component.disabled(&checker)?,
                errors: component.errors().to_vec(),
                display: component.render(&state, &*self.evaluator)?,
            });
        }
        Ok(views)
    }

    pub fn set_field(&mut self, id: TaskId, field: &str, value: Value) -> Result<(), EngineError> {
        self.ensure_open(id)?;
        let repos = Arc::clone(&self.repos);
        let evaluator = Arc::clone(&self.evaluator);
        let state = self.task_state(id)?;
        let checker = Checker::new(&repos, &state, &*evaluator);
        let (name, screen) = self.screen_mut(id)?;
        let name = name.to_string();
        screen.set(&name, field, value, &checker)?;
        Ok(())
    }

    /// Clicks a component and carries out the events the click produced.
    pub fn click(&mut self, id: TaskId, component: &str) -> Result<(), EngineError> {
        self.ensure_open(id)?;
        let repos = Arc::clone(&self.repos);
        let evaluator = Arc::clone(&self.evaluator);
        let state = self.task_state(id)?;
        let events = {
            let checker = Checker::new(&repos, &state, &*evaluator);
            let (name, screen) = self.screen_mut(id)?;
            let name = name.to_string();
            screen.click(&name, component, &checker, &*evaluator)?
        };

        let context = self.task(id)?.context;
        for event in events {
            match event {
                ComponentEvent::Update(patch) => {
                    self.contexts[context.0].update_result(patch.clone());
                    self.contexts[context.0].update_state(patch);
                }
                ComponentEvent::Action(action) => match action.as_str() {
                    "submit" => {
                        if self.validate_screen(id)? {
                            self.complete_screen(id)?;
                        } else {
                            debug!(task = %self.tasks[id.0].name, "submit blocked by validation");
                        }
                    }
                    "next" => self.complete_screen(id)?,
                    "back" => {
                        self.navigate_back(id)?;
                    }
                    other => {
                        warn!(task = %self.tasks[id.0].name, action = other, "ignoring unknown action");
                    }
                },
            }
        }
        Ok(())
    }

    pub fn errors(&self, id: TaskId) -> Result<AHashMap<String, Vec<String>>, EngineError> {
        Ok(self.screen(id)?.errors())
    }

    fn validate_screen(&mut self, id: TaskId) -> Result<bool, EngineError> {
        let repos = Arc::clone(&self.repos);
        let evaluator = Arc::clone(&self.evaluator);
        let state = self.task_state(id)?;
        let checker = Checker::new(&repos, &state, &*evaluator);
        let (_, screen) = self.screen_mut(id)?;
        Ok(screen.validate(&checker)?)
    }

    fn complete_screen(&mut self, id: TaskId) -> Result<(), EngineError> {
        if self.task(id)?.complete {
            return Ok(());
        }
        if self.config.record_history {
            self.record_history(id)?;
        }
        let state = self.task_state(id)?;
        let result = {
            let checker = Checker::new(&self.repos, &state, &*self.evaluator);
            self.screen(id)?.result(&checker, &*self.evaluator)?
        };
        let context = self.task(id)?.context;
        self.contexts[context.0].update_result(result);
        self.tasks[id.0].complete = true;
        debug!(task = %self.tasks[id.0].name, "screen completed");
        Ok(())
    }

    /// Stores the transport's answer for a remote call and completes it.
    pub fn set_result(&mut self, id: TaskId, value: Value) -> Result<(), EngineError> {
        let patch = self.remote_call(id)?.result_patch(value, &*self.evaluator)?;
        self.ensure_open(id)?;
        let context = self.task(id)?.context;
        self.contexts[context.0].update_result(patch);
        self.tasks[id.0].complete = true;
        debug!(task = %self.tasks[id.0].name, "remote call answered");
        Ok(())
    }
}
