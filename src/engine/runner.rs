use super::Session;
use crate::context::ContextId;
use crate::document::{FlowReference, TaskDefinition};
use crate::error::{EngineError, TaskError};
use crate::event::Event;
use crate::state::StateTree;
use crate::task::flow::{Child, Flow, FlowKind};
use crate::task::jsonrpc::JsonRpc;
use crate::task::screen::Screen;
use crate::task::update::Update;
use crate::task::{TaskBody, TaskId, TaskKind};
use crate::validator::Checker;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// What a flow asks of the pump after one advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Hand this task to the driver.
    Yield(TaskId),
    /// Enter the sub-flow running in this scope.
    Descend(ContextId),
    /// The flow has no more tasks.
    Exhausted,
    /// A redirect ran. Nothing in this document runs after it.
    Halted,
}

/// Work a non-input task does when it runs.
enum Effect {
    Update(Update),
    Redirect(String),
    Break,
    Marker(String),
    RemoteCall(JsonRpc),
    Nothing,
}

impl Session {
    /// Resumes the deepest active scope until some task needs the driver.
    pub(crate) fn next_pending(&mut self) -> Result<Option<TaskId>, EngineError> {
        if self.redirected.is_some() {
            return Ok(None);
        }
        loop {
            let scope = match self.call_stack.get_head() {
                Ok(scope) => *scope,
                Err(_) => return Ok(None),
            };
            let Some(flow_id) = self.contexts[scope.0].flow() else {
                self.call_stack.pop()?;
                continue;
            };
            trace!(scope = %scope, flow = %flow_id, "resuming scope");

            match self.advance(flow_id)? {
                Step::Yield(task) => return Ok(Some(task)),
                Step::Halted => return Ok(None),
                Step::Descend(child) => {
                    debug!(scope = %child, "entering sub-flow");
                    self.call_stack.push(child);
                }
                Step::Exhausted => {
                    self.call_stack.pop()?;
                    if self.call_stack.is_empty() {
                        self.release_context(scope);
                        info!(flow = %self.tasks[flow_id.0].name, "session finished");
                        return Ok(None);
                    }
                    debug!(scope = %scope, "leaving sub-flow");
                }
            }
        }
    }

    fn advance(&mut self, flow_id: TaskId) -> Result<Step, EngineError> {
        if self.task(flow_id)?.complete {
            return Ok(Step::Exhausted);
        }
        loop {
            let current = self.flow(flow_id)?.current;
            if let Some(child) = current {
                let task = self.task(child.task)?;
                let interrupt = !child.interrupted && self.breakpoints.contains(&task.name);
                let requires_input = task.requires_input();
                let descend = task.kind.is_flow() && !task.complete;

                if interrupt {
                    debug!(task = %task.name, "breakpoint reached");
                    if let Some(current) = self.flow_mut(flow_id)?.current.as_mut() {
                        current.interrupted = true;
                    }
                    return Ok(Step::Yield(child.task));
                }
                if requires_input {
                    return Ok(Step::Yield(child.task));
                }
                if descend {
                    return Ok(Step::Descend(child.context));
                }
                self.finish_child(flow_id, child)?;
                if self.redirected.is_some() {
                    return Ok(Step::Halted);
                }
                continue;
            }

            if !self.open_next(flow_id)? {
                self.finish_flow(flow_id)?;
                return Ok(Step::Exhausted);
            }
        }
    }

    /// Opens the next declared task, or moves a loop between passes.
    ///
    /// Returns `false` once the flow has nothing left to run.
    fn open_next(&mut self, flow_id: TaskId) -> Result<bool, EngineError> {
        let repos = Arc::clone(&self.repos);
        let flow_context = self.task(flow_id)?.context;
        let flow = self.flow(flow_id)?;
        let (is_loop, iteration, broke, cursor) =
            (flow.is_loop(), flow.iteration, flow.broke, flow.cursor);
        let declared = repos
            .flows
            .get(&flow.definition)
            .ok_or_else(|| TaskError::UnknownFlow(flow.definition.clone()))?;

        if is_loop {
            match iteration {
                None => return self.begin_pass(flow_id),
                Some(_) if broke || cursor >= declared.tasks.len() => {
                    self.end_pass(flow_id)?;
                    return Ok(true);
                }
                Some(_) => {}
            }
        } else if broke || cursor >= declared.tasks.len() {
            return Ok(false);
        }

        let definition = &declared.tasks[cursor];
        let scope = iteration.unwrap_or(flow_context);
        self.flow_mut(flow_id)?.cursor += 1;

        let seed = self.contexts[scope.0].state().clone();
        let child_context = self.alloc_context(seed, Some(scope));
        debug!(scope = %child_context, task = definition.name(), "scope opened");

        let shown = {
            let state = self.contexts[child_context.0].state();
            Checker::new(&repos, state, &*self.evaluator).all_pass(definition.preconditions(), None)
        };
        match shown {
            Ok(true) => {}
            Ok(false) => {
                debug!(task = definition.name(), "preconditions failed, task skipped");
                self.release_context(child_context);
                return Ok(true);
            }
            Err(e) => {
                self.release_context(child_context);
                return Err(e.into());
            }
        }

        let task = match self.build_task(definition, child_context, flow_id) {
            Ok(task) => task,
            Err(e) => {
                self.release_context(child_context);
                return Err(e);
            }
        };
        self.flow_mut(flow_id)?.current = Some(Child {
            task,
            context: child_context,
            position: cursor,
            interrupted: false,
        });
        Ok(true)
    }

    fn build_task(
        &mut self,
        definition: &TaskDefinition,
        context: ContextId,
        owner: TaskId,
    ) -> Result<TaskId, EngineError> {
        let repos = Arc::clone(&self.repos);
        let evaluator = Arc::clone(&self.evaluator);
        let state = self.contexts[context.0].state();

        let (kind, body) = match definition {
            TaskDefinition::Screen(screen) => {
                (TaskKind::Screen, TaskBody::Screen(Screen::new(screen, &repos)?))
            }
            TaskDefinition::Jsonrpc(call) => (
                TaskKind::Jsonrpc,
                TaskBody::Jsonrpc(JsonRpc::new(call, state, &*evaluator)?),
            ),
            TaskDefinition::Flow(reference) => (
                TaskKind::Flow,
                self.flow_body(reference, FlowKind::Sequence, state)?,
            ),
            TaskDefinition::WhileLoop(reference) => (
                TaskKind::WhileLoop,
                self.flow_body(reference, FlowKind::While, state)?,
            ),
            TaskDefinition::ForLoop(reference) => (
                TaskKind::ForLoop,
                self.flow_body(reference, FlowKind::For, state)?,
            ),
            TaskDefinition::Update(update) => (
                TaskKind::Update,
                TaskBody::Update(Update {
                    instructions: update.instructions.clone(),
                }),
            ),
            TaskDefinition::Redirect(redirect) => (
                TaskKind::Redirect,
                TaskBody::Redirect {
                    url: redirect.url.clone(),
                },
            ),
            TaskDefinition::Event(event) => (
                TaskKind::Event,
                TaskBody::Event {
                    action: event.action.clone(),
                },
            ),
        };

        let id = self.alloc_task(definition.name(), kind, context, Some(owner), body);
        debug!(task = definition.name(), kind = %kind, id = %id, "task opened");
        Ok(id)
    }

    fn flow_body(
        &self,
        reference: &FlowReference,
        kind: FlowKind,
        state: &StateTree,
    ) -> Result<TaskBody, EngineError> {
        let declared = self
            .repos
            .flows
            .get(&reference.name)
            .ok_or_else(|| TaskError::UnknownFlow(reference.name.clone()))?;
        let config = match &reference.config {
            Some(inline) => declared.config.overlaid(inline),
            None => declared.config.clone(),
        };
        let flow = Flow::new(&reference.name, kind, config, state, &*self.evaluator)?;
        Ok(TaskBody::Flow(flow))
    }

    /// Starts the next loop pass. Returns `false` when the loop is over.
    fn begin_pass(&mut self, flow_id: TaskId) -> Result<bool, EngineError> {
        let flow_context = self.task(flow_id)?.context;
        let flow = self.flow(flow_id)?;
        if flow.looping.finished {
            return Ok(false);
        }

        let proceed = match flow.kind {
            FlowKind::While => {
                let conditions = &flow.config.conditions;
                !conditions.is_empty()
                    && Checker::new(
                        &self.repos,
                        self.contexts[flow_context.0].state(),
                        &*self.evaluator,
                    )
                    .all_pass(conditions, None)?
            }
            FlowKind::For => flow.has_items_left(),
            FlowKind::Sequence => false,
        };
        if !proceed {
            debug!(flow = %flow.definition, passes = flow.looping.passes, "loop finished");
            self.flow_mut(flow_id)?.looping.finished = true;
            return Ok(false);
        }

        if flow.looping.passes >= self.config.max_loop_passes {
            return Err(TaskError::LoopLimitExceeded {
                flow: flow.definition.clone(),
                limit: self.config.max_loop_passes,
            }
            .into());
        }

        let seed = flow.pass_seed(self.contexts[flow_context.0].state());
        let pass = flow.looping.passes + 1;
        let iteration = self.alloc_context(seed, Some(flow_context));

        let flow = self.flow_mut(flow_id)?;
        flow.iteration = Some(iteration);
        flow.cursor = 0;
        flow.broke = false;
        flow.looping.passes = pass;
        debug!(flow = %flow.definition, pass, scope = %iteration, "loop pass started");
        Ok(true)
    }

    /// Folds a finished pass into the loop and records its snapshot.
    fn end_pass(&mut self, flow_id: TaskId) -> Result<(), EngineError> {
        let flow_context = self.task(flow_id)?.context;
        let flow = self.flow(flow_id)?;
        let Some(iteration) = flow.iteration else {
            return Ok(());
        };
        let pass_state = self.contexts[iteration.0].state();
        let pass_result = self.contexts[iteration.0].result().clone();
        let snapshot = flow.pass_snapshot(pass_state, &pass_result, &*self.evaluator)?;

        self.contexts[flow_context.0].update_state(pass_result);
        self.release_context(iteration);

        let flow = self.flow_mut(flow_id)?;
        flow.looping.snapshots.push(snapshot);
        flow.iteration = None;
        if flow.broke {
            flow.looping.finished = true;
            flow.broke = false;
            debug!(flow = %flow.definition, "loop broken");
        }
        Ok(())
    }

    /// Runs a child that needs no more input and folds its result into the flow.
    fn finish_child(&mut self, flow_id: TaskId, child: Child) -> Result<(), EngineError> {
        if !self.task(child.task)?.complete {
            if let Err(e) = self.run_task(child.task) {
                self.release_context(child.context);
                let flow = self.flow_mut(flow_id)?;
                flow.current = None;
                flow.cursor = child.position;
                return Err(e);
            }
        }

        let flow_context = self.task(flow_id)?.context;
        let iteration = self.flow(flow_id)?.iteration;
        let patch = self.contexts[child.context.0].result().clone();
        let scope = iteration.unwrap_or(flow_context);
        if iteration.is_some() {
            self.contexts[scope.0].update_result(patch.clone());
        }
        self.contexts[scope.0].update_state(patch);

        self.release_context(child.context);
        self.flow_mut(flow_id)?.current = None;
        debug!(task = %self.tasks[child.task.0].name, "task completed");
        Ok(())
    }

    /// Publishes a flow's result into its own scope and marks it complete.
    fn finish_flow(&mut self, flow_id: TaskId) -> Result<(), EngineError> {
        let flow_context = self.task(flow_id)?.context;
        let result = self
            .flow(flow_id)?
            .published_result(self.contexts[flow_context.0].state(), &*self.evaluator)?;
        self.contexts[flow_context.0].update_result(result);
        let task = &mut self.tasks[flow_id.0];
        task.complete = true;
        debug!(flow = %task.name, "flow completed");
        Ok(())
    }

    /// Runs a task that does not wait for input and marks it complete.
    pub(crate) fn run_task(&mut self, id: TaskId) -> Result<(), EngineError> {
        let task = self.task(id)?;
        let (name, context, owner) = (task.name.clone(), task.context, task.owner_flow);
        let effect = match &task.body {
            TaskBody::Update(update) => Effect::Update(update.clone()),
            TaskBody::Redirect { url } => Effect::Redirect(url.clone()),
            TaskBody::Event { action } if action == "break" => Effect::Break,
            TaskBody::Event { action } => Effect::Marker(action.clone()),
            TaskBody::Jsonrpc(call) if call.destination_path.is_none() => {
                Effect::RemoteCall(call.clone())
            }
            TaskBody::Jsonrpc(_) | TaskBody::Screen(_) | TaskBody::Flow(_) => Effect::Nothing,
        };

        match effect {
            Effect::Update(update) => {
                let patch = update.run(self.contexts[context.0].state(), &*self.evaluator)?;
                self.contexts[context.0].update_result(patch);
            }
            Effect::Redirect(url) => {
                info!(task = %name, url = %url, "redirecting");
                self.redirected = Some(url.clone());
                self.sink.emit(Event::Redirect { url });
            }
            Effect::Break => {
                if let Some(owner) = owner {
                    self.flow_mut(owner)?.broke = true;
                }
            }
            Effect::Marker(action) => {
                debug!(task = %name, action = %action, "event marker");
                self.sink.emit(Event::Marker { task: name, action });
            }
            Effect::RemoteCall(call) => {
                debug!(task = %name, endpoint = %call.endpoint, "fire-and-forget remote call");
                self.sink.emit(Event::RemoteCall {
                    endpoint: call.endpoint,
                    payload: call.payload,
                });
            }
            Effect::Nothing => {}
        }

        self.tasks[id.0].complete = true;
        Ok(())
    }
}
