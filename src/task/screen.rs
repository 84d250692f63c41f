use crate::component::{Component, ComponentEvent};
use crate::document::{Repos, ScreenDefinition};
use crate::error::{DocumentError, TaskError};
use crate::path::PathEvaluator;
use crate::state::{self, StateTree};
use crate::validator::Checker;
use ahash::AHashMap;
use serde_json::Value;

/// A screen of components waiting for driver input.
#[derive(Debug, Clone)]
pub struct Screen {
    components: Vec<Component>,
}

impl Screen {
    pub fn new(definition: &ScreenDefinition, repos: &Repos) -> Result<Self, DocumentError> {
        let components = definition
            .components
            .iter()
            .flatten()
            .map(|entry| {
                repos
                    .components
                    .get(&entry.name)
                    .map(|component| Component::from_definition(component, entry))
                    .ok_or_else(|| DocumentError::MissingReference {
                        kind: "component",
                        name: entry.name.clone(),
                        referenced_by: definition.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Screen { components })
    }

    /// Every declared component, shown or not, in row order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The components whose preconditions pass, in row order.
    pub fn shown(&self, checker: &Checker) -> Result<Vec<&Component>, TaskError> {
        let mut shown = Vec::new();
        for component in &self.components {
            if component.show(checker)? {
                shown.push(component);
            }
        }
        Ok(shown)
    }

    fn shown_mut(&mut self, name: &str, screen: &str, checker: &Checker) -> Result<&mut Component, TaskError> {
        let unknown = || TaskError::UnknownComponent {
            task: screen.to_string(),
            component: name.to_string(),
        };
        let component = self
            .components
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(unknown)?;
        if !component.show(checker)? {
            return Err(unknown());
        }
        Ok(component)
    }

    pub fn set(
        &mut self,
        screen: &str,
        name: &str,
        value: Value,
        checker: &Checker,
    ) -> Result<(), TaskError> {
        self.shown_mut(name, screen, checker)?.set_value(value)
    }

    pub fn click(
        &mut self,
        screen: &str,
        name: &str,
        checker: &Checker,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Vec<ComponentEvent>, TaskError> {
        self.shown_mut(name, screen, checker)?.click(checker, evaluator)
    }

    /// Runs the validators of every shown component. Returns `true` when none fail.
    ///
    /// Hidden components have their errors cleared.
    pub fn validate(&mut self, checker: &Checker) -> Result<bool, TaskError> {
        let mut valid = true;
        for component in &mut self.components {
            if component.show(checker)? {
                valid &= component.validate(checker)?;
            } else {
                component.clear_errors();
            }
        }
        Ok(valid)
    }

    /// Per-component validation messages. Components without errors are omitted.
    pub fn errors(&self) -> AHashMap<String, Vec<String>> {
        self.components
            .iter()
            .filter(|c| !c.errors().is_empty())
            .map(|c| (c.name().to_string(), c.errors().to_vec()))
            .collect()
    }

    /// The values of shown, non-button components, each written at its destination path.
    pub fn result(&self, checker: &Checker, evaluator: &dyn PathEvaluator) -> Result<StateTree, TaskError> {
        let mut result = state::empty();
        for component in self.shown(checker)? {
            if component.is_button() {
                continue;
            }
            if let (Some(path), Some(value)) = (component.destination_path(), component.value()) {
                let patch = evaluator.set(&state::empty(), path, value.clone())?;
                state::merge_into(&mut result, patch);
            }
        }
        Ok(result)
    }
}
