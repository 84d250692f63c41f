//! The declarative workflow document and its read-only repositories.

pub mod conversion;
pub mod definition;

pub use conversion::*;
pub use definition::*;

use crate::error::DocumentError;
use ahash::AHashMap;

/// The document's repositories, shared read-only by every scope of a session.
#[derive(Debug, Clone, Default)]
pub struct Repos {
    pub components: AHashMap<String, ComponentDefinition>,
    pub validators: AHashMap<String, ValidatorDefinition>,
    pub flows: AHashMap<String, FlowDefinition>,
}

impl Document {
    /// Parses a JSON document and checks its references.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Self::load(text)
    }

    /// Converts any [`IntoDocument`] source and checks its references.
    pub fn load(source: impl IntoDocument) -> Result<Self, DocumentError> {
        let document = source.into_document()?;
        document.validate()?;
        Ok(document)
    }

    /// Verifies that every name the document references is defined in it.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if !self.context.is_object() {
            return Err(DocumentError::InvalidContext(
                crate::state::type_name(&self.context).to_string(),
            ));
        }
        if !self.flows.contains_key(&self.starting_flow) {
            return Err(missing("flow", &self.starting_flow, "starting_flow"));
        }

        for (name, component) in &self.components {
            self.check_validators(&component.preconditions, name)?;
            self.check_validators(&component.validator, name)?;
            if let ComponentKind::Button {
                disabling_validators,
                ..
            } = &component.kind
            {
                self.check_validators(disabling_validators, name)?;
            }
        }

        for (flow_name, flow) in &self.flows {
            self.check_validators(&flow.config.conditions, flow_name)?;
            for task in &flow.tasks {
                let owner = format!("{}.{}", flow_name, task.name());
                self.check_validators(task.preconditions(), &owner)?;
                match task {
                    TaskDefinition::Screen(screen) => {
                        for entry in screen.components.iter().flatten() {
                            if !self.components.contains_key(&entry.name) {
                                return Err(missing("component", &entry.name, &owner));
                            }
                            if let Some(preconditions) = &entry.preconditions {
                                self.check_validators(preconditions, &owner)?;
                            }
                        }
                    }
                    TaskDefinition::Flow(reference)
                    | TaskDefinition::WhileLoop(reference)
                    | TaskDefinition::ForLoop(reference) => {
                        if !self.flows.contains_key(&reference.name) {
                            return Err(missing("flow", &reference.name, &owner));
                        }
                        if let Some(config) = &reference.config {
                            self.check_validators(&config.conditions, &owner)?;
                        }
                    }
                    TaskDefinition::Jsonrpc(_)
                    | TaskDefinition::Update(_)
                    | TaskDefinition::Redirect(_)
                    | TaskDefinition::Event(_) => {}
                }
            }
        }
        Ok(())
    }

    fn check_validators(&self, names: &[String], owner: &str) -> Result<(), DocumentError> {
        match names.iter().find(|n| !self.validators.contains_key(*n)) {
            Some(name) => Err(missing("validator", name, owner)),
            None => Ok(()),
        }
    }

    /// Splits the document into its shared repositories and start parameters.
    pub fn into_parts(self) -> (Repos, String, serde_json::Value) {
        (
            Repos {
                components: self.components,
                validators: self.validators,
                flows: self.flows,
            },
            self.starting_flow,
            self.context,
        )
    }
}

fn missing(kind: &'static str, name: &str, referenced_by: &str) -> DocumentError {
    DocumentError::MissingReference {
        kind,
        name: name.to_string(),
        referenced_by: referenced_by.to_string(),
    }
}
