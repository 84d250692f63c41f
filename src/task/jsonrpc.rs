use super::update;
use crate::document::JsonRpcDefinition;
use crate::error::PathError;
use crate::path::PathEvaluator;
use crate::state::{self, StateTree};
use serde_json::Value;

/// A remote call performed by the driver's transport.
#[derive(Debug, Clone)]
pub struct JsonRpc {
    pub endpoint: String,
    pub method: Option<String>,
    pub payload: Value,
    /// Where the call's result is stored. Without one the call is fire-and-forget.
    pub destination_path: Option<String>,
}

impl JsonRpc {
    /// Builds the payload from the literal template and the payload instructions.
    pub fn new(
        definition: &JsonRpcDefinition,
        state: &StateTree,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Self, PathError> {
        let substitutions = update::apply(&definition.payload_paths, state, evaluator, false)?;
        Ok(JsonRpc {
            endpoint: definition.url.clone(),
            method: definition.method.clone(),
            payload: state::merge(&definition.payload, &substitutions),
            destination_path: definition.destination_path.clone(),
        })
    }

    /// The result patch for a value returned by the transport.
    pub fn result_patch(&self, value: Value, evaluator: &dyn PathEvaluator) -> Result<StateTree, PathError> {
        match &self.destination_path {
            Some(path) => evaluator.set(&state::empty(), path, value),
            None => Ok(state::empty()),
        }
    }
}
