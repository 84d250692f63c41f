use crate::document::{Instruction, InstructionSource};
use crate::error::PathError;
use crate::path::PathEvaluator;
use crate::state::{self, StateTree};
use crate::template;
use serde_json::Value;

/// A pure state transform.
#[derive(Debug, Clone)]
pub struct Update {
    pub instructions: Vec<Instruction>,
}

impl Update {
    /// Each instruction sees the values written by the ones before it.
    pub fn run(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<StateTree, PathError> {
        apply(&self.instructions, state, evaluator, true)
    }
}

/// Computes the value one instruction produces against `state`.
pub fn evaluate(
    instruction: &Instruction,
    state: &StateTree,
    evaluator: &dyn PathEvaluator,
) -> Result<Value, PathError> {
    match &instruction.source {
        InstructionSource::Value(value) => Ok(value.clone()),
        InstructionSource::Key(path) => evaluator.get_one(state, path),
        InstructionSource::Template(text) => {
            Ok(Value::String(template::render(text, state, evaluator)?))
        }
    }
}

/// Runs every instruction and merges the results into one patch.
///
/// With `chained`, each instruction is evaluated against `state` plus the
/// patch built so far.
pub fn apply(
    instructions: &[Instruction],
    state: &StateTree,
    evaluator: &dyn PathEvaluator,
    chained: bool,
) -> Result<StateTree, PathError> {
    let mut patch = state::empty();
    let mut working = state.clone();
    for instruction in instructions {
        let source = if chained { &working } else { state };
        let value = evaluate(instruction, source, evaluator)?;
        let written = evaluator.set(&state::empty(), &instruction.result_key, value)?;
        if chained {
            state::merge_into(&mut working, written.clone());
        }
        state::merge_into(&mut patch, written);
    }
    Ok(patch)
}
