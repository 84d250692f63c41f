//! State trees and the deep-merge rule used to move data between scopes.

use serde_json::{Map, Value};

/// A JSON-like value tree holding workflow state.
///
/// Trees are immutable by convention: readers receive copies and writers go
/// through [`merge`] or [`merge_into`], so no holder of an old tree ever
/// observes a change made through another scope.
pub type StateTree = Value;

/// Returns an empty object tree.
pub fn empty() -> StateTree {
    Value::Object(Map::new())
}

/// Deep-merges `patch` over `base` and returns the merged tree.
///
/// Object keys are overlaid recursively. Any other patch value replaces the
/// base outright. Keys present in `base` but absent from `patch` are kept.
pub fn merge(base: &StateTree, patch: &StateTree) -> StateTree {
    let mut merged = base.clone();
    merge_into(&mut merged, patch.clone());
    merged
}

/// In-place form of [`merge`], used by the owner of a tree.
pub fn merge_into(base: &mut StateTree, patch: StateTree) {
    match patch {
        Value::Object(entries) => {
            if !base.is_object() {
                *base = empty();
            }
            if let Value::Object(target) = base {
                for (key, value) in entries {
                    match target.get_mut(&key) {
                        Some(existing) if existing.is_object() && value.is_object() => {
                            merge_into(existing, value)
                        }
                        _ => {
                            target.insert(key, value);
                        }
                    }
                }
            }
        }
        other => *base = other,
    }
}

/// Short human-readable name of a value's JSON type, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
