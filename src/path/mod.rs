//! Reading and writing state trees by path expression.
//!
//! The engine only depends on the [`PathEvaluator`] capability. [`JsonPath`]
//! is the default implementation and understands the JSONPath subset used by
//! workflow documents: `$`, `.field`, `['field']`, `[n]` and `[*]`.

mod parsing;

pub use parsing::{Segment, parse_path};

use crate::error::PathError;
use crate::state::StateTree;
use serde_json::Value;

/// Capability for addressing nested values inside a [`StateTree`].
pub trait PathEvaluator: Send + Sync {
    /// Returns every value matched by `path`, in document order.
    fn get(&self, tree: &StateTree, path: &str) -> Result<Vec<Value>, PathError>;

    /// Returns the first value matched by `path`.
    fn get_one(&self, tree: &StateTree, path: &str) -> Result<Value, PathError> {
        self.get(tree, path)?
            .into_iter()
            .next()
            .ok_or_else(|| PathError::MissingPathValue(path.to_string()))
    }

    /// Returns a copy of `tree` with `value` written at `path`.
    fn set(&self, tree: &StateTree, path: &str, value: Value) -> Result<StateTree, PathError>;
}

/// The default path evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPath;

impl PathEvaluator for JsonPath {
    fn get(&self, tree: &StateTree, path: &str) -> Result<Vec<Value>, PathError> {
        let segments = parse_path(path)?;
        let mut matches = Vec::new();
        collect(tree, &segments, &mut matches);
        Ok(matches.into_iter().cloned().collect())
    }

    fn set(&self, tree: &StateTree, path: &str, value: Value) -> Result<StateTree, PathError> {
        let segments = parse_path(path)?;
        let mut updated = tree.clone();
        write(&mut updated, &segments, value, path)?;
        Ok(updated)
    }
}

fn collect<'a>(node: &'a Value, segments: &[Segment], out: &mut Vec<&'a Value>) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push(node);
        return;
    };
    match (segment, node) {
        (Segment::Field(name), Value::Object(map)) => {
            if let Some(child) = map.get(name) {
                collect(child, rest, out);
            }
        }
        (Segment::Index(i), Value::Array(items)) => {
            if let Some(child) = items.get(*i) {
                collect(child, rest, out);
            }
        }
        (Segment::Wildcard, Value::Object(map)) => {
            for child in map.values() {
                collect(child, rest, out);
            }
        }
        (Segment::Wildcard, Value::Array(items)) => {
            for child in items {
                collect(child, rest, out);
            }
        }
        _ => {}
    }
}

fn unsupported(path: &str, reason: String) -> PathError {
    PathError::UnsupportedPathMutation {
        path: path.to_string(),
        reason,
    }
}

fn write(node: &mut Value, segments: &[Segment], value: Value, path: &str) -> Result<(), PathError> {
    let Some((segment, rest)) = segments.split_first() else {
        *node = value;
        return Ok(());
    };
    match segment {
        Segment::Field(name) => {
            if node.is_null() {
                *node = crate::state::empty();
            }
            match node {
                Value::Object(map) => {
                    let child = map.entry(name.clone()).or_insert(Value::Null);
                    write(child, rest, value, path)
                }
                other => Err(unsupported(
                    path,
                    format!(
                        "cannot set field '{}' on a {}",
                        name,
                        crate::state::type_name(other)
                    ),
                )),
            }
        }
        Segment::Index(i) => match node {
            Value::Array(items) if *i < items.len() => write(&mut items[*i], rest, value, path),
            Value::Array(items) => Err(unsupported(
                path,
                format!("index {} is out of range for a list of {}", i, items.len()),
            )),
            other => Err(unsupported(
                path,
                format!("cannot index into a {}", crate::state::type_name(other)),
            )),
        },
        Segment::Wildcard => match node {
            Value::Object(map) if !map.is_empty() => {
                for child in map.values_mut() {
                    write(child, rest, value.clone(), path)?;
                }
                Ok(())
            }
            Value::Array(items) if !items.is_empty() => {
                for child in items.iter_mut() {
                    write(child, rest, value.clone(), path)?;
                }
                Ok(())
            }
            other => Err(unsupported(
                path,
                format!(
                    "wildcard has nothing to expand into on a {}",
                    crate::state::type_name(other)
                ),
            )),
        },
    }
}
