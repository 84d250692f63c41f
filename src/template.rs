//! `{{ path }}` substitution for message text.

use crate::error::PathError;
use crate::path::PathEvaluator;
use crate::state::StateTree;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{\{\s*(.*?)\s*\}\}").unwrap();
}

/// Renders `template`, replacing every `{{ path }}` with the value found in `state`.
///
/// Strings are inserted verbatim; any other value is inserted as compact JSON.
pub fn render(
    template: &str,
    state: &StateTree,
    evaluator: &dyn PathEvaluator,
) -> Result<String, PathError> {
    let mut failure = None;
    let rendered = PLACEHOLDER_REGEX.replace_all(template, |caps: &Captures| {
        match evaluator.get_one(state, &caps[1]) {
            Ok(value) => display_value(&value),
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(rendered.into_owned()),
    }
}

/// Returns true if `template` contains at least one placeholder.
pub fn has_placeholders(template: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(template)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
