//! Named validation rules evaluated against a value and the current state.

use crate::document::{Repos, Rule, ValidatorDefinition};
use crate::error::TaskError;
use crate::path::PathEvaluator;
use crate::state::StateTree;
use crate::template;
use regex::Regex;
use serde_json::Value;

/// Evaluates validators from the document against one state tree.
pub struct Checker<'a> {
    repos: &'a Repos,
    state: &'a StateTree,
    evaluator: &'a dyn PathEvaluator,
}

impl<'a> Checker<'a> {
    pub fn new(repos: &'a Repos, state: &'a StateTree, evaluator: &'a dyn PathEvaluator) -> Self {
        Self {
            repos,
            state,
            evaluator,
        }
    }

    fn definition(&self, name: &str) -> Result<&'a ValidatorDefinition, TaskError> {
        self.repos
            .validators
            .get(name)
            .ok_or_else(|| TaskError::UnknownValidator(name.to_string()))
    }

    /// Returns whether the named validator passes for `value`.
    ///
    /// `value` is the component's own value; validators with a `value_path`
    /// read from the state instead.
    pub fn passes(&self, name: &str, value: Option<&Value>) -> Result<bool, TaskError> {
        let definition = self.definition(name)?;
        let subject = match &definition.value_path {
            Some(path) => self.first_match(path)?,
            None => value.cloned().unwrap_or(Value::Null),
        };
        let expected = match &definition.validator_key {
            Some(path) => self.first_match(path)?,
            None => definition.validator_value.clone(),
        };
        let outcome = apply_rule(name, definition.rule, &subject, &expected)?;
        Ok(outcome == definition.valid_when)
    }

    /// True when every named validator passes. An empty list passes.
    pub fn all_pass(&self, names: &[String], value: Option<&Value>) -> Result<bool, TaskError> {
        for name in names {
            if !self.passes(name, value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when at least one named validator passes.
    pub fn any_pass(&self, names: &[String], value: Option<&Value>) -> Result<bool, TaskError> {
        for name in names {
            if self.passes(name, value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rendered messages of every named validator that fails, in order.
    pub fn failures(&self, names: &[String], value: Option<&Value>) -> Result<Vec<String>, TaskError> {
        let mut messages = Vec::new();
        for name in names {
            if !self.passes(name, value)? {
                messages.push(self.message(name)?);
            }
        }
        Ok(messages)
    }

    pub fn message(&self, name: &str) -> Result<String, TaskError> {
        let definition = self.definition(name)?;
        Ok(template::render(
            &definition.message.template,
            self.state,
            self.evaluator,
        )?)
    }

    fn first_match(&self, path: &str) -> Result<Value, TaskError> {
        Ok(self
            .evaluator
            .get(self.state, path)?
            .into_iter()
            .next()
            .unwrap_or(Value::Null))
    }
}

fn apply_rule(name: &str, rule: Rule, subject: &Value, expected: &Value) -> Result<bool, TaskError> {
    let outcome = match rule {
        Rule::IsLength => {
            let length = text_length(subject);
            let (min, max) = match expected {
                Value::Object(bounds) => (
                    bounds.get("min").and_then(Value::as_u64).unwrap_or(0),
                    bounds.get("max").and_then(Value::as_u64),
                ),
                other => (other.as_u64().unwrap_or(0), None),
            };
            length >= min && max.is_none_or(|m| length <= m)
        }
        Rule::Equals => values_equal(subject, expected),
        Rule::NotEquals => !values_equal(subject, expected),
        Rule::GreaterThan => compare(subject, expected).is_some_and(|o| o.is_gt()),
        Rule::LessThan => compare(subject, expected).is_some_and(|o| o.is_lt()),
        Rule::Matches => {
            let pattern = expected.as_str().ok_or_else(|| TaskError::InvalidRule {
                validator: name.to_string(),
                message: "'matches' needs a string pattern".to_string(),
            })?;
            let regex = Regex::new(pattern).map_err(|e| TaskError::InvalidRule {
                validator: name.to_string(),
                message: e.to_string(),
            })?;
            subject.as_str().is_some_and(|s| regex.is_match(s))
        }
    };
    Ok(outcome)
}

fn text_length(value: &Value) -> u64 {
    let length = match value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        other => other.to_string().chars().count(),
    };
    length as u64
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    as_number(left)?.partial_cmp(&as_number(right)?)
}
