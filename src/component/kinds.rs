use super::{Clickable, ComponentEvent, Displayable, Valued};
use crate::error::PathError;
use crate::path::PathEvaluator;
use crate::state::StateTree;
use crate::template;
use serde_json::{Value, json};

/// Free-text field. Also used for date/time fields.
#[derive(Debug, Clone)]
pub struct Input {
    pub label: String,
    pub obscure: bool,
    pub input_type: String,
    pub value: Value,
}

impl Valued for Input {
    fn get_value(&self) -> &Value {
        &self.value
    }

    fn set_value(&mut self, value: Value) {
        self.value = value;
    }
}

impl Displayable for Input {
    fn render(&self, _: &StateTree, _: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({
            "label": self.label,
            "input_type": self.input_type,
            "obscure": self.obscure,
            "value": self.value,
        }))
    }
}

/// Pick one of a list of options, given literally or read from the state.
#[derive(Debug, Clone)]
pub struct Selection {
    pub label: String,
    pub is_required: bool,
    pub options_values: Vec<Value>,
    pub options_key: Option<String>,
    pub value: Value,
}

impl Selection {
    pub fn options(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Vec<Value>, PathError> {
        match (&self.options_key, self.options_values.is_empty()) {
            (Some(path), true) => Ok(match evaluator.get_one(state, path)? {
                Value::Array(items) => items,
                other => vec![other],
            }),
            _ => Ok(self.options_values.clone()),
        }
    }
}

impl Valued for Selection {
    fn get_value(&self) -> &Value {
        &self.value
    }

    fn set_value(&mut self, value: Value) {
        self.value = value;
    }
}

impl Displayable for Selection {
    fn render(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({
            "label": self.label,
            "is_required": self.is_required,
            "options": self.options(state, evaluator)?,
            "value": self.value,
        }))
    }
}

/// An on/off switch. Each click flips its value.
#[derive(Debug, Clone)]
pub struct Toggle {
    pub label: String,
    pub style: Option<String>,
    pub value: Value,
}

impl Valued for Toggle {
    fn get_value(&self) -> &Value {
        &self.value
    }

    fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    fn accepts_input(&self) -> bool {
        false
    }
}

impl Clickable for Toggle {
    fn press(
        &mut self,
        _: Option<&str>,
        _: &dyn PathEvaluator,
    ) -> Result<Vec<ComponentEvent>, PathError> {
        let current = self.value.as_bool().unwrap_or(false);
        self.value = Value::Bool(!current);
        Ok(Vec::new())
    }
}

impl Displayable for Toggle {
    fn render(&self, _: &StateTree, _: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({ "label": self.label, "style": self.style, "value": self.value }))
    }
}

/// Triggers an action. Carries a fixed value that is recorded once clicked.
#[derive(Debug, Clone)]
pub struct Button {
    pub action: String,
    pub style: Option<String>,
    pub text: String,
    pub value: Value,
    pub disabling_validators: Vec<String>,
    pub pressed: Value,
}

impl Valued for Button {
    fn get_value(&self) -> &Value {
        &self.pressed
    }

    fn set_value(&mut self, value: Value) {
        self.pressed = value;
    }

    fn accepts_input(&self) -> bool {
        false
    }
}

impl Clickable for Button {
    fn disabling_validators(&self) -> &[String] {
        &self.disabling_validators
    }

    fn press(
        &mut self,
        destination: Option<&str>,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Vec<ComponentEvent>, PathError> {
        self.pressed = self.value.clone();
        let mut events = Vec::new();
        if let Some(path) = destination {
            if !self.pressed.is_null() {
                let patch = evaluator.set(&crate::state::empty(), path, self.pressed.clone())?;
                events.push(ComponentEvent::Update(patch));
            }
        }
        events.push(ComponentEvent::Action(self.action.clone()));
        Ok(events)
    }
}

impl Displayable for Button {
    fn render(&self, _: &StateTree, _: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({ "text": self.text, "style": self.style, "action": self.action }))
    }
}

#[derive(Debug, Clone)]
pub struct Textbox {
    pub text: String,
}

impl Displayable for Textbox {
    fn render(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({ "text": template::render(&self.text, state, evaluator)? }))
    }
}

/// A templated message, e.g. an info or error banner.
#[derive(Debug, Clone)]
pub struct MessageBox {
    pub template: String,
    pub message_type: String,
    pub size: Option<String>,
}

impl Displayable for MessageBox {
    fn render(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({
            "type": self.message_type,
            "size": self.size,
            "text": template::render(&self.template, state, evaluator)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub url: String,
}

impl Displayable for Image {
    fn render(&self, _: &StateTree, _: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({ "url": self.url }))
    }
}

/// Lists data from the state, either as a plain `list` or as `details` pairs.
#[derive(Debug, Clone)]
pub struct DisplayData {
    pub display_type: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub data: String,
}

impl Displayable for DisplayData {
    fn render(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Value, PathError> {
        Ok(json!({
            "display_type": self.display_type,
            "title": self.title,
            "subtitle": self.subtitle,
            "data": evaluator.get_one(state, &self.data)?,
        }))
    }
}
