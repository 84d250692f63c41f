//! Screen components, modelled as a small set of capabilities.
//!
//! Every component can be shown or hidden by its preconditions. On top of
//! that a component may hold a value ([`Valued`]), react to clicks
//! ([`Clickable`]) and render a view for the driver ([`Displayable`]).

pub mod kinds;

pub use kinds::*;

use crate::document::{ComponentDefinition, ComponentKind, RowEntry};
use crate::error::{PathError, TaskError};
use crate::path::PathEvaluator;
use crate::state::StateTree;
use crate::validator::Checker;
use serde::Serialize;
use serde_json::Value;

/// Something a click asks the owning screen to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentEvent {
    /// Merge this patch into the screen's state and result.
    Update(Value),
    /// Perform a named action such as `submit`, `next` or `back`.
    Action(String),
}

pub trait Valued {
    fn get_value(&self) -> &Value;
    fn set_value(&mut self, value: Value);

    /// Whether the driver may `set` this value directly.
    fn accepts_input(&self) -> bool {
        true
    }
}

pub trait Clickable {
    /// Validators that disable the component when any of them passes.
    fn disabling_validators(&self) -> &[String] {
        &[]
    }

    fn press(
        &mut self,
        destination: Option<&str>,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Vec<ComponentEvent>, PathError>;
}

pub trait Displayable {
    fn render(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Value, PathError>;
}

#[derive(Debug, Clone)]
pub enum Widget {
    Input(Input),
    Selection(Selection),
    Toggle(Toggle),
    Button(Button),
    Textbox(Textbox),
    MessageBox(MessageBox),
    Image(Image),
    DisplayData(DisplayData),
}

/// One component placed on a screen.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    kind: &'static str,
    destination_path: Option<String>,
    preconditions: Vec<String>,
    validators: Vec<String>,
    errors: Vec<String>,
    widget: Widget,
}

impl Component {
    /// Builds a component from its declaration and the row entry that places it.
    pub fn from_definition(definition: &ComponentDefinition, entry: &RowEntry) -> Self {
        let widget = match &definition.kind {
            ComponentKind::Input {
                label,
                obscure,
                component_type,
            } => Widget::Input(Input {
                label: label.clone(),
                obscure: *obscure,
                input_type: component_type.clone().unwrap_or_else(|| "text".to_string()),
                value: Value::Null,
            }),
            ComponentKind::DateTime { label } => Widget::Input(Input {
                label: label.clone(),
                obscure: false,
                input_type: "datetime".to_string(),
                value: Value::Null,
            }),
            ComponentKind::Textbox { text } => Widget::Textbox(Textbox { text: text.clone() }),
            ComponentKind::Selection {
                label,
                is_required,
                options_values,
                options_key,
            } => Widget::Selection(Selection {
                label: label.clone(),
                is_required: *is_required,
                options_values: options_values.clone(),
                options_key: options_key.clone(),
                value: Value::Null,
            }),
            ComponentKind::Toggle {
                label,
                style,
                value,
            } => Widget::Toggle(Toggle {
                label: label.clone(),
                style: style.clone(),
                value: if value.is_null() {
                    Value::Bool(false)
                } else {
                    value.clone()
                },
            }),
            ComponentKind::Button {
                action,
                style,
                text,
                value,
                disabling_validators,
            } => Widget::Button(Button {
                action: action.clone(),
                style: style.clone(),
                text: text.clone(),
                value: value.clone(),
                disabling_validators: disabling_validators.clone(),
                pressed: Value::Null,
            }),
            ComponentKind::MessageBox { message, size } => Widget::MessageBox(MessageBox {
                template: message.template.clone(),
                message_type: message.kind.clone(),
                size: size.clone(),
            }),
            ComponentKind::Image { url } => Widget::Image(Image { url: url.clone() }),
            ComponentKind::DisplayData {
                display_type,
                title,
                subtitle,
                data,
            } => Widget::DisplayData(DisplayData {
                display_type: display_type.clone(),
                title: title.clone(),
                subtitle: subtitle.clone(),
                data: data.clone(),
            }),
        };

        Component {
            name: entry.name.clone(),
            kind: definition.kind.type_name(),
            destination_path: entry
                .destination_path
                .clone()
                .or_else(|| definition.destination_path.clone()),
            preconditions: entry
                .preconditions
                .clone()
                .unwrap_or_else(|| definition.preconditions.clone()),
            validators: definition.validator.clone(),
            errors: Vec::new(),
            widget,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn destination_path(&self) -> Option<&str> {
        self.destination_path.as_deref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn is_button(&self) -> bool {
        matches!(self.widget, Widget::Button(_))
    }

    fn as_valued(&self) -> Option<&dyn Valued> {
        match &self.widget {
            Widget::Input(c) => Some(c),
            Widget::Selection(c) => Some(c),
            Widget::Toggle(c) => Some(c),
            Widget::Button(c) => Some(c),
            _ => None,
        }
    }

    fn as_valued_mut(&mut self) -> Option<&mut dyn Valued> {
        match &mut self.widget {
            Widget::Input(c) => Some(c),
            Widget::Selection(c) => Some(c),
            Widget::Toggle(c) => Some(c),
            Widget::Button(c) => Some(c),
            _ => None,
        }
    }

    fn as_clickable(&self) -> Option<&dyn Clickable> {
        match &self.widget {
            Widget::Toggle(c) => Some(c),
            Widget::Button(c) => Some(c),
            _ => None,
        }
    }

    fn as_clickable_mut(&mut self) -> Option<&mut dyn Clickable> {
        match &mut self.widget {
            Widget::Toggle(c) => Some(c),
            Widget::Button(c) => Some(c),
            _ => None,
        }
    }

    fn as_displayable(&self) -> &dyn Displayable {
        match &self.widget {
            Widget::Input(c) => c,
            Widget::Selection(c) => c,
            Widget::Toggle(c) => c,
            Widget::Button(c) => c,
            Widget::Textbox(c) => c,
            Widget::MessageBox(c) => c,
            Widget::Image(c) => c,
            Widget::DisplayData(c) => c,
        }
    }

    /// The current value, or `None` for display-only components.
    pub fn value(&self) -> Option<&Value> {
        self.as_valued().map(|v| v.get_value())
    }

    pub fn set_value(&mut self, value: Value) -> Result<(), TaskError> {
        match self.as_valued_mut() {
            Some(valued) if valued.accepts_input() => {
                valued.set_value(value);
                Ok(())
            }
            _ => Err(TaskError::NotValueComponent(self.name.clone())),
        }
    }

    /// Whether every precondition passes against the current state.
    pub fn show(&self, checker: &Checker) -> Result<bool, TaskError> {
        checker.all_pass(&self.preconditions, self.value())
    }

    /// Whether any disabling validator passes. Non-clickable components are never disabled.
    pub fn disabled(&self, checker: &Checker) -> Result<bool, TaskError> {
        match self.as_clickable() {
            Some(clickable) => checker.any_pass(clickable.disabling_validators(), self.value()),
            None => Ok(false),
        }
    }

    /// Re-runs the field validators and stores their failure messages.
    ///
    /// Returns `true` when the value is valid.
    pub fn validate(&mut self, checker: &Checker) -> Result<bool, TaskError> {
        self.errors = checker.failures(&self.validators, self.value())?;
        Ok(self.errors.is_empty())
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn click(
        &mut self,
        checker: &Checker,
        evaluator: &dyn PathEvaluator,
    ) -> Result<Vec<ComponentEvent>, TaskError> {
        if self.as_clickable().is_none() {
            return Err(TaskError::NotClickable(self.name.clone()));
        }
        if self.disabled(checker)? {
            return Err(TaskError::ActionOnDisabledComponent {
                component: self.name.clone(),
            });
        }
        let destination = self.destination_path.clone();
        let name = self.name.clone();
        let clickable = self
            .as_clickable_mut()
            .ok_or(TaskError::NotClickable(name))?;
        Ok(clickable.press(destination.as_deref(), evaluator)?)
    }

    pub fn render(&self, state: &StateTree, evaluator: &dyn PathEvaluator) -> Result<Value, PathError> {
        self.as_displayable().render(state, evaluator)
    }
}

/// What the driver sees of one shown component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentView {
    pub name: String,
    pub kind: &'static str,
    pub value: Option<Value>,
    pub disabled: bool,
    pub errors: Vec<String>,
    pub display: Value,
}
