use ahash::AHashMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// The complete, typed workflow document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub components: AHashMap<String, ComponentDefinition>,
    #[serde(default)]
    pub validators: AHashMap<String, ValidatorDefinition>,
    pub flows: AHashMap<String, FlowDefinition>,
    pub starting_flow: String,
    #[serde(default = "crate::state::empty")]
    pub context: Value,
    /// Integrity hash supplied by the document server. Never verified here.
    #[serde(default)]
    pub hash: Option<String>,
}

/// A reusable component declared once and placed on screens by name.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDefinition {
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default, alias = "validators")]
    pub validator: Vec<String>,
    #[serde(default)]
    pub destination_path: Option<String>,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDefinition {
    #[serde(default)]
    pub template: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

fn default_button_value() -> Value {
    Value::Bool(true)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Input {
        #[serde(default)]
        label: String,
        #[serde(default)]
        obscure: bool,
        #[serde(default)]
        component_type: Option<String>,
    },
    #[serde(rename = "datetime")]
    DateTime {
        #[serde(default)]
        label: String,
    },
    Textbox {
        #[serde(default)]
        text: String,
    },
    Selection {
        #[serde(default)]
        label: String,
        #[serde(default)]
        is_required: bool,
        #[serde(default)]
        options_values: Vec<Value>,
        /// Path to a list of options in the state, used when no literal options are given.
        #[serde(default)]
        options_key: Option<String>,
    },
    Toggle {
        #[serde(default)]
        label: String,
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        value: Value,
    },
    Button {
        action: String,
        #[serde(default)]
        style: Option<String>,
        #[serde(default)]
        text: String,
        #[serde(default = "default_button_value")]
        value: Value,
        #[serde(default)]
        disabling_validators: Vec<String>,
    },
    MessageBox {
        message: MessageDefinition,
        #[serde(default)]
        size: Option<String>,
    },
    Image {
        url: String,
    },
    #[serde(rename = "displaydata")]
    DisplayData {
        display_type: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        subtitle: Option<String>,
        /// Path to the displayed data in the state.
        data: String,
    },
}

impl ComponentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentKind::Input { .. } => "input",
            ComponentKind::DateTime { .. } => "datetime",
            ComponentKind::Textbox { .. } => "textbox",
            ComponentKind::Selection { .. } => "selection",
            ComponentKind::Toggle { .. } => "toggle",
            ComponentKind::Button { .. } => "button",
            ComponentKind::MessageBox { .. } => "message_box",
            ComponentKind::Image { .. } => "image",
            ComponentKind::DisplayData { .. } => "displaydata",
        }
    }
}

/// The rule a validator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    IsLength,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Matches,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorDefinition {
    #[serde(rename = "type")]
    pub rule: Rule,
    #[serde(default)]
    pub message: MessageDefinition,
    /// The rule outcome that counts as a pass.
    #[serde(default = "default_true")]
    pub valid_when: bool,
    #[serde(default, alias = "value_key")]
    pub value_path: Option<String>,
    #[serde(default)]
    pub validator_key: Option<String>,
    #[serde(default)]
    pub validator_value: Value,
}

/// A named, ordered list of tasks plus its configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowDefinition {
    pub tasks: Vec<TaskDefinition>,
    #[serde(default)]
    pub config: FlowConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Literal result published by the flow before `result_paths` are applied.
    pub result: Option<Value>,
    pub result_paths: Vec<Instruction>,
    pub destination_path: Option<String>,
    /// Validator names a `while_loop` checks before every pass.
    pub conditions: Vec<String>,
    /// Path (in the enclosing state) to the list a `for_loop` iterates.
    pub iterable_path: Option<String>,
}

impl FlowConfig {
    /// Returns this config with every setting present in `inline` taking precedence.
    pub fn overlaid(&self, inline: &FlowConfig) -> FlowConfig {
        FlowConfig {
            result: inline.result.clone().or_else(|| self.result.clone()),
            result_paths: if inline.result_paths.is_empty() {
                self.result_paths.clone()
            } else {
                inline.result_paths.clone()
            },
            destination_path: inline
                .destination_path
                .clone()
                .or_else(|| self.destination_path.clone()),
            conditions: if inline.conditions.is_empty() {
                self.conditions.clone()
            } else {
                inline.conditions.clone()
            },
            iterable_path: inline
                .iterable_path
                .clone()
                .or_else(|| self.iterable_path.clone()),
        }
    }
}

/// One declared task inside a flow. Unknown `type` tags fail deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskDefinition {
    Screen(ScreenDefinition),
    Jsonrpc(JsonRpcDefinition),
    Flow(FlowReference),
    WhileLoop(FlowReference),
    ForLoop(FlowReference),
    Update(UpdateDefinition),
    Redirect(RedirectDefinition),
    Event(EventDefinition),
}

impl TaskDefinition {
    pub fn name(&self) -> &str {
        match self {
            TaskDefinition::Screen(t) => &t.name,
            TaskDefinition::Jsonrpc(t) => &t.name,
            TaskDefinition::Flow(t) | TaskDefinition::WhileLoop(t) | TaskDefinition::ForLoop(t) => {
                &t.name
            }
            TaskDefinition::Update(t) => &t.name,
            TaskDefinition::Redirect(t) => &t.name,
            TaskDefinition::Event(t) => &t.name,
        }
    }

    pub fn preconditions(&self) -> &[String] {
        match self {
            TaskDefinition::Screen(t) => &t.preconditions,
            TaskDefinition::Jsonrpc(t) => &t.preconditions,
            TaskDefinition::Flow(t) | TaskDefinition::WhileLoop(t) | TaskDefinition::ForLoop(t) => {
                &t.preconditions
            }
            TaskDefinition::Update(t) => &t.preconditions,
            TaskDefinition::Redirect(t) => &t.preconditions,
            TaskDefinition::Event(t) => &t.preconditions,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TaskDefinition::Screen(_) => "screen",
            TaskDefinition::Jsonrpc(_) => "jsonrpc",
            TaskDefinition::Flow(_) => "flow",
            TaskDefinition::WhileLoop(_) => "while_loop",
            TaskDefinition::ForLoop(_) => "for_loop",
            TaskDefinition::Update(_) => "update",
            TaskDefinition::Redirect(_) => "redirect",
            TaskDefinition::Event(_) => "event",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreenDefinition {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Display rows; each entry places a named component.
    pub components: Vec<Vec<RowEntry>>,
}

/// Placement of a component on a screen, with optional per-screen overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct RowEntry {
    pub name: String,
    #[serde(default)]
    pub destination_path: Option<String>,
    #[serde(default)]
    pub preconditions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcDefinition {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default = "crate::state::empty")]
    pub payload: Value,
    #[serde(default)]
    pub payload_paths: Vec<Instruction>,
    #[serde(default)]
    pub destination_path: Option<String>,
}

/// A task entry that runs another flow from the document by name.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowReference {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Inline settings overlaid on the referenced flow's own config.
    #[serde(default)]
    pub config: Option<FlowConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDefinition {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(alias = "tasks")]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectDefinition {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    pub action: String,
}

/// Where an instruction takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionSource {
    Value(Value),
    Key(String),
    Template(String),
}

/// Computes one value and places it at `result_key`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Instruction {
    pub source: InstructionSource,
    pub result_key: String,
}

impl TryFrom<Map<String, Value>> for Instruction {
    type Error = String;

    fn try_from(mut raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let result_key = match raw.remove("result_key") {
            Some(Value::String(key)) => key,
            _ => return Err("instruction is missing a string 'result_key'".to_string()),
        };
        let source = if let Some(value) = raw.remove("value") {
            InstructionSource::Value(value)
        } else if let Some(Value::String(key)) = raw.remove("key") {
            InstructionSource::Key(key)
        } else if let Some(Value::String(template)) = raw.remove("template") {
            InstructionSource::Template(template)
        } else {
            return Err(format!(
                "instruction for '{}' needs one of 'value', 'key' or 'template'",
                result_key
            ));
        };
        Ok(Instruction { source, result_key })
    }
}
