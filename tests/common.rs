//! Common test utilities for building workflow documents and sessions.
use journey::prelude::*;
use serde_json::{Value, json};

/// Buttons, a required `name` field and a templated greeting, shared by most fixtures.
#[allow(dead_code)]
pub fn base_components() -> Value {
    json!({
        "next": { "type": "button", "action": "next", "text": "Next" },
        "back": { "type": "button", "action": "back", "text": "Back" },
        "submit": { "type": "button", "action": "submit", "text": "Submit", "style": "primary" },
        "name": {
            "type": "input",
            "label": "Name",
            "validator": ["required"],
            "destination_path": "$.name"
        },
        "greeting": {
            "type": "message_box",
            "message": { "type": "info", "template": "Hello {{ $.name }}" }
        }
    })
}

#[allow(dead_code)]
pub fn base_validators() -> Value {
    json!({
        "required": {
            "type": "isLength",
            "message": { "type": "error", "template": "Field can not be empty" },
            "validator_value": 1
        }
    })
}

/// A full document over the shared components and validators.
#[allow(dead_code)]
pub fn document(flows: Value, starting_flow: &str) -> Value {
    document_with_context(flows, starting_flow, json!({}))
}

#[allow(dead_code)]
pub fn document_with_context(flows: Value, starting_flow: &str, context: Value) -> Value {
    json!({
        "components": base_components(),
        "validators": base_validators(),
        "flows": flows,
        "starting_flow": starting_flow,
        "context": context
    })
}

/// A screen with one component per row.
#[allow(dead_code)]
pub fn screen(name: &str, components: &[&str]) -> Value {
    let rows: Vec<Value> = components.iter().map(|c| json!([{ "name": c }])).collect();
    json!({ "type": "screen", "name": name, "components": rows })
}

/// A screen with `next` and `back` buttons.
#[allow(dead_code)]
pub fn nav_screen(name: &str) -> Value {
    screen(name, &["next", "back"])
}

#[allow(dead_code)]
pub fn load(document: Value) -> Document {
    Document::load(document).expect("document should load")
}

#[allow(dead_code)]
pub fn start(document: Value) -> Session {
    Session::new(load(document)).expect("session should start")
}

/// Name of the next pending task, or `None` when the session is done.
#[allow(dead_code)]
pub fn next_name(session: &mut Session) -> Option<String> {
    session
        .get_task()
        .expect("get_task should succeed")
        .map(|task| task.name().to_string())
}

/// Clicks `button` on the next pending task and returns that task's name.
#[allow(dead_code)]
pub fn click_next(session: &mut Session, button: &str) -> String {
    let mut task = session
        .get_task()
        .expect("get_task should succeed")
        .expect("a task should be pending");
    task.click(button).expect("click should succeed");
    task.name().to_string()
}

/// The two-screen workflow used by the interactive quick-start demo.
#[allow(dead_code)]
pub fn quick_workflow() -> Value {
    json!({
        "validators": {
            "not_zero_length": {
                "type": "isLength",
                "message": { "type": "error", "template": "Field can not be empty" },
                "valid_when": true,
                "validator_value": 1
            },
            "should_save_message": {
                "type": "equals",
                "message": { "type": "error", "template": "Error: equals to values" },
                "valid_when": true,
                "value_key": "$.save",
                "validator_value": true
            }
        },
        "components": {
            "input_Input message here": {
                "type": "input",
                "label": "Input message here",
                "validator": ["not_zero_length"]
            },
            "submit_button": {
                "type": "button",
                "action": "submit",
                "style": "primary",
                "text": "Submit"
            },
            "HelloWorldMessage": {
                "type": "message_box",
                "message": { "template": "{{$.message}}", "type": "info" },
                "size": null
            },
            "back_button": {
                "type": "button",
                "action": "back",
                "style": "primary",
                "text": "Back"
            },
            "reset_button": {
                "type": "button",
                "action": "next",
                "style": "primary",
                "text": "Reset",
                "value": false
            },
            "save_button": {
                "type": "button",
                "action": "next",
                "style": "primary",
                "text": "Save Message",
                "value": true
            }
        },
        "flows": {
            "QuickWorkflow": {
                "tasks": [
                    {
                        "type": "screen",
                        "name": "InputMessage",
                        "components": [
                            [{ "name": "input_Input message here", "destination_path": "$.message" }],
                            [{ "name": "submit_button" }]
                        ]
                    },
                    {
                        "type": "screen",
                        "name": "DisplayMessage",
                        "components": [
                            [{ "name": "HelloWorldMessage" }],
                            [{ "name": "reset_button", "destination_path": "$.save" }],
                            [{ "name": "back_button" }],
                            [{ "name": "save_button", "destination_path": "$.save" }]
                        ]
                    },
                    {
                        "type": "jsonrpc",
                        "name": "SaveMessage",
                        "preconditions": ["should_save_message"],
                        "url": "/api/save",
                        "method": null,
                        "payload_paths": [
                            { "key": "$.message", "result_key": "$.message_to_save" }
                        ],
                        "payload": { "message_to_save": null, "token": "RequestToken!" }
                    },
                    {
                        "type": "redirect",
                        "name": "Restart",
                        "url": "/api/quickstart"
                    }
                ],
                "config": {}
            }
        },
        "starting_flow": "QuickWorkflow",
        "hash": "ee6c8685802a96d12ea474d97ad26c252fb3739be2e8a0c2fcfd2a9f8beb9eff",
        "context": {}
    })
}
