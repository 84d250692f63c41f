//! Tests for driving a session: ordering, remote calls, updates, events and breakpoints.
mod common;
use common::*;
use journey::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[cfg(test)]
mod ordering_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_flows_run_depth_first() {
        let mut session = start(document(
            json!({
                "main": { "tasks": [
                    nav_screen("A"),
                    { "type": "flow", "name": "sub" },
                    nav_screen("D")
                ] },
                "sub": { "tasks": [nav_screen("B"), nav_screen("C")] }
            }),
            "main",
        ));

        assert_eq!(session.depth(), 1);
        assert_eq!(click_next(&mut session, "next"), "A");

        assert_eq!(next_name(&mut session).as_deref(), Some("B"));
        assert_eq!(session.depth(), 2);
        assert_eq!(click_next(&mut session, "next"), "B");
        assert_eq!(click_next(&mut session, "next"), "C");

        assert_eq!(next_name(&mut session).as_deref(), Some("D"));
        assert_eq!(session.depth(), 1);
        assert_eq!(click_next(&mut session, "next"), "D");

        assert_eq!(next_name(&mut session), None);
        assert!(session.is_finished());
    }

    #[test]
    fn test_get_task_repeats_an_unanswered_screen() {
        let mut session = start(document(
            json!({ "main": { "tasks": [nav_screen("A")] } }),
            "main",
        ));
        let first = session.get_task().unwrap().unwrap().id();
        let second = session.get_task().unwrap().unwrap().id();
        assert_eq!(first, second);

        let mut task = session.pending(first).unwrap();
        task.click("next").unwrap();
        assert_eq!(next_name(&mut session), None);
    }

    #[test]
    fn test_finished_session_stays_finished() {
        let mut session = start(document(json!({ "main": { "tasks": [] } }), "main"));
        assert_eq!(next_name(&mut session), None);
        assert_eq!(next_name(&mut session), None);
        assert!(session.is_finished());
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_screen_values_reach_later_screens() {
        let mut session = start(document(
            json!({ "main": { "tasks": [
                screen("Ask", &["name", "submit"]),
                screen("Greet", &["greeting", "next"])
            ] } }),
            "main",
        ));

        let mut task = session.get_task().unwrap().unwrap();
        task.set("name", "Ada").unwrap();
        task.click("submit").unwrap();

        let task = session.get_task().unwrap().unwrap();
        assert_eq!(task.name(), "Greet");
        assert_eq!(task.get_components().unwrap()[0].display["text"], json!("Hello Ada"));
    }

    #[test]
    fn test_failed_preconditions_skip_the_task() {
        let mut doc = document(
            json!({ "main": { "tasks": [
                {
                    "type": "screen",
                    "name": "AdminOnly",
                    "preconditions": ["is_admin"],
                    "components": [[{ "name": "next" }]]
                },
                nav_screen("Everyone")
            ] } }),
            "main",
        );
        doc["validators"]["is_admin"] = json!({
            "type": "equals",
            "value_path": "$.role",
            "validator_value": "admin"
        });
        let mut session = start(doc);
        assert_eq!(next_name(&mut session).as_deref(), Some("Everyone"));
    }
}

#[cfg(test)]
mod remote_call_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fire_and_forget_call_is_never_yielded() {
        let mut session = start(document_with_context(
            json!({ "main": { "tasks": [
                {
                    "type": "jsonrpc",
                    "name": "Save",
                    "url": "/api/save",
                    "payload": { "message_to_save": null, "token": "RequestToken!" },
                    "payload_paths": [{ "key": "$.message", "result_key": "$.message_to_save" }]
                },
                nav_screen("Done")
            ] } }),
            "main",
            json!({ "message": "hi" }),
        ));

        assert_eq!(next_name(&mut session).as_deref(), Some("Done"));
        assert_eq!(
            session.take_events(),
            vec![Event::RemoteCall {
                endpoint: "/api/save".to_string(),
                payload: json!({ "message_to_save": "hi", "token": "RequestToken!" }),
            }]
        );
    }

    #[test]
    fn test_call_with_destination_waits_for_its_result() {
        let mut session = start(document_with_context(
            json!({ "main": { "tasks": [
                {
                    "type": "jsonrpc",
                    "name": "Lookup",
                    "url": "/api/users",
                    "payload": { "limit": 10 },
                    "payload_paths": [{ "value": "active", "result_key": "$.filter" }],
                    "destination_path": "$.users"
                },
                nav_screen("Done")
            ] } }),
            "main",
            json!({}),
        ));

        let mut task = session.get_task().unwrap().unwrap();
        assert_eq!(task.kind(), TaskKind::Jsonrpc);
        assert!(task.requires_input());
        assert_eq!(task.get_endpoint().unwrap(), "/api/users");
        assert_eq!(task.get_payload().unwrap(), &json!({ "limit": 10, "filter": "active" }));

        task.set_result(json!(["ada", "bob"])).unwrap();
        assert!(task.is_complete());
        assert_eq!(
            task.set_result(json!(["eve"])),
            Err(EngineError::Task(TaskError::TaskAlreadyComplete("Lookup".to_string())))
        );

        assert_eq!(next_name(&mut session).as_deref(), Some("Done"));
        assert_eq!(session.state()["users"], json!(["ada", "bob"]));
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_wrong_task_kind_for_driver_operation() {
        let mut session = start(document(
            json!({ "main": { "tasks": [nav_screen("A")] } }),
            "main",
        ));
        let mut task = session.get_task().unwrap().unwrap();
        let expected = EngineError::Task(TaskError::WrongTaskKind {
            task: "A".to_string(),
            expected: "jsonrpc",
            found: "screen",
        });
        assert_eq!(task.get_endpoint().unwrap_err(), expected);
        assert_eq!(task.set_result(json!(1)).unwrap_err(), expected);
    }
}

#[cfg(test)]
mod update_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_instructions_are_chained() {
        let mut session = start(document(
            json!({ "main": { "tasks": [
                {
                    "type": "update",
                    "name": "Calc",
                    "instructions": [
                        { "value": 2, "result_key": "$.a" },
                        { "key": "$.a", "result_key": "$.b" },
                        { "template": "{{ $.a }}-{{ $.b }}", "result_key": "$.totals.label" }
                    ]
                },
                nav_screen("Done")
            ] } }),
            "main",
        ));

        assert_eq!(next_name(&mut session).as_deref(), Some("Done"));
        assert_eq!(session.state()["a"], json!(2));
        assert_eq!(session.state()["b"], json!(2));
        assert_eq!(session.state()["totals"], json!({ "label": "2-2" }));
    }

    #[test]
    fn test_failing_update_is_retried_on_next_pull() {
        let mut session = start(document(
            json!({ "main": { "tasks": [{
                "type": "update",
                "name": "Broken",
                "instructions": [{ "key": "$.absent", "result_key": "$.copy" }]
            }] } }),
            "main",
        ));

        let expected = EngineError::Task(TaskError::Path(PathError::MissingPathValue(
            "$.absent".to_string(),
        )));
        assert_eq!(session.get_task().err(), Some(expected.clone()));
        assert_eq!(session.get_task().err(), Some(expected));
        assert!(!session.is_finished());
    }

    #[test]
    fn test_flow_publishes_literal_and_computed_result() {
        let mut doc = document(
            json!({
                "main": { "tasks": [{ "type": "flow", "name": "sub" }] },
                "sub": {
                    "tasks": [{
                        "type": "update",
                        "name": "Inner",
                        "instructions": [{ "value": 5, "result_key": "$.inner" }]
                    }],
                    "config": {
                        "result": { "fixed": true },
                        "result_paths": [{ "key": "$.inner", "result_key": "$.copied" }],
                        "destination_path": "$.sub"
                    }
                }
            }),
            "main",
        );
        doc["flows"]["main"]["config"] = json!({
            "result_paths": [{ "key": "$.sub.copied", "result_key": "$.answer" }]
        });
        let mut session = start(doc);

        assert_eq!(next_name(&mut session), None);
        assert_eq!(session.state()["sub"], json!({ "fixed": true, "copied": 5 }));
        assert!(session.state().get("inner").is_none());
        assert_eq!(session.result(), &json!({ "answer": 5 }));
    }
}

#[cfg(test)]
mod event_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_redirect_emits_one_event_and_stops_the_session() {
        let mut session = start(document(
            json!({ "main": { "tasks": [
                { "type": "redirect", "name": "Go", "url": "/next" },
                {
                    "type": "update",
                    "name": "Touch",
                    "instructions": [{ "value": true, "result_key": "$.touched" }]
                },
                nav_screen("After")
            ] } }),
            "main",
        ));
        assert_eq!(session.redirected_to(), None);
        assert_eq!(next_name(&mut session), None);
        assert_eq!(session.redirected_to(), Some("/next"));
        assert_eq!(
            session.take_events(),
            vec![Event::Redirect { url: "/next".to_string() }]
        );

        assert_eq!(next_name(&mut session), None);
        assert!(session.take_events().is_empty());
        assert!(session.state().get("touched").is_none());
    }

    #[test]
    fn test_event_task_emits_marker() {
        let mut session = start(document(
            json!({ "main": { "tasks": [{ "type": "event", "name": "Party", "action": "celebrate" }] } }),
            "main",
        ));
        assert_eq!(next_name(&mut session), None);
        assert_eq!(
            session.take_events(),
            vec![Event::Marker {
                task: "Party".to_string(),
                action: "celebrate".to_string(),
            }]
        );
    }

    #[test]
    fn test_custom_sink_receives_events() {
        let queue = Arc::new(EventQueue::new());
        let mut session = Session::builder(load(document(
            json!({ "main": { "tasks": [{ "type": "redirect", "name": "Go", "url": "/x" }] } }),
            "main",
        )))
        .with_event_sink(Arc::clone(&queue) as Arc<dyn EventSink>)
        .build()
        .unwrap();

        assert_eq!(next_name(&mut session), None);
        assert!(session.take_events().is_empty());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain(), vec![Event::Redirect { url: "/x".to_string() }]);
    }

    #[test]
    fn test_disabled_history_records_nothing() {
        let config = EngineConfig {
            record_history: false,
            ..EngineConfig::default()
        };
        let mut session = Session::builder(load(document(
            json!({ "main": { "tasks": [nav_screen("A"), nav_screen("B")] } }),
            "main",
        )))
        .with_config(config)
        .build()
        .unwrap();

        click_next(&mut session, "next");
        assert_eq!(next_name(&mut session).as_deref(), Some("B"));
        assert_eq!(session.history_depth(), 0);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_engine_config_defaults_from_json() {
        let config: EngineConfig = serde_json::from_value(json!({ "breakpoints": ["A"] })).unwrap();
        assert_eq!(config.breakpoints, vec!["A".to_string()]);
        assert_eq!(config.max_loop_passes, 10_000);
        assert!(config.record_history);
    }
}

#[cfg(test)]
mod breakpoint_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn calc_document() -> serde_json::Value {
        document(
            json!({ "main": { "tasks": [
                {
                    "type": "update",
                    "name": "Calc",
                    "instructions": [{ "value": 1, "result_key": "$.done" }]
                },
                nav_screen("After")
            ] } }),
            "main",
        )
    }

    #[test]
    fn test_breakpoint_interrupts_once_before_running() {
        let mut session = Session::builder(load(calc_document()))
            .with_breakpoint("Calc")
            .build()
            .unwrap();

        let task = session.get_task().unwrap().unwrap();
        assert_eq!(task.name(), "Calc");
        assert_eq!(task.kind(), TaskKind::Update);
        assert!(!task.requires_input());
        assert!(!task.is_complete());
        assert!(session.state().get("done").is_none());

        assert_eq!(next_name(&mut session).as_deref(), Some("After"));
        assert_eq!(session.state()["done"], json!(1));
    }

    #[test]
    fn test_breakpoint_set_on_running_session() {
        let mut session = start(calc_document());
        session.set_task_breakpoint("Calc");
        assert_eq!(session.config().breakpoints, vec!["Calc".to_string()]);
        assert_eq!(next_name(&mut session).as_deref(), Some("Calc"));
        assert_eq!(next_name(&mut session).as_deref(), Some("After"));
    }

    #[test]
    fn test_breakpoint_on_screen_yields_it_as_usual() {
        let mut session = Session::builder(load(calc_document()))
            .with_breakpoint("After")
            .build()
            .unwrap();
        assert_eq!(next_name(&mut session).as_deref(), Some("After"));
        assert_eq!(next_name(&mut session).as_deref(), Some("After"));
        assert_eq!(click_next(&mut session, "next"), "After");
        assert_eq!(next_name(&mut session), None);
    }
}
