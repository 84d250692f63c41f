//! Tests for the document-loading client and its redirect handling.
mod common;
use common::*;
use journey::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;

const QUICKSTART: &str = "/api/quickstart";

fn quickstart_source() -> StaticSource {
    StaticSource::new().with_document(QUICKSTART, quick_workflow().to_string())
}

/// Answers the first screen of the quick workflow and presses `button` on the second.
fn run_quick_workflow(client: &mut Client<StaticSource>, button: &str) {
    let mut task = client.get_task().unwrap().unwrap();
    assert_eq!(task.name(), "InputMessage");
    task.set("input_Input message here", "hello").unwrap();
    task.click("submit_button").unwrap();

    let mut task = client.get_task().unwrap().unwrap();
    assert_eq!(task.name(), "DisplayMessage");
    task.click(button).unwrap();
}

#[cfg(test)]
mod client_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quick_workflow_saves_and_restarts() {
        let mut client = Client::open(quickstart_source(), QUICKSTART).unwrap();
        run_quick_workflow(&mut client, "save_button");

        let task = client.get_task().unwrap().unwrap();
        assert_eq!(task.name(), "InputMessage");
        assert_eq!(client.url(), QUICKSTART);

        let events = client.take_events();
        assert_eq!(
            events.last(),
            Some(&Event::RemoteCall {
                endpoint: "/api/save".to_string(),
                payload: json!({ "message_to_save": "hello", "token": "RequestToken!" }),
            })
        );
        assert!(!events.iter().any(|e| matches!(e, Event::Redirect { .. })));
        assert!(client.take_events().is_empty());
    }

    #[test]
    fn test_reset_skips_the_save_call() {
        let mut client = Client::open(quickstart_source(), QUICKSTART).unwrap();
        run_quick_workflow(&mut client, "reset_button");

        assert_eq!(client.get_task().unwrap().unwrap().name(), "InputMessage");
        let events = client.take_events();
        assert!(!events.iter().any(|e| matches!(e, Event::RemoteCall { .. })));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_redirect_loads_another_document() {
        let first = document(
            json!({ "main": { "tasks": [{ "type": "redirect", "name": "Leave", "url": "/second" }] } }),
            "main",
        );
        let second = document(json!({ "welcome": { "tasks": [nav_screen("Welcome")] } }), "welcome");
        let source = StaticSource::new()
            .with_document("/first", first.to_string())
            .with_document("/second", second.to_string());

        let mut client = Client::open(source, "/first").unwrap();
        assert_eq!(client.get_task().unwrap().unwrap().name(), "Welcome");
        assert_eq!(client.url(), "/second");
        assert!(client.take_events().is_empty());
    }

    #[test]
    fn test_first_redirect_wins_and_nothing_after_it_runs() {
        let first = document(
            json!({ "main": { "tasks": [
                { "type": "redirect", "name": "ToB", "url": "/b" },
                {
                    "type": "jsonrpc",
                    "name": "Charge",
                    "url": "/api/charge",
                    "payload": { "amount": 10 }
                },
                { "type": "redirect", "name": "ToC", "url": "/c" }
            ] } }),
            "main",
        );
        let source = StaticSource::new()
            .with_document("/a", first.to_string())
            .with_document("/b", document(json!({ "main": { "tasks": [nav_screen("B")] } }), "main").to_string())
            .with_document("/c", document(json!({ "main": { "tasks": [nav_screen("C")] } }), "main").to_string());

        let mut client = Client::open(source, "/a").unwrap();
        assert_eq!(client.get_task().unwrap().unwrap().name(), "B");
        assert_eq!(client.url(), "/b");
        assert!(client.take_events().is_empty());
    }

    #[test]
    fn test_breakpoints_survive_a_redirect() {
        let first = document(
            json!({ "main": { "tasks": [{ "type": "redirect", "name": "Leave", "url": "/second" }] } }),
            "main",
        );
        let second = document(
            json!({ "main": { "tasks": [
                {
                    "type": "update",
                    "name": "Prepare",
                    "instructions": [{ "value": true, "result_key": "$.ready" }]
                },
                nav_screen("Welcome")
            ] } }),
            "main",
        );
        let mut source = StaticSource::new();
        source.insert("/first", first.to_string());
        source.insert("/second", second.to_string());

        let mut client = Client::open(source, "/first").unwrap();
        client.set_task_breakpoint("Prepare");

        let task = client.get_task().unwrap().unwrap();
        assert_eq!(task.name(), "Prepare");
        assert_eq!(task.kind(), TaskKind::Update);
        assert_eq!(client.session().config().breakpoints, vec!["Prepare".to_string()]);

        assert_eq!(client.get_task().unwrap().unwrap().name(), "Welcome");
        assert_eq!(client.session().state()["ready"], json!(true));
    }

    #[test]
    fn test_unknown_url_and_bad_text_fail_to_open() {
        match Client::open(StaticSource::new(), "/missing") {
            Err(ClientError::Source { url, .. }) => assert_eq!(url, "/missing"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opening an unknown url should fail"),
        }

        let source = StaticSource::new().with_document("/broken", "{ not json");
        assert!(matches!(
            Client::open(source, "/broken").err(),
            Some(ClientError::Engine(EngineError::Document(
                DocumentError::InvalidDocument(_)
            )))
        ));
    }

    #[test]
    fn test_directory_source_resolves_urls_to_files() {
        let root = std::env::temp_dir().join(format!("journey-docs-{}", std::process::id()));
        fs::create_dir_all(root.join("api")).unwrap();
        fs::write(root.join("api").join("quickstart.json"), quick_workflow().to_string()).unwrap();

        let source = DirectorySource::new(&root);
        assert!(source.fetch(QUICKSTART).is_ok());
        assert!(source.fetch("api/quickstart.json").is_ok());
        assert!(matches!(
            source.fetch("/api/absent"),
            Err(ClientError::Source { .. })
        ));

        let mut client = Client::open(DirectorySource::new(&root), QUICKSTART).unwrap();
        assert_eq!(client.get_task().unwrap().unwrap().name(), "InputMessage");

        fs::remove_dir_all(&root).unwrap();
    }
}
