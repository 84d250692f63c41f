//! # Journey - Declarative Workflow Interpreter
//!
//! **Journey** runs multi-step interaction workflows described by a JSON
//! document: reusable screen components, named validators, and flows of tasks
//! (screens, remote calls, loops, state updates, redirects). The engine is
//! driver-agnostic. A driver asks for the next pending task, answers it, and
//! asks again until the workflow finishes.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Document**: Parse JSON with [`Document::from_json`](document::Document::from_json),
//!     or implement [`IntoDocument`](document::IntoDocument) for your own format.
//! 2.  **Start a Session**: Use [`Session::builder`](engine::Session::builder) to set breakpoints,
//!     an event sink, or a custom path evaluator.
//! 3.  **Drive It**: Call `get_task` repeatedly. Screens take `set` and `click`, remote calls take
//!     `set_result`. Everything else runs on its own.
//! 4.  **Handle Events**: Redirects, remote calls and history captures are reported as
//!     [`Event`](event::Event)s. The [`Client`](client::Client) follows redirects for you.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use journey::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let text = std::fs::read_to_string("workflow.json")?;
//!     let document = Document::from_json(&text)?;
//!     let mut session = Session::builder(document).build()?;
//!
//!     while let Some(mut task) = session.get_task()? {
//!         match task.kind() {
//!             TaskKind::Screen => {
//!                 for component in task.get_components()? {
//!                     println!("{} ({})", component.name, component.kind);
//!                 }
//!                 task.set("name", "Ada")?;
//!                 task.click("submit")?;
//!             }
//!             TaskKind::Jsonrpc => {
//!                 println!("calling {}", task.get_endpoint()?);
//!                 task.set_result(serde_json::json!({ "ok": true }))?;
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     println!("final state: {}", session.state());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod component;
pub mod context;
pub mod document;
pub mod engine;
pub mod error;
pub mod event;
pub mod history;
pub mod path;
pub mod prelude;
pub mod stack;
pub mod state;
pub mod task;
pub mod template;
pub mod validator;
