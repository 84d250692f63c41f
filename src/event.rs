//! Outbound notifications from a session to its hosting driver.

use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Load the document at `url` and start over.
    Redirect { url: String },
    /// A screen of `flow` was recorded as a back-navigation point.
    SaveHistory { flow: String, task: String },
    /// A fire-and-forget remote call the transport should perform.
    RemoteCall { endpoint: String, payload: Value },
    /// An `event` task ran with an action the engine does not interpret.
    Marker { task: String, action: String },
    /// A back request from `task`; `handled` is false when no flow could take it.
    Back { task: String, handled: bool },
}

/// Receives events raised by a session.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// A drainable FIFO of events. The default sink.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued event, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for EventQueue {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(event);
    }
}
