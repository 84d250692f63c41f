//! A driver that loads documents by URL and follows redirects.

use crate::document::Document;
use crate::engine::{EngineConfig, PendingTask, Session};
use crate::error::ClientError;
use crate::event::{Event, EventQueue};
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Where workflow documents come from.
pub trait DocumentSource {
    /// Returns the raw text of the document at `url`.
    fn fetch(&self, url: &str) -> Result<String, ClientError>;
}

/// Documents held in memory, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: AHashMap<String, String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, text: impl Into<String>) -> Self {
        self.insert(url, text);
        self
    }

    pub fn insert(&mut self, url: &str, text: impl Into<String>) {
        self.documents.insert(url.to_string(), text.into());
    }
}

impl DocumentSource for StaticSource {
    fn fetch(&self, url: &str) -> Result<String, ClientError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ClientError::Source {
                url: url.to_string(),
                message: "no document registered for this url".to_string(),
            })
    }
}

/// Documents stored as files under a directory. A URL without an extension
/// resolves to `<url>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let relative = url.trim_start_matches('/');
        let mut path = self.root.join(relative);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        path
    }
}

impl DocumentSource for DirectorySource {
    fn fetch(&self, url: &str) -> Result<String, ClientError> {
        let path = self.resolve(url);
        std::fs::read_to_string(&path).map_err(|e| ClientError::Source {
            url: url.to_string(),
            message: format!("{}: {}", path.display(), e),
        })
    }
}

/// Runs sessions over documents from a [`DocumentSource`], restarting on
/// every redirect.
pub struct Client<S: DocumentSource> {
    source: S,
    config: EngineConfig,
    url: String,
    queue: Arc<EventQueue>,
    events: Vec<Event>,
    session: Session,
}

impl<S: DocumentSource> Client<S> {
    pub fn open(source: S, url: &str) -> Result<Self, ClientError> {
        Self::with_config(source, url, EngineConfig::default())
    }

    pub fn with_config(source: S, url: &str, config: EngineConfig) -> Result<Self, ClientError> {
        let queue = Arc::new(EventQueue::new());
        let session = start(&source, url, &config, &queue)?;
        Ok(Self {
            source,
            config,
            url: url.to_string(),
            queue,
            events: Vec::new(),
            session,
        })
    }

    /// The next pending task, following any redirect raised on the way.
    ///
    /// Only the first redirect is followed. Events queued after it are dropped.
    pub fn get_task(&mut self) -> Result<Option<PendingTask<'_>>, ClientError> {
        loop {
            let next = self.session.next_pending()?;
            let mut redirect = None;
            for event in self.queue.drain() {
                match event {
                    Event::Redirect { url } => {
                        redirect = Some(url);
                        break;
                    }
                    other => self.events.push(other),
                }
            }
            match redirect {
                Some(url) => self.reload(&url)?,
                None => return Ok(next.map(|id| PendingTask::new(&mut self.session, id))),
            }
        }
    }

    /// Drops the current session and starts over on the document at `url`.
    pub fn reload(&mut self, url: &str) -> Result<(), ClientError> {
        info!(from = %self.url, to = %url, "loading redirected document");
        self.session = start(&self.source, url, &self.config, &self.queue)?;
        self.url = url.to_string();
        Ok(())
    }

    /// Breakpoints set here survive redirects.
    pub fn set_task_breakpoint(&mut self, task_name: &str) {
        if !self.config.breakpoints.iter().any(|b| b == task_name) {
            self.config.breakpoints.push(task_name.to_string());
        }
        self.session.set_task_breakpoint(task_name);
    }

    /// Events other than redirects, oldest first. Clears the buffer.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

fn start<S: DocumentSource>(
    source: &S,
    url: &str,
    config: &EngineConfig,
    queue: &Arc<EventQueue>,
) -> Result<Session, ClientError> {
    let text = source.fetch(url)?;
    let document = Document::from_json(&text)?;
    info!(url = %url, "document loaded");
    Ok(Session::builder(document)
        .with_config(config.clone())
        .with_event_sink(Arc::clone(queue) as _)
        .build()?)
}
