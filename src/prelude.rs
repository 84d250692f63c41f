//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the journey crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use journey::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let source = DirectorySource::new("documents");
//! let mut client = Client::open(source, "start")?;
//! while let Some(task) = client.get_task()? {
//!     println!("pending: {} ({})", task.name(), task.kind());
//!     break;
//! }
//! # Ok(())
//! # }
//! ```

// Documents and sessions
pub use crate::client::{Client, DirectorySource, DocumentSource, StaticSource};
pub use crate::document::{Document, IntoDocument};
pub use crate::engine::{EngineConfig, PendingTask, Session, SessionBuilder};

// Driver-facing types
pub use crate::component::ComponentView;
pub use crate::event::{Event, EventQueue, EventSink};
pub use crate::path::{JsonPath, PathEvaluator};
pub use crate::state::StateTree;
pub use crate::task::{TaskId, TaskKind};

// Error types
pub use crate::error::{ClientError, DocumentError, EngineError, PathError, TaskError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
