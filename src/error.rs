use crate::task::TaskId;
use thiserror::Error;

/// Errors raised by the persistent stack primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("Cannot read or pop the head of an empty stack")]
    EmptyStack,
}

/// Errors raised while reading or writing a state tree through a path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path expression '{path}': {message}")]
    InvalidExpression { path: String, message: String },

    #[error("Path '{0}' did not match any value in the state tree")]
    MissingPathValue(String),

    #[error("No mutation strategy for path '{path}': {reason}")]
    UnsupportedPathMutation { path: String, reason: String },
}

/// Errors that can occur while loading a workflow document.
///
/// Every variant is fatal for the load attempt that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Invalid workflow document: {0}")]
    InvalidDocument(String),

    #[error("{kind} '{name}' referenced by '{referenced_by}' is not defined in the document")]
    MissingReference {
        kind: &'static str,
        name: String,
        referenced_by: String,
    },

    #[error("The initial document context must be a JSON object, found {0}")]
    InvalidContext(String),
}

/// Errors raised by a single task while it is constructed, evaluated or driven.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Component '{component}' is disabled and cannot be clicked")]
    ActionOnDisabledComponent { component: String },

    #[error("Component '{component}' is not shown on screen '{task}'")]
    UnknownComponent { task: String, component: String },

    #[error("Component '{0}' does not hold a value")]
    NotValueComponent(String),

    #[error("Component '{0}' cannot be clicked")]
    NotClickable(String),

    #[error("Task '{0}' is already complete and accepts no more input")]
    TaskAlreadyComplete(String),

    #[error("Task '{task}' is a {found} task, expected {expected}")]
    WrongTaskKind {
        task: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Value at '{path}' used by loop '{flow}' is not a list")]
    NotIterable { flow: String, path: String },

    #[error("Loop '{flow}' exceeded the limit of {limit} passes")]
    LoopLimitExceeded { flow: String, limit: usize },

    #[error("Validator '{0}' is not defined")]
    UnknownValidator(String),

    #[error("Validator '{validator}' cannot be applied: {message}")]
    InvalidRule { validator: String, message: String },

    #[error("Flow '{0}' is not defined")]
    UnknownFlow(String),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors surfaced to the driver by a running session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Task {0} does not belong to this session")]
    UnknownTask(TaskId),
}

impl From<PathError> for EngineError {
    fn from(err: PathError) -> Self {
        EngineError::Task(TaskError::Path(err))
    }
}

/// Errors raised by the document-loading driver client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Could not fetch document '{url}': {message}")]
    Source { url: String, message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<DocumentError> for ClientError {
    fn from(err: DocumentError) -> Self {
        ClientError::Engine(EngineError::Document(err))
    }
}
