use super::definition::Document;
use crate::error::DocumentError;
use serde_json::Value;

/// A trait for serialized or custom document representations that can be
/// turned into a typed [`Document`].
///
/// This is the extension point for plugging in another document format: the
/// engine only ever consumes the typed repositories, never the raw text.
///
/// # Example
///
/// ```rust,no_run
/// use journey::document::{Document, IntoDocument};
/// use journey::error::DocumentError;
///
/// struct YamlText(String);
///
/// impl IntoDocument for YamlText {
///     fn into_document(self) -> Result<Document, DocumentError> {
///         // Translate your own format into JSON and reuse the JSON loader.
/// #       let json: serde_json::Value = serde_json::json!({});
///         json.into_document()
///     }
/// }
/// ```
pub trait IntoDocument {
    /// Consumes the value and converts it into a typed document.
    fn into_document(self) -> Result<Document, DocumentError>;
}

impl IntoDocument for Document {
    fn into_document(self) -> Result<Document, DocumentError> {
        Ok(self)
    }
}

impl IntoDocument for &str {
    fn into_document(self) -> Result<Document, DocumentError> {
        serde_json::from_str(self).map_err(|e| DocumentError::InvalidDocument(e.to_string()))
    }
}

impl IntoDocument for String {
    fn into_document(self) -> Result<Document, DocumentError> {
        self.as_str().into_document()
    }
}

impl IntoDocument for Value {
    fn into_document(self) -> Result<Document, DocumentError> {
        serde_json::from_value(self).map_err(|e| DocumentError::InvalidDocument(e.to_string()))
    }
}
