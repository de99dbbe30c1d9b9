//! Error types for value stringification.

/// Errors produced while rendering a value as text.
///
/// Input shape (size, depth, cycles) never fails; only user-supplied
/// textual conversions can.
#[derive(Debug, thiserror::Error)]
pub enum StringifyError {
    #[error("textual conversion failed: {0}")]
    Conversion(String),

    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),
}
