//! Error types for console interception.

use logtap_protocol::Method;
use logtap_stringify::StringifyError;

/// Errors produced when patching a console slot.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("console has no `{0}` method")]
    MissingMethod(Method),
}

/// Errors produced while turning an error value into frames.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("error value has no captured stack")]
    NoStack,

    #[error("malformed stack: {0}")]
    Malformed(String),
}

/// Failures inside a patched console method. Never escape the wrapper.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("stringify failed: {0}")]
    Stringify(#[from] StringifyError),

    #[error("trace capture failed: {0}")]
    Trace(#[from] TraceError),

    #[error("panicked: {0}")]
    Panicked(String),
}

/// Errors produced while loading a recording configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
