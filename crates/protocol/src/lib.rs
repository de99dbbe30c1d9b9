//! Wire types for recorded console output.
//!
//! Every record produced by an interception session serializes to the JSON
//! shape defined here, so consumers (replayers, transports) only depend on
//! this crate.

pub mod console_log;
pub mod constants;

// Re-export primary types for convenience.
pub use console_log::{LogRecord, RecordKind, StackFrame, StringifyOptions};
pub use constants::{Method, UnknownMethod};
