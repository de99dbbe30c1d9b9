//! Console interception with bounded, rate-limited recording.
//!
//! A [`Console`] holds replaceable logging methods. [`install`] wraps the
//! selected methods so every call is also delivered to a callback as a
//! [`LogRecord`](logtap_protocol::LogRecord): arguments rendered by
//! [`logtap_stringify`], plus the stack of the call site. Uncaught errors
//! reported through [`ErrorEvents`] are recorded as well.

mod config;
mod console;
mod error;
mod events;
mod host;
mod host_console;
mod options;
mod panic;
mod patch;
mod recorder;
mod trace;

pub use config::{LoggerKind, RecordConfig};
pub use console::{Console, LogFn};
pub use error::{ConfigError, PatchError, RecordError, TraceError};
pub use events::{ErrorEvent, ErrorEvents, ListenerId};
pub use host::Host;
pub use host_console::{Sink, Stream, host_console, host_console_with_sink};
pub use options::{LogRecordOptions, LoggerSource};
pub use panic::{PanicForwarder, forward_panics};
pub use patch::{Unpatch, patch};
pub use recorder::{LOGGER_ERROR_PREFIX, RecordFn, Teardown, install, record_console};
pub use trace::{BacktraceFrameParser, FrameParser, TraceAdapter};
