//! Recording options, read once when a session is installed.

use std::sync::Arc;

use logtap_protocol::constants::DEFAULT_LENGTH_THRESHOLD;
use logtap_protocol::{Method, StringifyOptions};

use crate::console::Console;
use crate::host::Host;

/// Which console a session patches.
#[derive(Clone)]
pub enum LoggerSource {
    /// The host's own console.
    Console,
    /// A caller-supplied console implementing some of the methods.
    Custom(Arc<Console>),
}

impl LoggerSource {
    /// Console this source refers to on `host`.
    pub fn resolve(&self, host: &Host) -> Arc<Console> {
        match self {
            LoggerSource::Console => Arc::clone(&host.console),
            LoggerSource::Custom(console) => Arc::clone(console),
        }
    }
}

impl std::fmt::Debug for LoggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerSource::Console => f.write_str("Console"),
            LoggerSource::Custom(console) => f.debug_tuple("Custom").field(console).finish(),
        }
    }
}

/// Options for one interception session.
#[derive(Debug, Clone)]
pub struct LogRecordOptions {
    /// Methods to patch. Duplicates are patched once.
    pub level: Vec<Method>,
    /// Ordinary records emitted before the session goes quiet, counting
    /// calls across every level.
    pub length_threshold: u64,
    pub stringify_options: StringifyOptions,
    /// `None` makes installation a no-op.
    pub logger: Option<LoggerSource>,
}

impl Default for LogRecordOptions {
    fn default() -> Self {
        Self {
            level: Method::ALL.to_vec(),
            length_threshold: DEFAULT_LENGTH_THRESHOLD,
            stringify_options: StringifyOptions::default(),
            logger: Some(LoggerSource::Console),
        }
    }
}
