use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DEPTH_OF_LIMIT, DEFAULT_NUM_OF_KEYS_LIMIT, Method, THRESHOLD_MESSAGE, UnknownMethod,
};

/// Kind of a recorded entry, serialized as the record's `type` field.
///
/// Ordinary records carry the console method that produced them. `Error`
/// comes from the uncaught-error listener and `Warn` is the one-time notice
/// that a session reached its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RecordKind {
    Level(Method),
    Error,
    Warn,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Level(method) => method.as_str(),
            RecordKind::Error => "Error",
            RecordKind::Warn => "Warn",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RecordKind> for String {
    fn from(kind: RecordKind) -> Self {
        kind.as_str().to_string()
    }
}

impl TryFrom<String> for RecordKind {
    type Error = UnknownMethod;

    fn try_from(value: String) -> Result<Self, UnknownMethod> {
        match value.as_str() {
            "Error" => Ok(RecordKind::Error),
            "Warn" => Ok(RecordKind::Warn),
            other => other.parse().map(RecordKind::Level),
        }
    }
}

impl From<Method> for RecordKind {
    fn from(method: Method) -> Self {
        RecordKind::Level(method)
    }
}

/// One call-stack entry of a captured trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

impl fmt::Display for StackFrame {
    /// Renders as `function (file:line:column)`, eliding missing parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut location = self.file_name.clone().unwrap_or_default();
        if let Some(line) = self.line_number {
            location.push_str(&format!(":{line}"));
            if let Some(column) = self.column_number {
                location.push_str(&format!(":{column}"));
            }
        }

        match (&self.function_name, location.is_empty()) {
            (Some(name), false) => write!(f, "{name} ({location})"),
            (Some(name), true) => f.write_str(name),
            (None, _) => f.write_str(&location),
        }
    }
}

/// A single recorded console invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub value: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<StackFrame>>,
}

impl LogRecord {
    /// Creates a record stamped with the current wall-clock time.
    pub fn new(kind: RecordKind, value: Vec<String>, trace: Option<Vec<StackFrame>>) -> Self {
        Self {
            kind,
            time: now_millis(),
            value,
            trace,
        }
    }

    /// The notice emitted once a session's record count reaches its threshold.
    pub fn threshold_notice() -> Self {
        Self::new(RecordKind::Warn, vec![THRESHOLD_MESSAGE.to_string()], None)
    }
}

/// Limits applied when rendering a logged value as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringifyOptions {
    /// Maximum characters per produced string. `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_length_limit: Option<usize>,
    #[serde(default = "default_num_of_keys_limit")]
    pub num_of_keys_limit: usize,
    #[serde(default = "default_depth_of_limit")]
    pub depth_of_limit: usize,
}

fn default_num_of_keys_limit() -> usize {
    DEFAULT_NUM_OF_KEYS_LIMIT
}

fn default_depth_of_limit() -> usize {
    DEFAULT_DEPTH_OF_LIMIT
}

impl Default for StringifyOptions {
    fn default() -> Self {
        Self {
            string_length_limit: None,
            num_of_keys_limit: default_num_of_keys_limit(),
            depth_of_limit: default_depth_of_limit(),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
