use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Value of the one-time notice emitted when a session hits its threshold.
pub const THRESHOLD_MESSAGE: &str = "The number of log records reached the threshold.";

/// Default number of ordinary records a session emits before going quiet.
pub const DEFAULT_LENGTH_THRESHOLD: u64 = 1000;

/// Default number of own keys traversed before an object is summarized.
pub const DEFAULT_NUM_OF_KEYS_LIMIT: usize = 50;

/// Default nesting depth traversed before a composite is summarized.
pub const DEFAULT_DEPTH_OF_LIMIT: usize = 4;

/// Error returned when a string is not a known logging-surface method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown console method: {0}")]
pub struct UnknownMethod(pub String);

/// Logging-surface method of a console object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    Assert,
    Count,
    CountReset,
    Debug,
    Dir,
    Dirxml,
    Error,
    Group,
    GroupCollapsed,
    GroupEnd,
    Info,
    Log,
    Table,
    Time,
    TimeEnd,
    TimeLog,
    Trace,
    Warn,
}

impl Method {
    /// Every method of the logging surface, in alphabetical order.
    pub const ALL: [Method; 18] = [
        Method::Assert,
        Method::Count,
        Method::CountReset,
        Method::Debug,
        Method::Dir,
        Method::Dirxml,
        Method::Error,
        Method::Group,
        Method::GroupCollapsed,
        Method::GroupEnd,
        Method::Info,
        Method::Log,
        Method::Table,
        Method::Time,
        Method::TimeEnd,
        Method::TimeLog,
        Method::Trace,
        Method::Warn,
    ];

    /// The method's name as it appears on the console object.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Assert => "assert",
            Method::Count => "count",
            Method::CountReset => "countReset",
            Method::Debug => "debug",
            Method::Dir => "dir",
            Method::Dirxml => "dirxml",
            Method::Error => "error",
            Method::Group => "group",
            Method::GroupCollapsed => "groupCollapsed",
            Method::GroupEnd => "groupEnd",
            Method::Info => "info",
            Method::Log => "log",
            Method::Table => "table",
            Method::Time => "time",
            Method::TimeEnd => "timeEnd",
            Method::TimeLog => "timeLog",
            Method::Trace => "trace",
            Method::Warn => "warn",
        }
    }

    /// Whether a host console writes this method to the error stream.
    pub fn is_error_stream(self) -> bool {
        matches!(self, Method::Assert | Method::Error | Method::Warn | Method::Trace)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serialization() {
        assert_eq!(serde_json::to_string(&Method::Log).unwrap(), "\"log\"");
        assert_eq!(
            serde_json::to_string(&Method::CountReset).unwrap(),
            "\"countReset\""
        );
        assert_eq!(
            serde_json::to_string(&Method::GroupCollapsed).unwrap(),
            "\"groupCollapsed\""
        );
        assert_eq!(serde_json::to_string(&Method::Dirxml).unwrap(), "\"dirxml\"");
    }

    #[test]
    fn method_serde_matches_as_str() {
        for method in Method::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
            let parsed: Method = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, method);
        }
    }

    #[test]
    fn method_from_str() {
        assert_eq!("timeLog".parse::<Method>().unwrap(), Method::TimeLog);
        assert_eq!("warn".parse::<Method>().unwrap(), Method::Warn);
        assert_eq!(
            "Warn".parse::<Method>(),
            Err(UnknownMethod("Warn".to_string()))
        );
        assert!("clear".parse::<Method>().is_err());
    }

    #[test]
    fn unknown_method_rejected_by_serde() {
        assert!(serde_json::from_str::<Method>("\"profile\"").is_err());
    }

    #[test]
    fn error_stream_methods() {
        assert!(Method::Error.is_error_stream());
        assert!(Method::Warn.is_error_stream());
        assert!(!Method::Log.is_error_stream());
        assert!(!Method::Table.is_error_stream());
    }

    #[test]
    fn defaults() {
        assert_eq!(DEFAULT_LENGTH_THRESHOLD, 1000);
        assert_eq!(DEFAULT_NUM_OF_KEYS_LIMIT, 50);
        assert_eq!(DEFAULT_DEPTH_OF_LIMIT, 4);
        assert_eq!(Method::ALL.len(), 18);
    }
}
