//! Dynamically typed values passed to console methods.
//!
//! Arrays and objects are shared by reference: cloning a [`Value`] clones the
//! `Arc`, so two values can point at the same composite and a composite can
//! contain itself. Self-referential graphs leak when dropped; they are meant
//! for short-lived logging arguments.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Custom textual conversion attached to an object. May fail.
pub type TextConversion = Arc<dyn Fn() -> Result<String, String> + Send + Sync>;

/// A logged argument.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    /// A callable, known only by its name.
    Function(String),
    Array(Arc<ArrayValue>),
    Object(Arc<ObjectValue>),
    Error(Arc<ErrorValue>),
}

impl Value {
    /// Builds an array value from the given items.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(ArrayValue::new(items)))
    }

    /// Builds a plain object value from `(key, value)` pairs, in order.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let object = ObjectValue::new();
        for (key, value) in entries {
            object.insert(key, value);
        }
        Value::Object(Arc::new(object))
    }

    /// Wraps an error value.
    pub fn error(error: ErrorValue) -> Self {
        Value::Error(Arc::new(error))
    }

    /// Identity of a shared composite, used for cycle detection.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(array) => Some(Arc::as_ptr(array) as usize),
            Value::Object(object) => Some(Arc::as_ptr(object) as usize),
            _ => None,
        }
    }

    /// Truthiness as a console host evaluates it (used by `assert`).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Function(_) | Value::Array(_) | Value::Object(_) | Value::Error(_) => true,
        }
    }
}

impl fmt::Debug for Value {
    // Shallow on purpose: composites may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::BigInt(n) => write!(f, "BigInt({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Function(name) => write!(f, "Function({name:?})"),
            Value::Array(array) => write!(f, "Array(len = {})", array.len()),
            Value::Object(object) => write!(f, "Object(keys = {})", object.len()),
            Value::Error(error) => write!(f, "Error({error})"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<ErrorValue> for Value {
    fn from(error: ErrorValue) -> Self {
        Value::error(error)
    }
}

/// Ordered, mutable list shared by reference.
#[derive(Default)]
pub struct ArrayValue {
    items: RwLock<Vec<Value>>,
}

impl ArrayValue {
    pub fn new(items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
        }
    }

    pub fn push(&self, value: Value) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current items. The lock is released before returning.
    pub fn items(&self) -> Vec<Value> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Key/value object with insertion-ordered keys and an optional custom
/// textual conversion.
#[derive(Default)]
pub struct ObjectValue {
    entries: RwLock<Vec<(String, Value)>>,
    to_text: Option<TextConversion>,
}

impl ObjectValue {
    /// Creates an empty plain object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty object whose summary text comes from `to_text`.
    pub fn with_conversion<F>(to_text: F) -> Self
    where
        F: Fn() -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            entries: RwLock::default(),
            to_text: Some(Arc::new(to_text)),
        }
    }

    /// Sets `key`, keeping its original position if already present.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current entries. The lock is released before returning.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs the custom textual conversion, if the object has one.
    pub fn convert_to_text(&self) -> Option<Result<String, String>> {
        self.to_text.as_ref().map(|to_text| to_text())
    }
}

/// An error-like value: name, message and an optional captured stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    /// Rendered `std::backtrace::Backtrace`, when one was captured.
    pub stack: Option<String>,
}

impl ErrorValue {
    /// Creates an error without a stack.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Creates an `Error` whose stack is captured at the call site.
    ///
    /// The first frame of the captured stack is this function.
    #[inline(never)]
    pub fn capture(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            stack: Some(Backtrace::force_capture().to_string()),
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}
