//! Console object with replaceable method slots.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use logtap_protocol::Method;
use logtap_stringify::Value;

/// A console method implementation.
pub type LogFn = Arc<dyn Fn(&[Value]) + Send + Sync + 'static>;

/// A console-like object: a table of optional logging methods.
///
/// Slots can be read and replaced at runtime, which is what patching relies
/// on. The slot table lock is never held while a method runs, so methods may
/// log re-entrantly.
#[derive(Default)]
pub struct Console {
    slots: RwLock<HashMap<Method, LogFn>>,
}

impl Console {
    /// Creates a console with no methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Console::set`].
    pub fn with<F>(self, method: Method, f: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.set(method, Arc::new(f));
        self
    }

    /// Returns the current implementation of `method`, if any.
    pub fn get(&self, method: Method) -> Option<LogFn> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&method)
            .cloned()
    }

    /// Replaces `method`, returning the previous implementation.
    pub fn set(&self, method: Method, f: LogFn) -> Option<LogFn> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, f)
    }

    /// Removes `method`, returning its implementation.
    pub fn remove(&self, method: Method) -> Option<LogFn> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&method)
    }

    /// True when `method` has an implementation.
    pub fn has(&self, method: Method) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&method)
    }

    /// Invokes `method` with `args`. Returns `false` if the console lacks it.
    pub fn call(&self, method: Method, args: &[Value]) -> bool {
        match self.get(method) {
            Some(f) => {
                f(args);
                true
            }
            None => false,
        }
    }

    /// Calls the `log` slot, if present.
    pub fn log(&self, args: &[Value]) {
        self.call(Method::Log, args);
    }

    /// Calls the `info` slot, if present.
    pub fn info(&self, args: &[Value]) {
        self.call(Method::Info, args);
    }

    /// Calls the `warn` slot, if present.
    pub fn warn(&self, args: &[Value]) {
        self.call(Method::Warn, args);
    }

    /// Calls the `error` slot, if present.
    pub fn error(&self, args: &[Value]) {
        self.call(Method::Error, args);
    }

    /// Calls the `debug` slot, if present.
    pub fn debug(&self, args: &[Value]) {
        self.call(Method::Debug, args);
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<Method> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        methods.sort();
        f.debug_struct("Console").field("methods", &methods).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn empty_console_has_nothing() {
        let console = Console::new();
        assert!(!console.has(Method::Log));
        assert!(console.get(Method::Log).is_none());
        assert!(!console.call(Method::Log, &[Value::from("x")]));
    }

    #[test]
    fn call_passes_arguments_through() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let console = Console::new().with(Method::Log, move |args| {
            seen2.lock().unwrap().push(args.len());
        });

        assert!(console.call(Method::Log, &[Value::from(1), Value::from(2)]));
        console.log(&[]);
        assert_eq!(*seen.lock().unwrap(), vec![2, 0]);
    }

    #[test]
    fn set_returns_previous() {
        let console = Console::new();
        let first: LogFn = Arc::new(|_: &[Value]| {});
        assert!(console.set(Method::Info, Arc::clone(&first)).is_none());

        let previous = console.set(Method::Info, Arc::new(|_: &[Value]| {})).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));
    }

    #[test]
    fn remove_slot() {
        let console = Console::new().with(Method::Warn, |_| {});
        assert!(console.remove(Method::Warn).is_some());
        assert!(!console.has(Method::Warn));
    }

    #[test]
    fn method_may_log_reentrantly() {
        let console = Arc::new(Console::new());
        let count = Arc::new(Mutex::new(0));

        let count2 = Arc::clone(&count);
        console.set(
            Method::Debug,
            Arc::new(move |_: &[Value]| *count2.lock().unwrap() += 1),
        );

        let inner = Arc::clone(&console);
        console.set(Method::Log, Arc::new(move |args: &[Value]| inner.debug(args)));

        console.log(&[Value::from("nested")]);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn debug_lists_methods() {
        let console = Console::new()
            .with(Method::Warn, |_| {})
            .with(Method::Log, |_| {});
        assert_eq!(format!("{console:?}"), "Console { methods: [Log, Warn] }");
    }
}
