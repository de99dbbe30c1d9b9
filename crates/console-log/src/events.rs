//! Global uncaught-error notification surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use logtap_stringify::ErrorValue;

/// An uncaught-error notification: a message and, when known, the error
/// that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub message: String,
    pub error: Option<ErrorValue>,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// Builds a notification carrying `error`, using its message.
    pub fn from_error(error: ErrorValue) -> Self {
        Self {
            message: error.message.clone(),
            error: Some(error),
        }
    }
}

/// Handle returned by [`ErrorEvents::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ErrorEvent) + Send + Sync + 'static>;

/// Listener registry for uncaught errors.
///
/// Listeners run synchronously, in registration order, on the dispatching
/// thread. The registry lock is released before any listener runs.
#[derive(Default)]
pub struct ErrorEvents {
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ErrorEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for every later dispatch.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Notifies every listener of `event`.
    pub fn dispatch(&self, event: &ErrorEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ErrorEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
