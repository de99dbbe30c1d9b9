//! Forwarding of Rust panics to an uncaught-error surface.

use std::any::Any;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

use logtap_stringify::ErrorValue;

use crate::events::{ErrorEvent, ErrorEvents};

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Keeps the panic hook that was active before [`forward_panics`].
///
/// Listeners reached through the hook run while the thread is panicking and
/// must not panic themselves, or the process aborts.
#[must_use = "dropping the forwarder keeps panics forwarded; call restore() to undo"]
pub struct PanicForwarder {
    previous: Arc<PanicHook>,
}

/// Installs a panic hook that dispatches every panic to `events` as an
/// [`ErrorEvent`] named `Panic`, then runs the previous hook.
pub fn forward_panics(events: Arc<ErrorEvents>) -> PanicForwarder {
    let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
    let chained = Arc::clone(&previous);

    panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let error = ErrorValue {
            name: "Panic".to_string(),
            ..ErrorValue::capture(message.clone())
        };
        events.dispatch(&ErrorEvent {
            message,
            error: Some(error),
        });
        chained(info);
    }));

    tracing::debug!("panic forwarding enabled");
    PanicForwarder { previous }
}

impl PanicForwarder {
    /// Puts the previous panic hook back in place.
    pub fn restore(self) {
        let previous = self.previous;
        panic::set_hook(Box::new(move |info| previous(info)));
        tracing::debug!("panic forwarding disabled");
    }
}

impl std::fmt::Debug for PanicForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicForwarder").finish_non_exhaustive()
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
