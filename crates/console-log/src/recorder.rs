//! Console interception sessions.
//!
//! [`install`] patches the selected console methods so that every call still
//! reaches the original method and is additionally stringified, traced and
//! handed to the session callback as a [`LogRecord`]. A shared counter caps
//! the number of ordinary records; once the cap is reached a single
//! threshold notice is emitted and the session goes quiet.
//!
//! Nothing that goes wrong while recording escapes a patched method. Errors
//! and panics are reported through the original method under
//! [`LOGGER_ERROR_PREFIX`] instead.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use logtap_protocol::{LogRecord, Method, RecordKind, StringifyOptions};
use logtap_stringify::{ErrorValue, Value, stringify};

use crate::console::LogFn;
use crate::error::{PatchError, RecordError};
use crate::events::ErrorEvent;
use crate::host::Host;
use crate::options::LogRecordOptions;
use crate::panic::panic_message;
use crate::patch::{Unpatch, patch};
use crate::trace::TraceAdapter;

/// First argument of the diagnostic passed to the original method when
/// recording a call fails.
pub const LOGGER_ERROR_PREFIX: &str = "logtap logger error:";

/// Receives every record a session produces.
pub type RecordFn = Arc<dyn Fn(LogRecord) + Send + Sync + 'static>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Sessions currently recording on this thread.
    static RECORDING: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks a session as recording on the current thread until dropped.
struct ReentryGuard {
    session: u64,
}

impl ReentryGuard {
    /// `None` if the session is already recording on this thread.
    fn enter(session: u64) -> Option<Self> {
        RECORDING.with(|recording| {
            let mut recording = recording.borrow_mut();
            if recording.contains(&session) {
                None
            } else {
                recording.push(session);
                Some(Self { session })
            }
        })
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        RECORDING.with(|recording| {
            let mut recording = recording.borrow_mut();
            if let Some(pos) = recording.iter().rposition(|s| *s == self.session) {
                recording.remove(pos);
            }
        });
    }
}

struct Session {
    id: u64,
    log_count: AtomicU64,
    length_threshold: u64,
    stringify_options: StringifyOptions,
    trace: TraceAdapter,
    callback: RecordFn,
}

impl Session {
    /// Records one intercepted call, subject to the threshold.
    fn record_call(&self, method: Method, args: &[Value]) -> Result<(), RecordError> {
        let trace = self.trace.synthetic_trace()?;
        let value = self.stringify_all(args)?;

        let count = self.log_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count < self.length_threshold {
            (self.callback)(LogRecord::new(RecordKind::Level(method), value, Some(trace)));
        } else if count == self.length_threshold {
            tracing::warn!(
                session = self.id,
                threshold = self.length_threshold,
                "log record threshold reached; further calls are not recorded"
            );
            (self.callback)(LogRecord::threshold_notice());
        }
        Ok(())
    }

    /// Records an uncaught error. Not counted against the threshold.
    fn record_uncaught(&self, event: &ErrorEvent) -> Result<(), RecordError> {
        let message = stringify(&Value::from(event.message.as_str()), &self.stringify_options)?;
        let trace = match &event.error {
            // An unusable stack never costs the error its record.
            Some(error) => self.trace.trace_of(error).unwrap_or_else(|err| {
                tracing::debug!(session = self.id, error = %err, "uncaught error recorded without trace");
                Vec::new()
            }),
            None => Vec::new(),
        };
        (self.callback)(LogRecord::new(RecordKind::Error, vec![message], Some(trace)));
        Ok(())
    }

    fn stringify_all(&self, args: &[Value]) -> Result<Vec<String>, RecordError> {
        args.iter()
            .map(|arg| stringify(arg, &self.stringify_options).map_err(RecordError::from))
            .collect()
    }

    fn on_uncaught(&self, event: &ErrorEvent) {
        let Some(_guard) = ReentryGuard::enter(self.id) else {
            return;
        };
        if let Err(err) = contain(|| self.record_uncaught(event)) {
            tracing::warn!(session = self.id, error = %err, "failed to record uncaught error");
        }
    }
}

/// Runs `f`, turning a panic into [`RecordError::Panicked`].
fn contain<F>(f: F) -> Result<(), RecordError>
where
    F: FnOnce() -> Result<(), RecordError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(RecordError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Builds the replacement for `method`: original first, then the record.
fn wrap(session: Arc<Session>, method: Method, original: LogFn) -> LogFn {
    Arc::new(move |args: &[Value]| {
        original(args);

        if method == Method::Assert && args.first().is_some_and(Value::is_truthy) {
            return;
        }
        let Some(_guard) = ReentryGuard::enter(session.id) else {
            return;
        };

        if let Err(err) = contain(|| session.record_call(method, args)) {
            tracing::warn!(session = session.id, %method, error = %err, "failed to record console call");

            let mut diagnostic = Vec::with_capacity(args.len() + 2);
            diagnostic.push(Value::from(LOGGER_ERROR_PREFIX));
            diagnostic.push(Value::error(ErrorValue::new("RecordError", err.to_string())));
            diagnostic.extend_from_slice(args);
            original(&diagnostic);
        }
    })
}

/// Undoes one [`install`].
///
/// Restorers run in installation order. Sessions stacked on the same console
/// must be torn down in reverse order of installation.
#[must_use = "dropping a Teardown leaves the console patched"]
pub struct Teardown {
    session: Option<u64>,
    restorers: Vec<Unpatch>,
}

impl Teardown {
    /// A teardown with nothing to undo.
    pub fn noop() -> Self {
        Self {
            session: None,
            restorers: Vec::new(),
        }
    }

    /// True when nothing was patched or subscribed.
    pub fn is_noop(&self) -> bool {
        self.restorers.is_empty()
    }

    /// Restores every patched method and drops the uncaught-error listener.
    pub fn teardown(self) {
        let count = self.restorers.len();
        for restore in self.restorers {
            restore();
        }
        if let Some(session) = self.session {
            tracing::info!(session, restored = count, "console recording removed");
        }
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teardown")
            .field("session", &self.session)
            .field("restorers", &self.restorers.len())
            .finish()
    }
}

/// Starts recording the console selected by `options.logger` on `host`.
///
/// Methods the console lacks are skipped. When `Error` is among the levels
/// and the host has an error surface, uncaught errors are recorded too.
/// Returns a no-op teardown when `options.logger` is `None`.
pub fn install<F>(callback: F, options: LogRecordOptions, host: &Host) -> Teardown
where
    F: Fn(LogRecord) + Send + Sync + 'static,
{
    let Some(source) = &options.logger else {
        tracing::debug!("no logger configured; console recording disabled");
        return Teardown::noop();
    };
    let logger = source.resolve(host);

    let session = Arc::new(Session {
        id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
        log_count: AtomicU64::new(0),
        length_threshold: options.length_threshold,
        stringify_options: options.stringify_options,
        trace: TraceAdapter::new(Arc::clone(&host.frame_parser)),
        callback: Arc::new(callback),
    });
    let mut restorers: Vec<Unpatch> = Vec::new();

    if options.level.contains(&Method::Error)
        && let Some(errors) = &host.errors
    {
        let listener = Arc::clone(&session);
        let id = errors.add_listener(move |event| listener.on_uncaught(event));
        let errors = Arc::clone(errors);
        restorers.push(Box::new(move || {
            errors.remove_listener(id);
        }));
    }

    let mut patched: Vec<Method> = Vec::new();
    for &method in &options.level {
        if patched.contains(&method) {
            continue;
        }
        let wrapped = Arc::clone(&session);
        match patch(&logger, method, move |original| wrap(wrapped, method, original)) {
            Ok(unpatch) => {
                patched.push(method);
                restorers.push(unpatch);
            }
            Err(PatchError::MissingMethod(method)) => {
                tracing::debug!(%method, "logger has no such method; not recorded");
            }
        }
    }

    tracing::info!(
        session = session.id,
        methods = patched.len(),
        threshold = session.length_threshold,
        "console recording installed"
    );

    Teardown {
        session: Some(session.id),
        restorers,
    }
}

/// [`install`] against [`Host::ambient`].
pub fn record_console<F>(callback: F, options: LogRecordOptions) -> Teardown
where
    F: Fn(LogRecord) + Send + Sync + 'static,
{
    install(callback, options, Host::ambient())
}
