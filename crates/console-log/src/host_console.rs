//! Host console: the ambient console that actually prints.
//!
//! Every method of the logging surface is present. Output lines go through a
//! [`Sink`]; the default sink writes to stdout/stderr. Counters, timers and
//! group indentation are tracked per console.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use logtap_protocol::{Method, StringifyOptions};
use logtap_stringify::{Value, stringify};

use crate::console::Console;

/// Indentation added per open group.
const GROUP_INDENT: &str = "  ";

/// Label used by `count`/`time` when none is given.
const DEFAULT_LABEL: &str = "default";

/// Output stream of a host console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Receives every line a host console prints.
pub type Sink = Arc<dyn Fn(Stream, &str) + Send + Sync + 'static>;

/// Creates a host console printing to stdout/stderr.
pub fn host_console() -> Console {
    host_console_with_sink(Arc::new(|stream: Stream, line: &str| match stream {
        Stream::Stdout => println!("{line}"),
        Stream::Stderr => eprintln!("{line}"),
    }))
}

/// Creates a host console printing through `sink`.
pub fn host_console_with_sink(sink: Sink) -> Console {
    let state = Arc::new(HostState {
        sink,
        counts: Mutex::new(HashMap::new()),
        timers: Mutex::new(HashMap::new()),
        depth: AtomicUsize::new(0),
    });

    Method::ALL.into_iter().fold(Console::new(), |console, method| {
        let state = Arc::clone(&state);
        console.with(method, move |args| state.dispatch(method, args))
    })
}

struct HostState {
    sink: Sink,
    counts: Mutex<HashMap<String, u64>>,
    timers: Mutex<HashMap<String, Instant>>,
    depth: AtomicUsize,
}

impl HostState {
    fn dispatch(&self, method: Method, args: &[Value]) {
        match method {
            Method::Assert => {
                if args.first().is_some_and(Value::is_truthy) {
                    return;
                }
                let rest = args.get(1..).unwrap_or_default();
                if rest.is_empty() {
                    self.emit(Stream::Stderr, "Assertion failed");
                } else {
                    self.emit(Stream::Stderr, &format!("Assertion failed: {}", join_args(rest)));
                }
            }
            Method::Count => {
                let label = label_of(args);
                let count = {
                    let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
                    let count = counts.entry(label.clone()).or_insert(0);
                    *count += 1;
                    *count
                };
                self.emit(Stream::Stdout, &format!("{label}: {count}"));
            }
            Method::CountReset => {
                let label = label_of(args);
                let existed = self
                    .counts
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&label)
                    .is_some();
                if !existed {
                    self.emit(Stream::Stderr, &format!("Count for '{label}' does not exist"));
                }
            }
            Method::Group | Method::GroupCollapsed => {
                if !args.is_empty() {
                    self.emit(Stream::Stdout, &join_args(args));
                }
                self.depth.fetch_add(1, Ordering::Relaxed);
            }
            Method::GroupEnd => {
                let _ = self
                    .depth
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1));
            }
            Method::Time => {
                let label = label_of(args);
                let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
                if timers.contains_key(&label) {
                    drop(timers);
                    self.emit(Stream::Stderr, &format!("Timer '{label}' already exists"));
                } else {
                    timers.insert(label, Instant::now());
                }
            }
            Method::TimeLog | Method::TimeEnd => {
                let label = label_of(args);
                let started = {
                    let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
                    if method == Method::TimeEnd {
                        timers.remove(&label)
                    } else {
                        timers.get(&label).copied()
                    }
                };
                let Some(started) = started else {
                    self.emit(Stream::Stderr, &format!("Timer '{label}' does not exist"));
                    return;
                };
                let elapsed = started.elapsed().as_secs_f64() * 1000.0;
                let mut line = format!("{label}: {elapsed:.3}ms");
                let extra = args.get(1..).unwrap_or_default();
                if method == Method::TimeLog && !extra.is_empty() {
                    line.push(' ');
                    line.push_str(&join_args(extra));
                }
                self.emit(Stream::Stdout, &line);
            }
            Method::Trace => {
                self.emit(Stream::Stderr, &format!("Trace: {}", join_args(args)));
            }
            other => {
                let stream = if other.is_error_stream() {
                    Stream::Stderr
                } else {
                    Stream::Stdout
                };
                self.emit(stream, &join_args(args));
            }
        }
    }

    fn emit(&self, stream: Stream, text: &str) {
        let indent = GROUP_INDENT.repeat(self.depth.load(Ordering::Relaxed));
        for line in text.lines() {
            (self.sink)(stream, &format!("{indent}{line}"));
        }
        if text.is_empty() {
            (self.sink)(stream, &indent);
        }
    }
}

/// Joins the natural text of each argument with spaces.
fn join_args(args: &[Value]) -> String {
    let options = StringifyOptions::default();
    args.iter()
        .map(|arg| stringify(arg, &options).unwrap_or_else(|e| format!("<{e}>")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn label_of(args: &[Value]) -> String {
    match args.first() {
        None | Some(Value::Undefined) => DEFAULT_LABEL.to_string(),
        Some(label) => join_args(std::slice::from_ref(label)),
    }
}
