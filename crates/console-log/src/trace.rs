//! Stack traces for recorded entries.
//!
//! Frame parsing sits behind [`FrameParser`]. [`TraceAdapter`] cuts every
//! parsed stack down to the code that caused it: the capturing frame goes,
//! and so does the run of logtap dispatch and Rust runtime frames under it.

use std::sync::Arc;

use logtap_protocol::StackFrame;
use logtap_stringify::ErrorValue;

use crate::error::TraceError;

/// Turns an error value into an ordered list of frames, innermost first.
pub trait FrameParser: Send + Sync {
    fn parse(&self, error: &ErrorValue) -> Result<Vec<StackFrame>, TraceError>;
}

/// Parses stacks rendered from `std::backtrace::Backtrace`.
///
/// Expects the default (short) rendering:
///
/// ```text
///    0: crate::module::function
///              at ./src/module.rs:10:5
///    1: <unknown>
/// ```
///
/// Symbols printed without an index are inlined frames and become frames of
/// their own. Frames belonging to the backtrace machinery are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceFrameParser;

impl FrameParser for BacktraceFrameParser {
    fn parse(&self, error: &ErrorValue) -> Result<Vec<StackFrame>, TraceError> {
        let stack = error.stack.as_deref().ok_or(TraceError::NoStack)?;
        parse_backtrace(stack)
    }
}

fn parse_backtrace(stack: &str) -> Result<Vec<StackFrame>, TraceError> {
    let mut frames: Vec<StackFrame> = Vec::new();

    for line in stack.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("note:") {
            continue;
        }
        if trimmed == "disabled backtrace" || trimmed == "unsupported backtrace" {
            return Ok(Vec::new());
        }

        if let Some(location) = trimmed.strip_prefix("at ") {
            let frame = frames
                .last_mut()
                .ok_or_else(|| TraceError::Malformed(format!("location before any frame: {trimmed}")))?;
            if frame.file_name.is_none() {
                apply_location(frame, location);
            }
            continue;
        }

        let symbol = match split_index(trimmed) {
            Some(symbol) => symbol,
            // Inlined symbol sharing the previous frame's index.
            None if !frames.is_empty() => trimmed,
            None => return Err(TraceError::Malformed(format!("unexpected line: {trimmed}"))),
        };

        frames.push(StackFrame {
            function_name: function_name(symbol),
            ..StackFrame::default()
        });
    }

    frames.retain(|frame| !is_backtrace_internals(frame));
    Ok(frames)
}

/// Splits `"12: symbol"` into `symbol`.
fn split_index(line: &str) -> Option<&str> {
    let (index, rest) = line.split_once(": ")?;
    index.parse::<usize>().ok()?;
    Some(rest.trim())
}

fn function_name(symbol: &str) -> Option<String> {
    if symbol.is_empty() || symbol == "<unknown>" || symbol.starts_with("0x") {
        None
    } else {
        Some(symbol.to_string())
    }
}

/// Parses `file:line:column` (column optional) into `frame`.
fn apply_location(frame: &mut StackFrame, location: &str) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let rest = parts.next();

    match (rest, middle, last) {
        (Some(file), Some(line), Some(column)) if line.parse::<u32>().is_ok() => {
            frame.file_name = Some(file.to_string());
            frame.line_number = line.parse().ok();
            frame.column_number = column.parse().ok();
        }
        (_, Some(_), Some(line)) if line.parse::<u32>().is_ok() => {
            let file = location.rsplit_once(':').map(|(file, _)| file).unwrap_or(location);
            frame.file_name = Some(file.to_string());
            frame.line_number = line.parse().ok();
        }
        _ => frame.file_name = Some(location.to_string()),
    }
}

fn is_backtrace_internals(frame: &StackFrame) -> bool {
    frame.function_name.as_deref().is_some_and(|name| {
        name.starts_with("std::backtrace::")
            || name.starts_with("std::backtrace_rs::")
            || name.starts_with("backtrace::")
    })
}

/// Frames that sit between a captured stack and the code that triggered it.
/// Standard library frames cover the panic machinery and closure-call shims.
const DISPATCH_PREFIXES: &[&str] = &[
    "logtap_stringify::value::ErrorValue::capture",
    "logtap_console::trace::TraceAdapter::",
    "logtap_console::recorder::Session::",
    "logtap_console::recorder::contain",
    "logtap_console::recorder::wrap",
    "logtap_console::console::Console::",
    "logtap_console::panic::forward_panics",
    "std::",
    "core::",
    "alloc::",
    "<std::",
    "<core::",
    "<alloc::",
    "__rust",
    "rust_begin_unwind",
];

fn is_dispatch(frame: &StackFrame) -> bool {
    frame
        .function_name
        .as_deref()
        .is_some_and(|name| DISPATCH_PREFIXES.iter().any(|prefix| name.starts_with(prefix)))
}

/// Drops the capturing frame and the dispatch frames directly under it.
fn call_site_frames(mut frames: Vec<StackFrame>) -> Vec<StackFrame> {
    if frames.is_empty() {
        return frames;
    }
    let skip = 1 + frames[1..].iter().take_while(|frame| is_dispatch(frame)).count();
    frames.drain(..skip);
    frames
}

/// Produces traces that start at the caller.
#[derive(Clone)]
pub struct TraceAdapter {
    parser: Arc<dyn FrameParser>,
}

impl TraceAdapter {
    /// Creates an adapter over `parser`.
    pub fn new(parser: Arc<dyn FrameParser>) -> Self {
        Self { parser }
    }

    /// Frames of `error`, starting at the code that raised it.
    ///
    /// The first parsed frame is the capture site and is always dropped.
    /// Logtap dispatch and runtime frames right under it are dropped too,
    /// so a console call traces from its caller and a forwarded panic from
    /// the panicking function.
    pub fn trace_of(&self, error: &ErrorValue) -> Result<Vec<StackFrame>, TraceError> {
        let frames = self.parser.parse(error)?;
        Ok(call_site_frames(frames))
    }

    /// Trace of the current call site, captured through a fresh error value.
    #[inline(never)]
    pub fn synthetic_trace(&self) -> Result<Vec<StackFrame>, TraceError> {
        self.trace_of(&ErrorValue::capture(""))
    }
}

impl Default for TraceAdapter {
    fn default() -> Self {
        Self::new(Arc::new(BacktraceFrameParser))
    }
}

impl std::fmt::Debug for TraceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceAdapter").finish_non_exhaustive()
    }
}
