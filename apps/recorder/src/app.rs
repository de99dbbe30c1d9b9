//! Recorder main loop.

use std::io::{BufRead, Write};
use std::panic;
use std::sync::Arc;

use logtap_console::{
    ErrorEvent, ErrorEvents, Host, RecordConfig, Stream, forward_panics, host_console_with_sink, install,
};
use logtap_protocol::LogRecord;
use logtap_stringify::ErrorValue;

use crate::input::{Command, parse_line};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub lines: usize,
    pub skipped: usize,
}

/// Writes a record to stdout as one JSON line.
pub fn print_record(record: LogRecord) {
    let mut out = std::io::stdout().lock();
    let written = serde_json::to_writer(&mut out, &record)
        .map_err(std::io::Error::from)
        .and_then(|()| writeln!(out));
    if let Err(err) = written {
        tracing::warn!(error = %err, "failed to write record");
    }
}

/// Replays `input` and prints the records.
pub fn run<R: BufRead>(config: RecordConfig, input: R) -> anyhow::Result<Stats> {
    run_with_sink(config, input, print_record)
}

/// Replays every line of `input` against a recorded console and hands the
/// records to `sink`.
pub fn run_with_sink<R, F>(config: RecordConfig, input: R, sink: F) -> anyhow::Result<Stats>
where
    R: BufRead,
    F: Fn(LogRecord) + Send + Sync + 'static,
{
    let errors = Arc::new(ErrorEvents::new());
    let console = Arc::new(host_console_with_sink(Arc::new(|stream: Stream, line: &str| {
        match stream {
            Stream::Stdout => eprintln!("console> {line}"),
            Stream::Stderr => eprintln!("console! {line}"),
        }
    })));
    let host = Host::new(Arc::clone(&console)).with_errors(Arc::clone(&errors));

    let teardown = install(sink, config.into_options(), &host);
    let forwarder = forward_panics(Arc::clone(&errors));

    let mut stats = Stats::default();
    let mut result = Ok(());
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                result = Err(err.into());
                break;
            }
        };
        stats.lines += 1;

        match parse_line(&line) {
            Ok(Some(Command::Call(method, args))) => {
                if !console.call(method, &args) {
                    tracing::debug!(%method, "console has no such method");
                }
            }
            Ok(Some(Command::Throw(message))) => {
                errors.dispatch(&ErrorEvent::from_error(ErrorValue::capture(message)));
            }
            Ok(Some(Command::Panic(message))) => {
                if panic::catch_unwind(|| panic!("{message}")).is_err() {
                    tracing::debug!("recovered from requested panic");
                }
            }
            Ok(None) => stats.skipped += 1,
            Err(err) => {
                tracing::warn!(line = stats.lines, error = %err, "skipping input line");
                stats.skipped += 1;
            }
        }
    }

    forwarder.restore();
    teardown.teardown();
    result.map(|()| stats)
}
