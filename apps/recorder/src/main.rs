//! logtap recorder entry point.
//!
//! Usage: `logtap-recorder [CONFIG]`. Reads console calls from stdin, one per
//! line, and prints the resulting records to stdout as JSON lines.

mod app;
mod input;

use std::path::PathBuf;

use anyhow::Context;
use logtap_console::RecordConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries records only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting logtap recorder");

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => RecordConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RecordConfig::default(),
    };
    tracing::info!(
        levels = config.level.len(),
        threshold = config.length_threshold,
        "configuration loaded"
    );

    let stdin = std::io::stdin().lock();
    let stats = app::run(config, stdin)?;

    tracing::info!(lines = stats.lines, skipped = stats.skipped, "recorder finished");
    Ok(())
}
