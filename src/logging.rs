// 📝 Logging Setup
// Two sinks:
// - stdout:  `info` by default, `--log` or RUST_LOG override it
// - file:    everything from this crate at `debug`, rolled daily under log_dir
//
// The TUI owns the terminal, so callers can switch the stdout sink off.

use std::io;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "ep-cohesion.log";
const FILE_FILTER: &str = "info,ep_cohesion=debug";

/// Stdout filter: explicit level, else RUST_LOG, else `info`
fn stdout_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

pub fn configure_logging(log_dir: &Path, level: Option<&str>, stdout: bool) {
    let stdout_log = stdout.then(|| {
        fmt::layer()
            .with_writer(io::stdout)
            .with_filter(stdout_filter(level))
    });

    let file_appender = rolling::daily(log_dir, LOG_FILE_NAME);
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(file_log)
        .init();
}

