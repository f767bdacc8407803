//! Logging setup
//!
//! Console output goes to stderr (stdout carries the highlighting report) and
//! is filtered by `RUST_LOG`, default `warn`. Useful filters:
//! - `RUST_LOG=milord::highlight=trace` - per-job worker activity
//! - `RUST_LOG=milord::editor=debug` - how edits were split into urgent and
//!   background work
//!
//! A debug-level copy is written to `<config dir>/logs/milord.log.YYYY-MM-DD`.
//! Both outputs carry thread names, so worker lines (`milord-highlighter`)
//! stand out from the document thread.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config_paths::{ensure_logs_dir, LOG_FILE_PREFIX};

/// Level written to the log file regardless of `RUST_LOG`
const FILE_DIRECTIVE: &str = "debug";

fn console_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy()
}

/// Install the console and file subscribers. Safe to call more than once;
/// later calls only report that logging is already set up.
pub fn init() {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(true)
        .with_filter(console_filter());

    let file_layer = match ensure_logs_dir() {
        Ok(dir) => Some(
            fmt::layer()
                .with_writer(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
                .with_ansi(false)
                .with_thread_names(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new(FILE_DIRECTIVE)),
        ),
        Err(e) => {
            eprintln!("milord: file logging disabled: {}", e);
            None
        }
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("milord: logging already initialized: {}", e);
    }
}
