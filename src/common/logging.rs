//! Logging and tracing configuration
//!
//! The runner logs every script run and every command it evaluates, so the
//! default level for this crate is INFO.

use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies; `verbose`
/// raises this crate to DEBUG.
pub fn init_cli(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("selenese=debug,warn")
        } else {
            EnvFilter::new("selenese=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Render a run duration for log lines, e.g. `1.042sec` or `2min05.300sec`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    let fraction = millis % 1000;
    if minutes > 0 {
        format!("{}min{:02}.{:03}sec", minutes, seconds, fraction)
    } else {
        format!("{}.{:03}sec", seconds, fraction)
    }
}
