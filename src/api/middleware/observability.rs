//! Observability setup.
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` controls the
//! filter (default `info`); `LOG_FORMAT=json` switches to JSON lines.

use std::env;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber, writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_ansi(false).try_init()
    };

    if result.is_ok() {
        tracing::info!(
            "Tracing initialized (format: {})",
            if json { "json" } else { "text" }
        );
    }
}
