//! Logging setup and timing helpers.
//!
//! The library itself only emits through `tracing` macros; applications and
//! tests choose the subscriber. [`init_tracing`] installs a formatted
//! subscriber filtered by `RUST_LOG`.

mod timer;

pub use timer::SpanTimer;

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber writing formatted lines to stderr.
///
/// `RUST_LOG` takes precedence over `default_directive`. Returns false if a
/// global subscriber was already set, in which case nothing changes.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Like [`init_tracing`], emitting one JSON object per line.
pub fn init_json_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

