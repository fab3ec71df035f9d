//! Event emission for waterfall runs.
//!
//! Waterfalls report every state transition to an [`EventSink`] as a named
//! event with a JSON payload. The payload always carries the run id and an
//! ISO 8601 timestamp.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A run started.
pub const WATERFALL_STARTED: &str = "waterfall.started";
/// A step is about to run for the first time.
pub const STEP_STARTED: &str = "waterfall.step.started";
/// A step attempt failed and will be retried after a delay.
pub const STEP_RETRYING: &str = "waterfall.step.retrying";
/// A step produced a value.
pub const STEP_SUCCEEDED: &str = "waterfall.step.succeeded";
/// Every step succeeded.
pub const WATERFALL_SUCCEEDED: &str = "waterfall.succeeded";
/// A step exhausted its attempts; the run is over.
pub const WATERFALL_FAILED: &str = "waterfall.failed";

/// Returns the current UTC time in RFC 3339 form with microseconds.
#[must_use]
pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
