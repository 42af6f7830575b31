//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for action request/completion times and event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way thing descriptions expose it
/// (`YYYY-mm-ddTHH:MM:SS+00:00`).
#[must_use]
pub fn format(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}
