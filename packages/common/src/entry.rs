use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILENAME_PREFIX: &str = "screen-recording";

/// Persisted metadata for one finished recording.
///
/// The artifact bytes are not part of the entry and do not survive a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingEntry {
    /// Download filename (e.g., "screen-recording-2024-05-01T12-30-45-123Z.webm")
    pub filename: String,

    /// ISO-8601 UTC timestamp with millisecond precision
    pub timestamp: String,
}

impl RecordingEntry {
    pub fn new(prefix: &str, recorded_at: DateTime<Utc>, extension: &str) -> Self {
        Self {
            filename: recording_filename(prefix, recorded_at, extension),
            timestamp: iso_timestamp(recorded_at),
        }
    }
}

/// `2024-05-01T12:30:45.123Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `<prefix>-<timestamp with ':' and '.' replaced by '-'>.<extension>`
pub fn recording_filename(prefix: &str, at: DateTime<Utc>, extension: &str) -> String {
    let stamp = iso_timestamp(at).replace(|c: char| c == ':' || c == '.', "-");
    format!("{}-{}.{}", prefix, stamp, extension)
}
