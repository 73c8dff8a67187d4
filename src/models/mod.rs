use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Name of a saved file, stamped with the moment it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub timestamp: String,
}

/// The single note kept in the capsule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDocument {
    pub note: String,
    pub timestamp: String,
}

impl FileRecord {
    pub fn new(name: String, at: DateTime<Utc>) -> Self {
        Self {
            name,
            timestamp: format_timestamp(at),
        }
    }
}

impl NoteDocument {
    pub fn new(note: String, at: DateTime<Utc>) -> Self {
        Self {
            note,
            timestamp: format_timestamp(at),
        }
    }
}

/// Millisecond precision UTC, e.g. `2024-12-31T23:59:59.000Z`.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
