//! Time helpers

use chrono::Utc;

/// Current UTC time as an RFC 3339 string (stored as TEXT in SQLite)
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Current UTC time as a unix timestamp in seconds
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
