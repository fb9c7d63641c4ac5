use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds since the Unix epoch, used for created/updated columns.
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as i64
}
