//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a timestamp for storage (RFC 3339, millisecond precision, `Z` suffix)
///
/// Fixed-width output keeps lexicographic order equal to chronological order,
/// which the `ORDER BY created_at` queries rely on.
pub fn to_storage(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored RFC 3339 timestamp
pub fn from_storage(value: &str) -> crate::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| crate::Error::Internal(format!("Invalid stored timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_storage_format_roundtrip_preserves_millis() {
        let ts = Utc.timestamp_millis_opt(1_730_000_000_123).unwrap();
        let stored = to_storage(&ts);
        assert_eq!(stored, "2024-10-27T03:33:20.123Z");
        assert_eq!(from_storage(&stored).unwrap(), ts);
    }

    #[test]
    fn test_storage_format_sorts_chronologically() {
        let earlier = Utc.timestamp_millis_opt(1_730_000_000_000).unwrap();
        let later = Utc.timestamp_millis_opt(1_730_000_000_900).unwrap();
        assert!(to_storage(&earlier) < to_storage(&later));
    }

    #[test]
    fn test_from_storage_rejects_garbage() {
        assert!(from_storage("yesterday").is_err());
    }
}
