//! Validity-window checks. Callers always supply `now`.

use crate::models::LinkRecord;
use chrono::{DateTime, Duration, Utc};

/// The first instant at which the link no longer resolves.
pub fn expires_at(record: &LinkRecord) -> DateTime<Utc> {
    record.created_at + Duration::minutes(i64::from(record.validity_minutes))
}

/// True iff `now` has reached the end of the validity window. The boundary is inclusive.
pub fn is_expired(record: &LinkRecord, now: DateTime<Utc>) -> bool {
    now >= expires_at(record)
}

/// Whole minutes left before expiry, or zero once expired.
pub fn minutes_remaining(record: &LinkRecord, now: DateTime<Utc>) -> i64 {
    expires_at(record)
        .signed_duration_since(now)
        .num_minutes()
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(validity_minutes: u32) -> LinkRecord {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        LinkRecord::new("abc12", "https://example.com", validity_minutes, t0)
    }

    #[test]
    fn test_valid_before_boundary() {
        let r = record(30);
        assert!(!is_expired(&r, r.created_at));
        assert!(!is_expired(
            &r,
            r.created_at + Duration::minutes(30) - Duration::milliseconds(1)
        ));
    }

    #[test]
    fn test_expired_at_boundary() {
        let r = record(30);
        assert!(is_expired(&r, r.created_at + Duration::minutes(30)));
        assert!(is_expired(&r, r.created_at + Duration::hours(5)));
    }

    #[test]
    fn test_expires_at() {
        let r = record(90);
        assert_eq!(expires_at(&r), r.created_at + Duration::minutes(90));
    }

    #[test]
    fn test_minutes_remaining() {
        let r = record(10);
        assert_eq!(minutes_remaining(&r, r.created_at), 10);
        assert_eq!(
            minutes_remaining(&r, r.created_at + Duration::minutes(4)),
            6
        );
        assert_eq!(
            minutes_remaining(&r, r.created_at + Duration::minutes(20)),
            0
        );
    }
}
