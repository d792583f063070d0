//! Shared types for the database layer

pub mod errors;

use chrono::{DateTime, SecondsFormat, Utc};
use huddle_realtime::StoreError;

pub use errors::DatabaseError;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
pub fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| StoreError::corrupt(format!("invalid timestamp `{value}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(timestamp(earlier) < timestamp(later));
        assert_eq!(timestamp(earlier), "2024-03-01T09:00:00.000000Z");
        assert_eq!(parse_timestamp(&timestamp(later)).unwrap(), later);
    }

    #[test]
    fn garbage_timestamps_are_corrupt() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
