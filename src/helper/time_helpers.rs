//! Every Asia/Yangon conversion goes through here. Yangon has no DST, so a
//! fixed +06:30 offset is exact.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

pub const YANGON_OFFSET_SECONDS: i32 = 6 * 3600 + 30 * 60;

#[derive(Error, Debug, PartialEq)]
pub enum TimeError {
    #[error("'{0}' is not a valid local date-time (expected YYYY-MM-DDTHH:MM).")]
    InvalidLocal(String),
}

pub fn yangon_offset() -> FixedOffset {
    FixedOffset::east_opt(YANGON_OFFSET_SECONDS).expect("+06:30 is within the valid offset range")
}

pub fn to_yangon(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&yangon_offset())
}

/// Interprets an admin's wall-clock input as Yangon local time.
/// Accepts `YYYY-MM-DDTHH:MM` (what a datetime-local input posts) and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_yangon_local(input: &str) -> Result<DateTime<FixedOffset>, TimeError> {
    let trimmed = input.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| TimeError::InvalidLocal(input.to_string()))?;
    yangon_offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TimeError::InvalidLocal(input.to_string()))
}

/// ISO-8601 string in the Yangon zone, the form the backend stores.
pub fn format_yangon(instant: DateTime<FixedOffset>) -> String {
    instant
        .with_timezone(&yangon_offset())
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Time left until `expired_at`, measured from `now`. Negative once passed.
pub fn remaining_until(expired_at: DateTime<FixedOffset>, now: DateTime<Utc>) -> Duration {
    expired_at.signed_duration_since(to_yangon(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_input_is_read_as_yangon_time() {
        let parsed = parse_yangon_local("2026-01-31T23:59").unwrap();
        assert_eq!(format_yangon(parsed), "2026-01-31T23:59:00+06:30");
        let utc = parsed.with_timezone(&Utc);
        assert_eq!(utc.to_rfc3339(), "2026-01-31T17:29:00+00:00");
    }

    #[test]
    fn accepts_seconds_and_rejects_garbage() {
        assert!(parse_yangon_local("2026-01-31T10:00:30").is_ok());
        assert_eq!(
            parse_yangon_local("31/01/2026"),
            Err(TimeError::InvalidLocal("31/01/2026".into()))
        );
    }

    #[test]
    fn remaining_is_zone_independent() {
        let expires = parse_yangon_local("2026-01-01T06:30").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(remaining_until(expires, now), Duration::zero());
        let later = now + Duration::seconds(5);
        assert_eq!(remaining_until(expires, later), Duration::seconds(-5));
    }
}
