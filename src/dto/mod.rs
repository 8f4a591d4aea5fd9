use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Contest payloads.
pub mod contest;
/// Health payload.
pub mod health;
/// Deployment mode payload.
pub mod mode;
/// Join and vote payloads.
pub mod participation;
/// Phase and control mode enums.
pub mod phase;
/// Field validators shared by the payloads.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp supplied by a client.
///
/// Sub-millisecond digits are dropped so the value survives a round trip through
/// storage, which keeps milliseconds.
pub fn parse_timestamp(value: &str) -> Result<SystemTime, time::Error> {
    let parsed = OffsetDateTime::parse(value.trim(), &Rfc3339)?;
    let truncated = parsed.replace_millisecond(parsed.millisecond())?;
    Ok(truncated.into())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timestamps_use_rfc3339() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let rendered = format_system_time(time);
        assert_eq!(rendered, "2023-11-14T22:13:20Z");
        assert_eq!(parse_timestamp(&rendered).unwrap(), time);
    }

    #[test]
    fn offsets_are_normalized() {
        let parsed = parse_timestamp("2023-11-15T00:13:20+02:00").unwrap();
        assert_eq!(
            parsed,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        );
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[test]
    fn sub_millisecond_digits_are_dropped() {
        let parsed = parse_timestamp("2023-11-14T22:13:20.123456789Z").unwrap();
        assert_eq!(
            parsed,
            SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123)
        );
    }
}
