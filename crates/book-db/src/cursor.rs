//! Opaque pagination cursor codec (§4.1). Encodes `value` or `value:nanos`
//! as base64; never interprets `value` itself — callers coerce it back to
//! whatever type the sort key expects.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use book_schemas::{error::Kind, Cursor};
use chrono::{DateTime, Utc};

/// Encode a cursor. `created_at` is `None` when the sort key is globally
/// unique (only `id` in this schema).
pub fn encode(value: &str, created_at: Option<DateTime<Utc>>) -> anyhow::Result<String> {
    if value.is_empty() {
        return Err(Kind::InvalidCursor("value can not be empty").into());
    }

    let raw = match created_at {
        Some(ts) => format!("{value}:{}", ts.timestamp_nanos_opt().unwrap_or(0)),
        None => value.to_string(),
    };

    Ok(STANDARD.encode(raw))
}

/// Decode a cursor produced by [`encode`]. Fails with a distinct
/// [`Kind::InvalidCursor`] for each malformed-input case named in §4.1.
pub fn decode(encoded: &str) -> anyhow::Result<Cursor> {
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| Kind::InvalidCursor("not valid base64"))?;
    let decoded = String::from_utf8(decoded).map_err(|_| Kind::InvalidCursor("not valid utf-8"))?;

    let parts: Vec<&str> = decoded.split(':').collect();
    if parts[0].is_empty() {
        return Err(Kind::InvalidCursor("empty value in cursor").into());
    }
    if parts.len() > 2 {
        return Err(Kind::InvalidCursor("invalid parts in cursor").into());
    }

    let created_at = if parts.len() > 1 {
        let nanos: i64 = parts[1]
            .parse()
            .map_err(|_| Kind::InvalidCursor("invalid timestamp in cursor"))?;
        Some(
            DateTime::from_timestamp(nanos / 1_000_000_000, (nanos % 1_000_000_000) as u32)
                .unwrap_or_else(Utc::now),
        )
    } else {
        None
    };

    Ok(Cursor {
        value: parts[0].to_string(),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_schemas::error::Kind;

    #[test]
    fn round_trips_value_only() {
        let encoded = encode("42", None).unwrap();
        let cursor = decode(&encoded).unwrap();
        assert_eq!(cursor.value, "42");
        assert!(cursor.created_at.is_none());
    }

    #[test]
    fn round_trips_value_and_timestamp_to_the_nanosecond() {
        let ts = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let encoded = encode("X", Some(ts)).unwrap();
        let cursor = decode(&encoded).unwrap();
        assert_eq!(cursor.value, "X");
        assert_eq!(cursor.created_at.unwrap(), ts);
    }

    #[test]
    fn rejects_empty_value() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(":xyz");
        let err = decode(&encoded).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Kind>(),
            Some(Kind::InvalidCursor(_))
        ));
    }

    #[test]
    fn rejects_too_many_parts() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("a:b:c");
        let err = decode(&encoded).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Kind>(),
            Some(Kind::InvalidCursor(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("a:notanumber");
        let err = decode(&encoded).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Kind>(),
            Some(Kind::InvalidCursor(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode("not!base64!!").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Kind>(),
            Some(Kind::InvalidCursor(_))
        ));
    }
}
