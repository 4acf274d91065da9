//! Record timestamps and calendar-day keys
//!
//! Records written by the presentation layer carry timestamps in whatever shape
//! the host produced them: RFC 3339 instants, bare `YYYY-MM-DD` days, naive
//! local date-times, `Date.toDateString()` strings, or epoch milliseconds.
//! Everything the engine does with them reduces to "which local calendar day"
//! and "which came later", both evaluated in the UTC offset of the caller's now.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const DAY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%a %b %d %Y"];

/// A timestamp attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTime {
    /// A point in time with a known offset
    Instant(DateTime<FixedOffset>),
    /// A wall-clock time on the device, without offset information
    Local(NaiveDateTime),
    /// A calendar day only
    Day(NaiveDate),
}

impl RecordTime {
    /// Parse a timestamp string, returning `None` when no known shape matches
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(RecordTime::Instant(dt));
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(RecordTime::Local(ndt));
            }
        }

        for format in DAY_FORMATS {
            if let Ok(day) = NaiveDate::parse_from_str(raw, format) {
                return Some(RecordTime::Day(day));
            }
        }

        None
    }

    /// Interpret a JSON value (string or epoch milliseconds)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => {
                let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(|dt| RecordTime::Instant(DateTime::<FixedOffset>::from(dt)))
            }
            _ => None,
        }
    }

    /// Calendar day of this timestamp on a device running at `offset`
    pub fn local_day(&self, offset: &FixedOffset) -> NaiveDate {
        match self {
            RecordTime::Instant(dt) => dt.with_timezone(offset).date_naive(),
            RecordTime::Local(ndt) => ndt.date(),
            RecordTime::Day(day) => *day,
        }
    }

    /// Wall-clock position used to order records (days sort at midnight)
    pub fn local_datetime(&self, offset: &FixedOffset) -> NaiveDateTime {
        match self {
            RecordTime::Instant(dt) => dt.with_timezone(offset).naive_local(),
            RecordTime::Local(ndt) => *ndt,
            RecordTime::Day(day) => day.and_time(NaiveTime::MIN),
        }
    }
}

impl From<DateTime<FixedOffset>> for RecordTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        RecordTime::Instant(dt)
    }
}

impl From<NaiveDate> for RecordTime {
    fn from(day: NaiveDate) -> Self {
        RecordTime::Day(day)
    }
}

impl Serialize for RecordTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = match self {
            RecordTime::Instant(dt) => dt.to_rfc3339(),
            RecordTime::Local(ndt) => ndt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            RecordTime::Day(day) => day.format("%Y-%m-%d").to_string(),
        };
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for RecordTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RecordTime::from_value(&value)
            .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {value}")))
    }
}

/// Deserialize an optional timestamp, mapping unparseable values to `None`
pub(crate) fn lenient<'de, D>(deserializer: D) -> Result<Option<RecordTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(RecordTime::from_value))
}

/// Day key (`YYYY-MM-DD`) for a calendar day
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Short weekday label (`Mon`, `Tue`, ...)
pub fn weekday_label(day: NaiveDate) -> String {
    day.format("%a").to_string()
}

/// Parse a caller-supplied "now" (RFC 3339)
pub fn parse_now(raw: &str) -> Result<DateTime<FixedOffset>, crate::error::EngineError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| crate::error::EngineError::InvalidTimestamp(format!("{raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_parse_rfc3339() {
        let t = RecordTime::parse("2024-01-15T14:00:00Z").unwrap();
        assert!(matches!(t, RecordTime::Instant(_)));
        assert_eq!(
            t.local_day(&offset(0)),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_instant_day_follows_device_offset() {
        // 23:30 UTC is already the next day at UTC+2
        let t = RecordTime::parse("2024-01-15T23:30:00Z").unwrap();
        assert_eq!(
            t.local_day(&offset(2)),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
        assert_eq!(
            t.local_day(&offset(-5)),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_day_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(RecordTime::parse("2024-01-15"), Some(RecordTime::Day(expected)));
        assert_eq!(
            RecordTime::parse("Mon Jan 15 2024"),
            Some(RecordTime::Day(expected))
        );
    }

    #[test]
    fn test_parse_naive_datetime() {
        let t = RecordTime::parse("2024-01-15T08:45:00").unwrap();
        assert!(matches!(t, RecordTime::Local(_)));
        assert_eq!(t.local_day(&offset(9)).to_string(), "2024-01-15");
    }

    #[test]
    fn test_epoch_millis() {
        let t = RecordTime::from_value(&serde_json::json!(1705327200000_i64)).unwrap();
        assert_eq!(t.local_day(&offset(0)).to_string(), "2024-01-15");
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(RecordTime::parse("not a date"), None);
        assert_eq!(RecordTime::parse(""), None);
        assert_eq!(RecordTime::from_value(&serde_json::json!(true)), None);
    }

    #[test]
    fn test_serialization_shapes() {
        let day = RecordTime::Day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"2024-03-01\"");

        let parsed: RecordTime = serde_json::from_str("\"2024-03-01T10:00:00+02:00\"").unwrap();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            "\"2024-03-01T10:00:00+02:00\""
        );
    }

    #[test]
    fn test_weekday_label() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(weekday_label(day), "Mon");
        assert_eq!(day_key(day), "2024-01-15");
    }
}
