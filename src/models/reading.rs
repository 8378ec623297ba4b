use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Timestamp formats accepted in the `MeterReadingDateTime` column
/// UK convention: day before month, 24-hour clock. Tried in order.
pub const TIMESTAMP_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];

/// Date-only form, read as midnight
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a timestamp cell using the fixed UK formats
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a timestamp the way it is accepted on input
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMATS[0]).to_string()
}

/// The "zero" timestamp: 01/01/0001 00:00:00
pub fn unset_timestamp() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn serialize_timestamp<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(ts))
}

/// One decoded input row, not yet validated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub account_id: i32,
    #[serde(serialize_with = "serialize_timestamp")]
    pub meter_reading_date_time: NaiveDateTime,
    pub meter_read_value: Decimal,
}

impl CandidateRecord {
    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            account_id: self.account_id,
            value: self.meter_read_value,
            timestamp: self.meter_reading_date_time,
        }
    }

    pub fn to_new_reading(&self) -> NewReading {
        NewReading {
            account_id: self.account_id,
            timestamp: self.meter_reading_date_time,
            value: self.meter_read_value,
        }
    }
}

/// Composite identity of a reading: (account, value, timestamp)
/// Compared at full timestamp precision; `Decimal` hashes normalized so 1.0 and 1.00 collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadingKey {
    pub account_id: i32,
    pub value: Decimal,
    pub timestamp: NaiveDateTime,
}

/// A reading accepted in the current batch, waiting for the bulk insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub account_id: i32,
    pub timestamp: NaiveDateTime,
    pub value: Decimal,
}

/// A persisted reading. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReading {
    pub id: u64,
    pub account_id: i32,
    pub timestamp: NaiveDateTime,
    pub value: Decimal,
}

impl StoredReading {
    pub fn new(id: u64, reading: NewReading) -> Self {
        Self {
            id,
            account_id: reading.account_id,
            timestamp: reading.timestamp,
            value: reading.value,
        }
    }

    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            account_id: self.account_id,
            value: self.value,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_day_before_month() {
        assert_eq!(
            parse_timestamp("05/04/2024 09:24:00"),
            Some(ts(2024, 4, 5, 9, 24, 0))
        );
    }

    #[test]
    fn test_parse_without_seconds() {
        assert_eq!(
            parse_timestamp("22/04/2019 09:24"),
            Some(ts(2019, 4, 22, 9, 24, 0))
        );
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        assert_eq!(parse_timestamp(" 06/04/2024 "), Some(ts(2024, 4, 6, 0, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_other_layouts() {
        assert_eq!(parse_timestamp("2024-04-06T10:00:00"), None);
        assert_eq!(parse_timestamp("13/13/2024 10:00"), None);
        assert_eq!(parse_timestamp("06/04/2024 7pm"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_matches_input_layout() {
        let t = ts(2024, 12, 20, 23, 5, 9);
        assert_eq!(format_timestamp(&t), "20/12/2024 23:05:09");
        assert_eq!(parse_timestamp(&format_timestamp(&t)), Some(t));
    }

    #[test]
    fn test_unset_sentinel() {
        assert_eq!(unset_timestamp(), Some(ts(1, 1, 1, 0, 0, 0)));
        assert_eq!(parse_timestamp("01/01/0001 00:00:00"), unset_timestamp());
    }
}
