#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use meter_readings::config::IngestConfig;
use meter_readings::models::{Account, CandidateRecord, NewReading};
use meter_readings::service::MeterReadingService;
use meter_readings::store::InMemoryStore;
use rust_decimal::Decimal;

pub const HEADER: &str = "AccountId,MeterReadingDateTime,MeterReadValue\n";

/// Helper to build a timestamp
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

/// Helper to build a midnight timestamp
pub fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    at(y, m, d, 0, 0, 0)
}

/// Helper to create a candidate record
pub fn make_record(account_id: i32, timestamp: NaiveDateTime, value: Decimal) -> CandidateRecord {
    CandidateRecord {
        account_id,
        meter_reading_date_time: timestamp,
        meter_read_value: value,
    }
}

/// Helper to create a reading already in the store
pub fn make_stored(account_id: i32, timestamp: NaiveDateTime, value: Decimal) -> NewReading {
    NewReading {
        account_id,
        timestamp,
        value,
    }
}

/// Store seeded with the same accounts the service tests use: 123, 456, 600
pub fn seeded_store() -> InMemoryStore {
    InMemoryStore::new().with_accounts([
        Account::new(123, "Mohamed", "Salah"),
        Account::new(456, "Aseel", "Salah"),
        Account::new(600, "Dalida", "Salah"),
    ])
}

/// Service over a store with default config
pub fn service_for(store: InMemoryStore) -> (Arc<InMemoryStore>, MeterReadingService<InMemoryStore>) {
    let store = Arc::new(store);
    let service = MeterReadingService::new(store.clone(), IngestConfig::default());
    (store, service)
}

/// Create a CSV upload from (account, timestamp, value) cells
pub fn build_csv(rows: &[(&str, &str, &str)]) -> String {
    let mut csv = String::from(HEADER);

    for (account, timestamp, value) in rows {
        csv.push_str(&format!("{},{},{}\n", account, timestamp, value));
    }

    csv
}

/// Create a CSV upload from candidate records
pub fn csv_from_records(records: &[CandidateRecord]) -> String {
    let mut csv = String::from(HEADER);

    for r in records {
        csv.push_str(&format!(
            "{},{},{}\n",
            r.account_id,
            r.meter_reading_date_time.format("%d/%m/%Y %H:%M:%S"),
            r.meter_read_value
        ));
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_build_csv() {
        let csv = build_csv(&[("123", "06/04/2024 09:00", "54321"), ("999", "07/04/2024", "1")]);

        assert!(csv.starts_with(HEADER));
        assert!(csv.contains("123,06/04/2024 09:00,54321\n"));
        assert!(csv.contains("999,07/04/2024,1\n"));
    }

    #[test]
    fn test_csv_from_records() {
        let csv = csv_from_records(&[make_record(123, at(2024, 4, 6, 9, 30, 15), dec!(54321))]);
        assert!(csv.contains("123,06/04/2024 09:30:15,54321\n"));
    }
}
