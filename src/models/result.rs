use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use super::reading::CandidateRecord;

/// Why a record was not accepted
/// The `Display` text is stable and is what callers see in the failure list
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    EmptyRecord,
    InvalidAccountId,
    ValueOutOfRange { min: Decimal, max: Decimal },
    InvalidTimestamp,
    UnknownAccount,
    Duplicate,
    NotNewer,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::EmptyRecord => f.write_str("Empty or invalid record"),
            RejectionReason::InvalidAccountId => f.write_str("AccountId is invalid."),
            RejectionReason::ValueOutOfRange { min, max } => {
                write!(f, "MeterReadValue must be between {} and {}.", min, max)
            }
            RejectionReason::InvalidTimestamp => f.write_str("Invalid date time format."),
            RejectionReason::UnknownAccount => f.write_str("Account does not exist"),
            RejectionReason::Duplicate => f.write_str("Duplicate reading"),
            RejectionReason::NotNewer => f.write_str("Reading is older or equal to the latest one"),
        }
    }
}

impl Serialize for RejectionReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One rejected record and the reason it was rejected
#[derive(Debug, Clone, Serialize)]
pub struct FailureDetail {
    /// `None` when the row carried no data at all
    pub reading: Option<CandidateRecord>,
    pub reason: RejectionReason,
}

/// Outcome of one batch: counts plus failures in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingResult {
    #[serde(rename = "successfulReadings")]
    pub successful: usize,
    #[serde(rename = "failedReadings")]
    pub failed: usize,
    pub failures: Vec<FailureDetail>,
}

impl ProcessingResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an accepted record
    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    /// Count a rejected record, keeping input order
    pub fn record_failure(&mut self, reading: Option<CandidateRecord>, reason: RejectionReason) {
        self.failed += 1;
        self.failures.push(FailureDetail { reading, reason });
    }

    /// Emit one warning per failure
    pub fn log_failures(&self) {
        for failure in &self.failures {
            match &failure.reading {
                Some(r) => log::warn!(
                    "Failed to process reading: account={} timestamp={} value={}, reason: {}",
                    r.account_id,
                    r.meter_reading_date_time,
                    r.meter_read_value,
                    failure.reason
                ),
                None => log::warn!("Failed to process reading: <empty>, reason: {}", failure.reason),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_reason_strings() {
        assert_eq!(
            RejectionReason::ValueOutOfRange {
                min: Decimal::ZERO,
                max: Decimal::from(99999),
            }
            .to_string(),
            "MeterReadValue must be between 0 and 99999."
        );
        assert_eq!(RejectionReason::Duplicate.to_string(), "Duplicate reading");
        assert_eq!(
            RejectionReason::NotNewer.to_string(),
            "Reading is older or equal to the latest one"
        );
    }

    #[test]
    fn test_failures_keep_order() {
        let mut result = ProcessingResult::new();
        result.record_failure(None, RejectionReason::EmptyRecord);
        result.record_success();
        result.record_failure(None, RejectionReason::UnknownAccount);

        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(result.failures[0].reason, RejectionReason::EmptyRecord);
        assert_eq!(result.failures[1].reason, RejectionReason::UnknownAccount);
    }

    #[test]
    fn test_serializes_reason_as_text() {
        let mut result = ProcessingResult::new();
        result.record_failure(None, RejectionReason::UnknownAccount);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["successfulReadings"], 0);
        assert_eq!(json["failedReadings"], 1);
        assert_eq!(json["failures"][0]["reason"], "Account does not exist");
        assert!(json["failures"][0]["reading"].is_null());
    }
}
