use crate::config::IngestConfig;
use crate::models::reading::unset_timestamp;
use crate::models::{CandidateRecord, RejectionReason};

/// Stateless per-record checks. No I/O, no batch or store state.
#[derive(Debug, Clone)]
pub struct Validator {
    config: IngestConfig,
}

impl Validator {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Check a decoded record. The first failing rule is the one reported.
    pub fn validate(&self, record: Option<&CandidateRecord>) -> Result<(), RejectionReason> {
        let record = record.ok_or(RejectionReason::EmptyRecord)?;

        if record.account_id <= 0 {
            return Err(RejectionReason::InvalidAccountId);
        }

        let value = record.meter_read_value;
        if value < self.config.min_value || value > self.config.max_value {
            return Err(RejectionReason::ValueOutOfRange {
                min: self.config.min_value,
                max: self.config.max_value,
            });
        }

        if Some(record.meter_reading_date_time) == unset_timestamp() {
            return Err(RejectionReason::InvalidTimestamp);
        }

        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}
