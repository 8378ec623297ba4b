use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::history::{AccountHistory, AccountSnapshot};
use crate::models::{CandidateRecord, NewReading, ReadingKey, RejectionReason};

/// Duplicate and ordering decisions for one batch
///
/// Records must be fed in input order: the in-batch duplicate set and the
/// per-account latest timestamps depend on what came before.
pub struct ReadingEngine {
    /// Accounts known to the store at batch start
    accounts: AccountSnapshot,
    /// Composite keys already seen in this batch, whether accepted or not
    seen_keys: HashSet<ReadingKey>,
    /// Latest accepted timestamp per account in this batch
    latest_in_batch: HashMap<i32, NaiveDateTime>,
}

impl ReadingEngine {
    /// Create an engine over an account snapshot
    pub fn new(accounts: AccountSnapshot) -> Self {
        Self {
            accounts,
            seen_keys: HashSet::new(),
            latest_in_batch: HashMap::new(),
        }
    }

    /// Reject records for accounts the store does not know about
    pub fn check_account(&self, account_id: i32) -> Result<(), RejectionReason> {
        if !self.accounts.contains(account_id) {
            return Err(RejectionReason::UnknownAccount);
        }
        Ok(())
    }

    /// Decide whether a validated record for a known account is accepted
    ///
    /// `history` must be the stored readings of the record's account.
    pub fn classify(
        &mut self,
        record: &CandidateRecord,
        history: &AccountHistory,
    ) -> Result<NewReading, RejectionReason> {
        let key = record.key();

        // Both sides are evaluated so the key is remembered even when the store already has it
        let duplicate_in_store = history.contains(&key);
        let duplicate_in_batch = !self.seen_keys.insert(key);

        if duplicate_in_store || duplicate_in_batch {
            return Err(RejectionReason::Duplicate);
        }

        let in_batch = self.latest_in_batch.get(&record.account_id).copied();
        if let Some(latest) = resolve_latest(history.latest(), in_batch) {
            if record.meter_reading_date_time <= latest {
                return Err(RejectionReason::NotNewer);
            }
        }

        let reading = record.to_new_reading();

        let advances = in_batch.map_or(true, |current| reading.timestamp > current);
        if advances {
            self.latest_in_batch
                .insert(reading.account_id, reading.timestamp);
        }

        Ok(reading)
    }

    /// Latest accepted timestamp for an account in this batch
    pub fn latest_in_batch(&self, account_id: i32) -> Option<NaiveDateTime> {
        self.latest_in_batch.get(&account_id).copied()
    }
}

/// The later of the stored latest and the in-batch latest, if either exists
/// Ties return the in-batch side; both timestamps are equal so callers cannot tell.
pub fn resolve_latest(
    stored: Option<NaiveDateTime>,
    in_batch: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    // `None` orders below any `Some`
    stored.max(in_batch)
}
