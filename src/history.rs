use std::collections::{HashMap, HashSet};
use std::future::Future;

use chrono::NaiveDateTime;

use crate::models::{ReadingKey, StoredReading};

/// Account identifiers known to the store, captured once at batch start
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshot {
    ids: HashSet<i32>,
}

impl AccountSnapshot {
    pub fn contains(&self, account_id: i32) -> bool {
        self.ids.contains(&account_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<i32> for AccountSnapshot {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Previously persisted readings for one account
#[derive(Debug, Clone, Default)]
pub struct AccountHistory {
    /// Ordered by timestamp, oldest first
    readings: Vec<StoredReading>,
    keys: HashSet<ReadingKey>,
}

impl AccountHistory {
    pub fn from_readings(mut readings: Vec<StoredReading>) -> Self {
        readings.sort_by_key(|r| r.timestamp);
        let keys = readings.iter().map(StoredReading::key).collect();
        Self { readings, keys }
    }

    pub fn readings(&self) -> &[StoredReading] {
        &self.readings
    }

    /// True if a stored reading has the same (account, value, timestamp)
    pub fn contains(&self, key: &ReadingKey) -> bool {
        self.keys.contains(key)
    }

    /// Timestamp of the most recent stored reading
    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.readings.last().map(|r| r.timestamp)
    }
}

/// Per-batch memo of account histories
/// Filled on first touch of an account and never refetched
#[derive(Debug, Default)]
pub struct HistoryCache {
    entries: HashMap<i32, AccountHistory>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Readings for `account_id`, calling `fetch` only if this account has not been seen yet
    pub async fn readings_for<F, Fut, E>(
        &mut self,
        account_id: i32,
        fetch: F,
    ) -> Result<&AccountHistory, E>
    where
        F: FnOnce(i32) -> Fut,
        Fut: Future<Output = Result<Vec<StoredReading>, E>>,
    {
        if !self.entries.contains_key(&account_id) {
            let readings = fetch(account_id).await?;
            log::debug!(
                "Loaded {} stored readings for account {}",
                readings.len(),
                account_id
            );
            self.entries
                .insert(account_id, AccountHistory::from_readings(readings));
        }

        Ok(&*self.entries.entry(account_id).or_default())
    }

    /// Number of accounts fetched so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
