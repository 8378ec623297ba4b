use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Account, NewReading, StoredReading};

/// Storage the ingestion core reads from and writes to
///
/// The core calls each method at most:
/// - `list_account_ids`: once per batch
/// - `list_readings_for_account`: once per distinct account touched by a batch
/// - `bulk_insert_readings`: once per batch, and only when something was accepted
///
/// # Atomicity
///
/// `bulk_insert_readings` must be all-or-nothing. The core treats an `Err` as
/// "nothing was written" and reports the whole batch as failed.
///
/// # Concurrency
///
/// Nothing here isolates concurrent batches from each other. Two batches running
/// against the same store see the account and reading state as it was when each
/// of them fetched it. Deployments that ingest concurrently must serialize
/// ingestion per account themselves or accept the risk of duplicates.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Identifiers of every known account
    async fn list_account_ids(&self) -> Result<Vec<i32>, StoreError>;

    /// Stored readings for one account, oldest first
    async fn list_readings_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<StoredReading>, StoreError>;

    /// Persist readings as one unit. Returns the number of rows written.
    async fn bulk_insert_readings(&self, readings: Vec<NewReading>) -> Result<usize, StoreError>;
}

/// Store kept entirely in memory
///
/// Used by the CLI and by tests. Call counters make round trips observable:
///
/// ```
/// use meter_readings::models::Account;
/// use meter_readings::store::{InMemoryStore, ReadingStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = InMemoryStore::new().with_accounts([Account::new(2344, "Tommy", "Test")]);
///
/// let readings = store.list_readings_for_account(2344).await.unwrap();
/// assert!(readings.is_empty());
/// assert_eq!(store.history_fetches(), 1);
/// # }
/// ```
pub struct InMemoryStore {
    accounts: RwLock<BTreeMap<i32, Account>>,
    readings: RwLock<Vec<StoredReading>>,
    next_id: AtomicU64,
    history_fetches: AtomicUsize,
    bulk_inserts: AtomicUsize,
    fail_inserts: AtomicBool,
    fail_account_fetch: AtomicBool,
    fail_history_fetch: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            readings: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            history_fetches: AtomicUsize::new(0),
            bulk_inserts: AtomicUsize::new(0),
            fail_inserts: AtomicBool::new(false),
            fail_account_fetch: AtomicBool::new(false),
            fail_history_fetch: AtomicBool::new(false),
        }
    }

    /// Add accounts before the store is shared
    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = Account>) -> Self {
        let map = self.accounts.get_mut();
        for account in accounts {
            map.insert(account.account_id, account);
        }
        self
    }

    /// Add previously stored readings before the store is shared
    /// Does not count as a bulk insert.
    pub fn with_readings(mut self, readings: impl IntoIterator<Item = NewReading>) -> Self {
        let stored: Vec<StoredReading> = readings
            .into_iter()
            .map(|r| StoredReading::new(self.next_id.fetch_add(1, Ordering::Relaxed), r))
            .collect();
        self.readings.get_mut().extend(stored);
        self
    }

    /// Make every following bulk insert fail
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::Relaxed);
    }

    /// Make `list_account_ids` report the store as unavailable
    pub fn set_fail_account_fetch(&self, fail: bool) {
        self.fail_account_fetch.store(fail, Ordering::Relaxed);
    }

    /// Make `list_readings_for_account` report the store as unavailable
    pub fn set_fail_history_fetch(&self, fail: bool) {
        self.fail_history_fetch.store(fail, Ordering::Relaxed);
    }

    /// Number of `list_readings_for_account` calls served
    pub fn history_fetches(&self) -> usize {
        self.history_fetches.load(Ordering::Relaxed)
    }

    /// Number of successful `bulk_insert_readings` calls
    pub fn bulk_inserts(&self) -> usize {
        self.bulk_inserts.load(Ordering::Relaxed)
    }

    /// Copy of every stored reading, in insertion order
    pub async fn all_readings(&self) -> Vec<StoredReading> {
        self.readings.read().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingStore for InMemoryStore {
    async fn list_account_ids(&self) -> Result<Vec<i32>, StoreError> {
        if self.fail_account_fetch.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("account lookup disabled".to_string()));
        }

        Ok(self.accounts.read().await.keys().copied().collect())
    }

    async fn list_readings_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<StoredReading>, StoreError> {
        if self.fail_history_fetch.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable(format!(
                "reading lookup for account {} disabled",
                account_id
            )));
        }

        self.history_fetches.fetch_add(1, Ordering::Relaxed);

        let mut readings: Vec<StoredReading> = self
            .readings
            .read()
            .await
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        readings.sort_by_key(|r| r.timestamp);

        Ok(readings)
    }

    async fn bulk_insert_readings(&self, readings: Vec<NewReading>) -> Result<usize, StoreError> {
        let count = readings.len();

        if self.fail_inserts.load(Ordering::Relaxed) {
            return Err(StoreError::InsertRejected {
                count,
                reason: "inserts disabled".to_string(),
            });
        }

        // Foreign key check covers the whole set before anything is written
        {
            let accounts = self.accounts.read().await;
            if let Some(orphan) = readings
                .iter()
                .find(|r| !accounts.contains_key(&r.account_id))
            {
                return Err(StoreError::InsertRejected {
                    count,
                    reason: format!("account {} does not exist", orphan.account_id),
                });
            }
        }

        let mut stored = self.readings.write().await;
        for reading in readings {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            stored.push(StoredReading::new(id, reading));
        }

        self.bulk_inserts.fetch_add(1, Ordering::Relaxed);
        Ok(count)
    }
}
