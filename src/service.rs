use std::future::Future;
use std::io::Read;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::accumulator::BatchAccumulator;
use crate::config::IngestConfig;
use crate::decoder::RecordDecoder;
use crate::engine::ReadingEngine;
use crate::error::{DecodeError, IngestError, Result, StoreError};
use crate::history::{AccountSnapshot, HistoryCache};
use crate::models::ProcessingResult;
use crate::store::ReadingStore;
use crate::validator::Validator;

/// What the decode-and-classify pass produced
///
/// A structural problem anywhere in the input voids every classification made
/// before it, so it is a separate outcome rather than one more failure entry.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The input could not be decoded; nothing may be persisted
    Malformed(DecodeError),
    /// Every row was decoded and classified
    Classified {
        result: ProcessingResult,
        accepted: BatchAccumulator,
    },
}

/// Ingests batches of meter readings into a store
///
/// # Batch flow
///
/// 1. Check the header row
/// 2. Fetch the account snapshot (once)
/// 3. For each row in order: decode, validate, check the account, load the
///    account's history on first touch, then apply duplicate and ordering rules
/// 4. Log each failure
/// 5. Write all accepted readings with one bulk insert
///
/// # Cancellation
///
/// The cancellation token is only observed around store calls. A cancelled
/// batch never reaches the bulk insert, so it writes nothing.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use meter_readings::config::IngestConfig;
/// use meter_readings::models::Account;
/// use meter_readings::service::MeterReadingService;
/// use meter_readings::store::InMemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = Arc::new(InMemoryStore::new().with_accounts([Account::new(123, "Tommy", "Test")]));
/// let service = MeterReadingService::new(store.clone(), IngestConfig::default());
///
/// let csv = "AccountId,MeterReadingDateTime,MeterReadValue\n\
///            123,06/04/2024 09:00,54321\n\
///            999,06/04/2024 09:00,12345\n";
///
/// let result = service.process_batch(csv.as_bytes()).await.unwrap();
/// assert_eq!(result.successful, 1);
/// assert_eq!(result.failed, 1);
/// assert_eq!(store.bulk_inserts(), 1);
/// # }
/// ```
pub struct MeterReadingService<S: ReadingStore> {
    store: Arc<S>,
    validator: Validator,
    cancel: CancellationToken,
}

impl<S: ReadingStore> MeterReadingService<S> {
    pub fn new(store: Arc<S>, config: IngestConfig) -> Self {
        Self {
            store,
            validator: Validator::new(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Decode and classify every row without persisting anything
    ///
    /// Store failures and cancellation are returned as `Err`; structural input
    /// problems are returned as `BatchOutcome::Malformed`.
    pub async fn classify<R: Read>(&self, input: R) -> Result<BatchOutcome> {
        let decoder = match RecordDecoder::new(input) {
            Ok(decoder) => decoder,
            Err(e) => return Ok(BatchOutcome::Malformed(e)),
        };

        let account_ids = self.guarded(self.store.list_account_ids()).await?;
        let snapshot: AccountSnapshot = account_ids.into_iter().collect();
        log::debug!("Account snapshot holds {} accounts", snapshot.len());

        let mut engine = ReadingEngine::new(snapshot);
        let mut history = HistoryCache::new();
        let mut accepted = BatchAccumulator::new();
        let mut result = ProcessingResult::new();

        for decoded in decoder {
            let decoded = match decoded {
                Ok(decoded) => decoded,
                Err(e) => return Ok(BatchOutcome::Malformed(e)),
            };

            if let Err(reason) = self.validator.validate(decoded.as_ref()) {
                result.record_failure(decoded, reason);
                continue;
            }
            // Validation rejects empty rows
            let Some(record) = decoded else { continue };

            if let Err(reason) = engine.check_account(record.account_id) {
                result.record_failure(Some(record), reason);
                continue;
            }

            let account_history = history
                .readings_for(record.account_id, |account_id| {
                    self.guarded(self.store.list_readings_for_account(account_id))
                })
                .await?;

            match engine.classify(&record, account_history) {
                Ok(reading) => {
                    accepted.push(reading);
                    result.record_success();
                }
                Err(reason) => result.record_failure(Some(record), reason),
            }
        }

        log::debug!(
            "Classified batch: {} accepted, {} rejected, {} account histories loaded",
            result.successful,
            result.failed,
            history.len()
        );

        Ok(BatchOutcome::Classified { result, accepted })
    }

    /// Process one uploaded batch and persist the accepted readings
    ///
    /// Returns the per-record result, or a single error when the input is
    /// malformed, the store fails, or the batch is cancelled. In every error
    /// case nothing has been written.
    pub async fn process_batch<R: Read>(&self, input: R) -> Result<ProcessingResult> {
        let (result, accepted) = match self.classify(input).await? {
            BatchOutcome::Malformed(e) => {
                log::error!("Failed to parse CSV file: {}", e);
                return Err(IngestError::MalformedInput(e));
            }
            BatchOutcome::Classified { result, accepted } => (result, accepted),
        };

        result.log_failures();

        if self.cancel.is_cancelled() {
            log::warn!(
                "Batch cancelled, discarding {} accepted readings",
                accepted.len()
            );
            return Err(IngestError::Cancelled);
        }

        let written = accepted.flush(self.store.as_ref()).await.map_err(|e| {
            log::error!("Failed to persist readings: {}", e);
            IngestError::Store(e)
        })?;

        log::info!(
            "Processed batch: {} successful, {} failed, {} persisted",
            result.successful,
            result.failed,
            written
        );

        Ok(result)
    }

    /// Run a store call unless the batch is cancelled first
    async fn guarded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(IngestError::Cancelled),
            outcome = call => outcome.map_err(IngestError::from),
        }
    }
}
