use crate::error::StoreError;
use crate::models::NewReading;
use crate::store::ReadingStore;

/// Accepted readings waiting to be written in one round trip
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    pending: Vec<NewReading>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reading: NewReading) {
        self.pending.push(reading);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Write everything with a single bulk insert
    /// No store call is made when nothing was accepted.
    pub async fn flush<S: ReadingStore + ?Sized>(self, store: &S) -> Result<usize, StoreError> {
        if self.pending.is_empty() {
            log::debug!("No accepted readings, skipping bulk insert");
            return Ok(0);
        }

        log::debug!("Bulk inserting {} readings", self.pending.len());
        store.bulk_insert_readings(self.pending).await
    }
}
