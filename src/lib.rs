pub mod accumulator;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod history;
pub mod models;
pub mod service;
pub mod store;
pub mod validator;

use std::io::{Read, Write};
use std::sync::Arc;

use config::IngestConfig;
use error::Result;
use models::ProcessingResult;
use service::MeterReadingService;
use store::ReadingStore;

/// Process one CSV batch of meter readings against a store
pub async fn process_readings<S: ReadingStore, R: Read>(
    store: Arc<S>,
    config: IngestConfig,
    reader: R,
) -> Result<ProcessingResult> {
    MeterReadingService::new(store, config)
        .process_batch(reader)
        .await
}

/// Write a processing result as pretty-printed JSON
pub fn write_result<W: Write>(result: &ProcessingResult, mut writer: W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)?;
    writer.flush()
}
