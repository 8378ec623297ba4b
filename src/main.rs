use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use meter_readings::config::IngestConfig;
use meter_readings::decoder::RecordDecoder;
use meter_readings::models::{read_accounts, NewReading};
use meter_readings::store::InMemoryStore;
use meter_readings::{process_readings, write_result};
use rust_decimal::Decimal;
use simple_logger::SimpleLogger;

/// Validate and ingest a CSV batch of meter readings
#[derive(Parser, Debug)]
#[command(name = "meter-readings", version)]
struct Cli {
    /// Readings to ingest (AccountId,MeterReadingDateTime,MeterReadValue)
    readings: PathBuf,

    /// Known accounts (AccountId,FirstName,LastName)
    #[arg(short, long)]
    accounts: PathBuf,

    /// Previously stored readings, same layout as the input
    #[arg(long)]
    history: Option<PathBuf>,

    /// JSON file with minMeterReadingValue / maxMeterReadingValue
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lowest accepted reading value
    #[arg(long, env = "METER_READING_MIN_VALUE")]
    min_value: Option<Decimal>,

    /// Highest accepted reading value
    #[arg(long, env = "METER_READING_MAX_VALUE")]
    max_value: Option<Decimal>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = SimpleLogger::new().env();
    if cli.verbose {
        logger = logger.with_level(LevelFilter::Debug);
    }
    logger.init().context("Failed to initialise logger")?;

    let config = load_config(&cli)?;
    log::debug!("Using value range {}..={}", config.min_value, config.max_value);

    let store = Arc::new(build_store(&cli)?);

    let input = File::open(&cli.readings)
        .with_context(|| format!("Failed to open readings file '{}'", cli.readings.display()))?;

    let result = process_readings(store, config, input)
        .await
        .with_context(|| format!("Failed to ingest '{}'", cli.readings.display()))?;

    write_result(&result, io::stdout()).context("Failed to write result")?;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<IngestConfig> {
    let base = match &cli.config {
        Some(path) => IngestConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => IngestConfig::default(),
    };

    base.with_overrides(cli.min_value, cli.max_value)
        .context("Invalid value range")
}

fn build_store(cli: &Cli) -> Result<InMemoryStore> {
    let file = File::open(&cli.accounts)
        .with_context(|| format!("Failed to open accounts file '{}'", cli.accounts.display()))?;
    let accounts = read_accounts(file)
        .with_context(|| format!("Failed to read accounts from '{}'", cli.accounts.display()))?;
    log::debug!("Loaded {} accounts", accounts.len());

    let mut store = InMemoryStore::new().with_accounts(accounts);

    if let Some(path) = &cli.history {
        let readings = read_history(path)?;
        log::debug!("Loaded {} stored readings", readings.len());
        store = store.with_readings(readings);
    }

    Ok(store)
}

fn read_history(path: &Path) -> Result<Vec<NewReading>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open history file '{}'", path.display()))?;

    let mut readings = Vec::new();
    for decoded in RecordDecoder::new(file)? {
        if let Some(record) = decoded? {
            readings.push(record.to_new_reading());
        }
    }

    Ok(readings)
}
