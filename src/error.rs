use thiserror::Error;

/// Structural problems with the uploaded file
/// Any of these voids the whole batch: nothing is validated further and nothing is persisted
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("input is empty")]
    EmptyInput,

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors reported by a reading store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("bulk insert of {count} readings rejected: {reason}")]
    InsertRejected { count: usize, reason: String },
}

/// Errors that end a batch without a per-record result
/// Business rule rejections are never reported here, they are data in the result
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV file format is invalid. Please check headers and data format.")]
    MalformedInput(#[from] DecodeError),

    #[error("reading store failure: {0}")]
    Store(#[from] StoreError),

    #[error("batch cancelled before readings were persisted")]
    Cancelled,
}

/// Invalid ingestion configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("minimum value {min} is greater than maximum value {max}")]
    InvalidRange {
        min: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
