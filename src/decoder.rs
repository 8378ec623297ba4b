use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::DecodeError;
use crate::models::reading::parse_timestamp;
use crate::models::CandidateRecord;

pub const ACCOUNT_ID_COLUMN: &str = "AccountId";
pub const TIMESTAMP_COLUMN: &str = "MeterReadingDateTime";
pub const VALUE_COLUMN: &str = "MeterReadValue";

const REQUIRED_COLUMNS: [&str; 3] = [ACCOUNT_ID_COLUMN, TIMESTAMP_COLUMN, VALUE_COLUMN];

/// Row as it appears in the file, before typing
/// Columns are matched by header name so their order does not matter
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "AccountId")]
    account_id: String,
    #[serde(rename = "MeterReadingDateTime")]
    timestamp: String,
    #[serde(rename = "MeterReadValue")]
    value: String,
}

impl RawRecord {
    fn is_blank(&self) -> bool {
        self.account_id.is_empty() && self.timestamp.is_empty() && self.value.is_empty()
    }

    fn into_candidate(self, line: u64) -> Result<CandidateRecord, DecodeError> {
        let account_id = self
            .account_id
            .parse::<i32>()
            .map_err(|_| invalid(line, ACCOUNT_ID_COLUMN, &self.account_id))?;

        let meter_reading_date_time = parse_timestamp(&self.timestamp)
            .ok_or_else(|| invalid(line, TIMESTAMP_COLUMN, &self.timestamp))?;

        let meter_read_value = Decimal::from_str(&self.value)
            .map_err(|_| invalid(line, VALUE_COLUMN, &self.value))?;

        Ok(CandidateRecord {
            account_id,
            meter_reading_date_time,
            meter_read_value,
        })
    }
}

fn invalid(line: u64, field: &'static str, value: &str) -> DecodeError {
    DecodeError::InvalidField {
        line,
        field,
        value: value.to_string(),
    }
}

/// Lazily turns CSV input into candidate records, one per data row, in input order
///
/// Yields `Ok(None)` for a row whose cells are all empty. The first structural
/// problem is yielded as `Err` and ends the sequence.
pub struct RecordDecoder<R: Read> {
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
    row: csv::StringRecord,
    finished: bool,
}

impl<R: Read> RecordDecoder<R> {
    /// Read and check the header row
    pub fn new(input: R) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(DecodeError::EmptyInput);
        }

        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h == **column))
        {
            return Err(DecodeError::MissingColumn(*missing));
        }

        Ok(Self {
            reader,
            headers,
            row: csv::StringRecord::new(),
            finished: false,
        })
    }

    fn decode_next(&mut self) -> Result<Option<Option<CandidateRecord>>, DecodeError> {
        if !self.reader.read_record(&mut self.row)? {
            return Ok(None);
        }

        let line = self.row.position().map_or(0, |p| p.line());
        let raw: RawRecord = self.row.deserialize(Some(&self.headers))?;

        if raw.is_blank() {
            return Ok(Some(None));
        }

        raw.into_candidate(line).map(|candidate| Some(Some(candidate)))
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<Option<CandidateRecord>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.decode_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
