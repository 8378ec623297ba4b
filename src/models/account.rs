use std::io::Read;

use serde::Deserialize;

/// Customer account. Only the identifier matters to ingestion.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Account {
    #[serde(rename = "AccountId")]
    pub account_id: i32,
    #[serde(rename = "FirstName", default)]
    pub first_name: String,
    #[serde(rename = "LastName", default)]
    pub last_name: String,
}

impl Account {
    pub fn new(account_id: i32, first_name: &str, last_name: &str) -> Self {
        Self {
            account_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }
}

/// Read accounts from a CSV with an `AccountId,FirstName,LastName` header
pub fn read_accounts<R: Read>(reader: R) -> Result<Vec<Account>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize().collect()
}
