pub mod account;
pub mod reading;
pub mod result;

pub use account::{read_accounts, Account};
pub use reading::{CandidateRecord, NewReading, ReadingKey, StoredReading};
pub use result::{FailureDetail, ProcessingResult, RejectionReason};
