//! Error types for `salescall-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("salesperson not found: {0}")]
  SalespersonNotFound(String),

  #[error("daily record not found: {0}")]
  DailyRecordNotFound(i64),

  /// Removal refused because rows still reference the salesperson.
  #[error(
    "salesperson {name:?} still has {daily_records} daily record(s) and \
     {call_details} call detail(s)"
  )]
  SalespersonHasRecords {
    name:          String,
    daily_records: u64,
    call_details:  u64,
  },

  #[error("unknown record type: {0:?}")]
  UnknownRecordType(String),

  /// NaN or infinite. SQLite would store these as NULL.
  #[error("score is not a finite number: {0}")]
  InvalidScore(f64),

  #[error("no such month: {year}-{month:02}")]
  InvalidMonth { year: i32, month: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
