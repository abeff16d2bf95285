//! Monthly per-salesperson call totals.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One salesperson's summed daily records for a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
  pub salesperson_id:  i64,
  pub salesperson:     String,
  pub total_calls:     u64,
  pub effective_calls: u64,
  /// Effective calls as a percentage of all calls; 0 when there were none.
  pub effective_rate:  f64,
}

impl MonthlySummary {
  pub fn new(
    salesperson_id: i64,
    salesperson: String,
    total_calls: u64,
    effective_calls: u64,
  ) -> Self {
    Self {
      salesperson_id,
      salesperson,
      total_calls,
      effective_calls,
      effective_rate: effective_rate(effective_calls, total_calls),
    }
  }
}

pub fn effective_rate(effective_calls: u64, total_calls: u64) -> f64 {
  if total_calls == 0 {
    0.0
  } else {
    effective_calls as f64 / total_calls as f64 * 100.0
  }
}

/// The half-open date range `[first day, first day of next month)`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
  let invalid = || Error::InvalidMonth { year, month };
  let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
  let end = start.checked_add_months(Months::new(1)).ok_or_else(invalid)?;
  Ok((start, end))
}
