//! Daily records: the per-salesperson, per-date aggregate of a day's calls.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::detail::RecordType;

// ─── Persisted record ────────────────────────────────────────────────────────

/// One row per (salesperson, date). The pair is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCallRecord {
  pub id:                      i64,
  pub salesperson_id:          i64,
  pub upload_date:             NaiveDate,
  pub total_calls:             u32,
  pub effective_calls:         u32,
  /// Mean score of the day's scored calls, two-decimal precision.
  pub average_score:           Option<f64>,
  pub summary_analysis:        Option<String>,
  pub improvement_suggestions: Option<String>,
  /// Number of source files ingestion consumed for this day.
  pub processed_files:         u32,
  pub audio:                   ChannelCounts,
  pub image:                   ChannelCounts,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              DateTime<Utc>,
}

impl DailyCallRecord {
  pub fn channel(&self, record_type: RecordType) -> ChannelCounts {
    match record_type {
      RecordType::Audio => self.audio,
      RecordType::Image => self.image,
    }
  }
}

/// Input for a strict insert of a daily record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDailyRecord {
  pub salesperson_id:          i64,
  pub upload_date:             NaiveDate,
  pub total_calls:             u32,
  pub effective_calls:         u32,
  pub average_score:           Option<f64>,
  pub summary_analysis:        Option<String>,
  pub improvement_suggestions: Option<String>,
  pub processed_files:         u32,
}

impl NewDailyRecord {
  /// An empty day for `salesperson_id`.
  pub fn new(salesperson_id: i64, upload_date: NaiveDate) -> Self {
    Self {
      salesperson_id,
      upload_date,
      total_calls: 0,
      effective_calls: 0,
      average_score: None,
      summary_analysis: None,
      improvement_suggestions: None,
      processed_files: 0,
    }
  }
}

// ─── Update inputs ───────────────────────────────────────────────────────────

/// Call and effective-call counters for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounts {
  pub calls:           u32,
  pub effective_calls: u32,
}

impl ChannelCounts {
  pub fn new(calls: u32, effective_calls: u32) -> Self { Self { calls, effective_calls } }
}

/// How channel counters are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
  /// Overwrite the stored counters (a day re-uploaded from scratch).
  Reset,
  /// Add to the stored counters (more calls for a day already on file).
  Accumulate,
}

/// How analysis texts are written by a stats update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
  Replace,
  /// Keep the stored summary and suggestions and append the new ones as a
  /// timestamped section.
  Append,
}
