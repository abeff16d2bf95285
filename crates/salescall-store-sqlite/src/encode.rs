//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with millisecond precision, dates are
//! `YYYY-MM-DD`, and record types are their lowercase names.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use salescall_core::{
  daily::{ChannelCounts, DailyCallRecord},
  detail::{CallDetail, RecordType},
  salesperson::Salesperson,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Same shape as the schema's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Millis, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SALESPERSON_COLUMNS: &str = "id, name, created_at, updated_at";

/// Raw values read directly from a `salespersons` row.
pub struct RawSalesperson {
  pub id:         i64,
  pub name:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawSalesperson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
      updated_at: row.get(3)?,
    })
  }

  pub fn into_salesperson(self) -> Result<Salesperson> {
    Ok(Salesperson {
      id:         self.id,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const DAILY_COLUMNS: &str = "id, salesperson_id, upload_date, total_calls, effective_calls,
  average_score, summary_analysis, improvement_suggestions, processed_files,
  audio_calls, audio_effective_calls, image_calls, image_effective_calls,
  created_at, updated_at";

/// Raw values read directly from a `daily_call_records` row.
pub struct RawDailyRecord {
  pub id:                      i64,
  pub salesperson_id:          i64,
  pub upload_date:             String,
  pub total_calls:             u32,
  pub effective_calls:         u32,
  pub average_score:           Option<f64>,
  pub summary_analysis:        Option<String>,
  pub improvement_suggestions: Option<String>,
  pub processed_files:         u32,
  pub audio:                   ChannelCounts,
  pub image:                   ChannelCounts,
  pub created_at:              String,
  pub updated_at:              String,
}

impl RawDailyRecord {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                      row.get(0)?,
      salesperson_id:          row.get(1)?,
      upload_date:             row.get(2)?,
      total_calls:             row.get(3)?,
      effective_calls:         row.get(4)?,
      average_score:           row.get(5)?,
      summary_analysis:        row.get(6)?,
      improvement_suggestions: row.get(7)?,
      processed_files:         row.get(8)?,
      audio:                   ChannelCounts::new(row.get(9)?, row.get(10)?),
      image:                   ChannelCounts::new(row.get(11)?, row.get(12)?),
      created_at:              row.get(13)?,
      updated_at:              row.get(14)?,
    })
  }

  pub fn into_record(self) -> Result<DailyCallRecord> {
    Ok(DailyCallRecord {
      id:                      self.id,
      salesperson_id:          self.salesperson_id,
      upload_date:             decode_date(&self.upload_date)?,
      total_calls:             self.total_calls,
      effective_calls:         self.effective_calls,
      average_score:           self.average_score,
      summary_analysis:        self.summary_analysis,
      improvement_suggestions: self.improvement_suggestions,
      processed_files:         self.processed_files,
      audio:                   self.audio,
      image:                   self.image,
      created_at:              decode_dt(&self.created_at)?,
      updated_at:              decode_dt(&self.updated_at)?,
    })
  }
}

pub const DETAIL_COLUMNS: &str = "id, daily_record_id, salesperson_id, original_filename,
  company_name, contact_person, phone_number, score, is_effective,
  conversation_text, analysis_text, suggestions, record_type, created_at";

/// Raw values read directly from a `call_details` row.
pub struct RawCallDetail {
  pub id:                i64,
  pub daily_record_id:   i64,
  pub salesperson_id:    i64,
  pub original_filename: Option<String>,
  pub company_name:      Option<String>,
  pub contact_person:    Option<String>,
  pub phone_number:      Option<String>,
  pub score:             Option<f64>,
  pub is_effective:      bool,
  pub conversation_text: Option<String>,
  pub analysis_text:     Option<String>,
  pub suggestions:       Option<String>,
  pub record_type:       String,
  pub created_at:        String,
}

impl RawCallDetail {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      daily_record_id:   row.get(1)?,
      salesperson_id:    row.get(2)?,
      original_filename: row.get(3)?,
      company_name:      row.get(4)?,
      contact_person:    row.get(5)?,
      phone_number:      row.get(6)?,
      score:             row.get(7)?,
      is_effective:      row.get(8)?,
      conversation_text: row.get(9)?,
      analysis_text:     row.get(10)?,
      suggestions:       row.get(11)?,
      record_type:       row.get(12)?,
      created_at:        row.get(13)?,
    })
  }

  pub fn into_detail(self) -> Result<CallDetail> {
    Ok(CallDetail {
      id:                self.id,
      daily_record_id:   self.daily_record_id,
      salesperson_id:    self.salesperson_id,
      original_filename: self.original_filename,
      company_name:      self.company_name,
      contact_person:    self.contact_person,
      phone_number:      self.phone_number,
      score:             self.score,
      is_effective:      self.is_effective,
      conversation_text: self.conversation_text,
      analysis_text:     self.analysis_text,
      suggestions:       self.suggestions,
      record_type:       self.record_type.parse::<RecordType>()?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_match_the_schema_shape() {
    let dt = Utc.with_ymd_and_hms(2025, 3, 1, 8, 5, 9).unwrap();
    assert_eq!(encode_dt(dt), "2025-03-01T08:05:09.000Z");
    assert_eq!(decode_dt("2025-03-01T08:05:09.000Z").unwrap(), dt);
  }

  #[test]
  fn decode_dt_reports_the_bad_input() {
    let err = decode_dt("yesterday").unwrap_err();
    assert!(matches!(err, Error::DateParse(ref m) if m.contains("yesterday")));
  }

  #[test]
  fn dates_are_iso_days() {
    let d = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
    assert_eq!(encode_date(d), "2025-12-31");
    assert_eq!(decode_date("2025-12-31").unwrap(), d);
    assert!(decode_date("31/12/2025").is_err());
  }
}
