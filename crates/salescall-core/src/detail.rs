//! Call details: one row per individual call.
//!
//! Details are written once by ingestion and never updated. Each one points
//! at its daily aggregate and, redundantly, at the salesperson so that
//! per-salesperson lookups need no join.

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Record type ─────────────────────────────────────────────────────────────

/// The medium a call was captured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
  /// A recorded phone call, transcribed from audio.
  #[default]
  Audio,
  /// A call log recovered from a screenshot.
  Image,
}

impl RecordType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Audio => "audio",
      Self::Image => "image",
    }
  }
}

impl fmt::Display for RecordType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for RecordType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "audio" => Ok(Self::Audio),
      "image" => Ok(Self::Image),
      other => Err(Error::UnknownRecordType(other.to_owned())),
    }
  }
}

// ─── Call detail ─────────────────────────────────────────────────────────────

/// A persisted call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDetail {
  pub id:                i64,
  pub daily_record_id:   i64,
  pub salesperson_id:    i64,
  pub original_filename: Option<String>,
  pub company_name:      Option<String>,
  pub contact_person:    Option<String>,
  pub phone_number:      Option<String>,
  /// 0–100 when present; the store rejects anything outside that range.
  pub score:             Option<f64>,
  pub is_effective:      bool,
  pub conversation_text: Option<String>,
  pub analysis_text:     Option<String>,
  pub suggestions:       Option<String>,
  pub record_type:       RecordType,
  pub created_at:        DateTime<Utc>,
}

/// Input for recording a call. Identifiers and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCallDetail {
  pub original_filename: Option<String>,
  pub company_name:      Option<String>,
  pub contact_person:    Option<String>,
  pub phone_number:      Option<String>,
  pub score:             Option<f64>,
  pub is_effective:      bool,
  pub conversation_text: Option<String>,
  pub analysis_text:     Option<String>,
  pub suggestions:       Option<String>,
  pub record_type:       RecordType,
}

impl NewCallDetail {
  /// A call read from `filename`, with every other field empty.
  pub fn from_file(filename: impl Into<String>) -> Self {
    Self { original_filename: Some(filename.into()), ..Self::default() }
  }

  pub fn with_score(mut self, score: f64) -> Self {
    self.score = Some(score);
    self
  }

  pub fn effective(mut self, is_effective: bool) -> Self {
    self.is_effective = is_effective;
    self
  }

  pub fn with_record_type(mut self, record_type: RecordType) -> Self {
    self.record_type = record_type;
    self
  }
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

/// A candidate filename that was already uploaded for the same salesperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateFile {
  pub filename:         String,
  /// Date of the most recent upload carrying this filename.
  pub last_upload_date: NaiveDate,
  pub days_ago:         i64,
}

/// Result of [`CallStore::check_duplicate_filenames`](crate::store::CallStore::check_duplicate_filenames).
///
/// Both lists keep the order of the candidate filenames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
  pub duplicates: Vec<DuplicateFile>,
  pub new_files:  Vec<String>,
}

impl DuplicateReport {
  /// Split `candidates` against earlier uploads, given as
  /// `(filename, uploaded_at)` pairs. Matching is exact; when a filename was
  /// uploaded more than once the latest upload is reported.
  pub fn classify<I>(candidates: &[String], previous_uploads: I, today: NaiveDate) -> Self
  where
    I: IntoIterator<Item = (String, DateTime<Utc>)>,
  {
    let mut last_seen: HashMap<String, NaiveDate> = HashMap::new();
    for (filename, uploaded_at) in previous_uploads {
      let day = uploaded_at.date_naive();
      last_seen
        .entry(filename)
        .and_modify(|d| *d = (*d).max(day))
        .or_insert(day);
    }

    let mut report = Self::default();
    for filename in candidates {
      match last_seen.get(filename) {
        Some(&last_upload_date) => report.duplicates.push(DuplicateFile {
          filename: filename.clone(),
          last_upload_date,
          days_ago: (today - last_upload_date).num_days(),
        }),
        None => report.new_files.push(filename.clone()),
      }
    }
    report
  }

  pub fn has_duplicates(&self) -> bool { !self.duplicates.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_type_parses_its_own_names() {
    for rt in [RecordType::Audio, RecordType::Image] {
      assert_eq!(rt.as_str().parse::<RecordType>().unwrap(), rt);
    }
  }

  #[test]
  fn record_type_rejects_unknown_names() {
    let err = "video".parse::<RecordType>().unwrap_err();
    assert!(matches!(err, Error::UnknownRecordType(ref s) if s == "video"));
  }

  #[test]
  fn classify_reports_latest_upload_and_keeps_order() {
    use chrono::TimeZone;

    let uploads = vec![
      ("a.mp3".to_owned(), Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()),
      ("a.mp3".to_owned(), Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap()),
      ("b.mp3".to_owned(), Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap()),
    ];
    let candidates: Vec<String> =
      ["c.mp3", "a.mp3", "d.mp3"].into_iter().map(str::to_owned).collect();
    let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

    let report = DuplicateReport::classify(&candidates, uploads, today);

    assert!(report.has_duplicates());
    assert_eq!(report.duplicates, vec![DuplicateFile {
      filename:         "a.mp3".into(),
      last_upload_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
      days_ago:         3,
    }]);
    assert_eq!(report.new_files, vec!["c.mp3".to_owned(), "d.mp3".to_owned()]);
  }

  #[test]
  fn new_call_detail_defaults_to_ineffective_audio() {
    let detail = NewCallDetail::from_file("call-01.mp3");
    assert_eq!(detail.original_filename.as_deref(), Some("call-01.mp3"));
    assert_eq!(detail.record_type, RecordType::Audio);
    assert!(!detail.is_effective);
    assert!(detail.score.is_none());
  }
}
