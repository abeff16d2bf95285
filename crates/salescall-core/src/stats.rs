//! Pure helpers for computing and merging a day's statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, daily::DailyCallRecord, detail::NewCallDetail};

/// Round a score to the two decimals the store keeps.
pub fn round_score(score: f64) -> f64 { (score * 100.0).round() / 100.0 }

/// Reject NaN and infinite scores and round the rest. The `[0, 100]` range
/// is left to the store's CHECK constraint.
pub fn checked_score(score: Option<f64>) -> Result<Option<f64>> {
  match score {
    Some(s) if !s.is_finite() => Err(Error::InvalidScore(s)),
    other => Ok(other.map(round_score)),
  }
}

/// The aggregate columns of a daily record, as written by
/// [`CallStore::update_daily_stats`](crate::store::CallStore::update_daily_stats).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
  pub total_calls:             u32,
  pub effective_calls:         u32,
  pub average_score:           Option<f64>,
  pub processed_files:         u32,
  pub summary_analysis:        Option<String>,
  pub improvement_suggestions: Option<String>,
}

impl DailyStats {
  /// Count a batch of calls. Unscored calls count towards the totals but not
  /// towards the average. Texts are left empty.
  pub fn tally(details: &[NewCallDetail]) -> Self {
    let total_calls = details.len() as u32;
    let effective_calls = details.iter().filter(|d| d.is_effective).count() as u32;
    let scores: Vec<f64> = details.iter().filter_map(|d| d.score).collect();
    let average_score = if scores.is_empty() {
      None
    } else {
      Some(round_score(scores.iter().sum::<f64>() / scores.len() as f64))
    };

    Self {
      total_calls,
      effective_calls,
      average_score,
      processed_files: total_calls,
      summary_analysis: None,
      improvement_suggestions: None,
    }
  }

  pub fn with_analysis(
    mut self,
    summary: Option<String>,
    suggestions: Option<String>,
  ) -> Self {
    self.summary_analysis = summary;
    self.improvement_suggestions = suggestions;
    self
  }

  /// Fold the counters of a day already on file into `self`, for uploads
  /// that add calls to an existing day.
  ///
  /// The averages are weighted by each side's call count. Texts are not
  /// touched; merging those is [`AnalysisMode::Append`](crate::daily::AnalysisMode::Append)'s job.
  pub fn combine_with(mut self, existing: &DailyCallRecord) -> Self {
    let new_calls = self.total_calls;
    let old_calls = existing.total_calls;

    self.average_score = match (existing.average_score, self.average_score) {
      (Some(old), Some(new)) if old_calls + new_calls > 0 => Some(round_score(
        (old * f64::from(old_calls) + new * f64::from(new_calls))
          / f64::from(old_calls + new_calls),
      )),
      (old, new) => new.or(old),
    };
    self.total_calls += old_calls;
    self.effective_calls += existing.effective_calls;
    self.processed_files += existing.processed_files;
    self
  }
}

/// Merge an appended analysis into the stored text.
///
/// When both sides are non-empty the result is the existing text followed by
/// a separator line naming `heading` and `at`, then the addition. Otherwise
/// whichever side has content wins.
pub fn append_section(
  existing: Option<&str>,
  addition: Option<&str>,
  at: DateTime<Utc>,
  heading: &str,
) -> Option<String> {
  let existing = existing.filter(|s| !s.trim().is_empty());
  let addition = addition.filter(|s| !s.trim().is_empty());

  match (existing, addition) {
    (Some(old), Some(new)) => Some(format!(
      "{old}\n\n--- {heading} ({}) ---\n{new}",
      at.format("%Y-%m-%d %H:%M")
    )),
    (old, new) => new.or(old).map(str::to_owned),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};

  use super::*;
  use crate::daily::ChannelCounts;

  fn existing_day(total: u32, effective: u32, avg: Option<f64>) -> DailyCallRecord {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    DailyCallRecord {
      id:                      1,
      salesperson_id:          1,
      upload_date:             NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      total_calls:             total,
      effective_calls:         effective,
      average_score:           avg,
      summary_analysis:        None,
      improvement_suggestions: None,
      processed_files:         total,
      audio:                   ChannelCounts::default(),
      image:                   ChannelCounts::default(),
      created_at:              at,
      updated_at:              at,
    }
  }

  #[test]
  fn round_score_keeps_two_decimals() {
    assert_eq!(round_score(83.3333), 83.33);
    assert_eq!(round_score(66.666), 66.67);
    assert_eq!(round_score(100.0), 100.0);
  }

  #[test]
  fn checked_score_rejects_non_finite_values() {
    assert!(matches!(checked_score(Some(f64::NAN)), Err(Error::InvalidScore(s)) if s.is_nan()));
    assert!(matches!(
      checked_score(Some(f64::INFINITY)),
      Err(Error::InvalidScore(s)) if s == f64::INFINITY
    ));
    assert_eq!(checked_score(Some(83.3333)).unwrap(), Some(83.33));
    assert_eq!(checked_score(None).unwrap(), None);
    // Out-of-range values are passed through for the store to reject.
    assert_eq!(checked_score(Some(101.0)).unwrap(), Some(101.0));
  }

  #[test]
  fn tally_ignores_unscored_calls_in_average() {
    let details = vec![
      NewCallDetail::from_file("a.mp3").with_score(80.0).effective(true),
      NewCallDetail::from_file("b.mp3").with_score(70.0),
      NewCallDetail::from_file("c.mp3"),
    ];
    let stats = DailyStats::tally(&details);
    assert_eq!(stats.total_calls, 3);
    assert_eq!(stats.effective_calls, 1);
    assert_eq!(stats.average_score, Some(75.0));
    assert_eq!(stats.processed_files, 3);
  }

  #[test]
  fn tally_of_nothing_has_no_average() {
    let stats = DailyStats::tally(&[]);
    assert_eq!(stats.total_calls, 0);
    assert!(stats.average_score.is_none());
  }

  #[test]
  fn combine_weights_averages_by_call_count() {
    let new = DailyStats {
      total_calls: 1,
      effective_calls: 1,
      average_score: Some(90.0),
      processed_files: 1,
      ..DailyStats::default()
    };
    let merged = new.combine_with(&existing_day(3, 1, Some(70.0)));
    assert_eq!(merged.total_calls, 4);
    assert_eq!(merged.effective_calls, 2);
    assert_eq!(merged.processed_files, 4);
    assert_eq!(merged.average_score, Some(75.0));
  }

  #[test]
  fn combine_keeps_whichever_average_exists() {
    let new = DailyStats { total_calls: 2, ..DailyStats::default() };
    let merged = new.combine_with(&existing_day(2, 0, Some(60.0)));
    assert_eq!(merged.average_score, Some(60.0));
  }

  #[test]
  fn append_section_joins_both_texts() {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 14, 30, 0).unwrap();
    let merged =
      append_section(Some("morning calls"), Some("afternoon calls"), at, "appended analysis")
        .unwrap();
    assert_eq!(
      merged,
      "morning calls\n\n--- appended analysis (2025-03-01 14:30) ---\nafternoon calls"
    );
  }

  #[test]
  fn append_section_falls_back_to_present_side() {
    let at = Utc::now();
    assert_eq!(append_section(None, Some("new"), at, "x").as_deref(), Some("new"));
    assert_eq!(append_section(Some("old"), Some("  "), at, "x").as_deref(), Some("old"));
    assert_eq!(append_section(None, None, at, "x"), None);
  }
}
