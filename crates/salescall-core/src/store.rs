//! The `CallStore` trait.
//!
//! Implemented by storage backends (e.g. `salescall-store-sqlite`). Callers
//! depend on this abstraction rather than on a concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  daily::{AnalysisMode, ChannelCounts, CountMode, DailyCallRecord, NewDailyRecord},
  detail::{CallDetail, DuplicateReport, NewCallDetail, RecordType},
  report::MonthlySummary,
  salesperson::Salesperson,
  stats::DailyStats,
};

/// Abstraction over a sales call record backend.
///
/// Constraint enforcement (unique names, one record per salesperson and day,
/// score ranges, referential integrity) belongs to the backend; violations
/// surface as `Self::Error`.
pub trait CallStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Salespersons ──────────────────────────────────────────────────────

  /// Create a salesperson. Fails if the name is taken.
  fn add_salesperson<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Salesperson, Self::Error>> + Send + 'a;

  /// Insert every name not already present and return how many were new.
  fn seed_salespersons<'a>(
    &'a self,
    names: &'a [String],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn get_salesperson(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Salesperson>, Self::Error>> + Send + '_;

  fn get_salesperson_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Salesperson>, Self::Error>> + Send + 'a;

  /// All salespersons ordered by name.
  fn list_salespersons(
    &self,
  ) -> impl Future<Output = Result<Vec<Salesperson>, Self::Error>> + Send + '_;

  /// Delete a salesperson that nothing references yet.
  fn remove_salesperson<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Daily records ─────────────────────────────────────────────────────

  /// Insert a daily record. A second record for the same salesperson and
  /// date is a uniqueness violation.
  fn insert_daily_record(
    &self,
    input: NewDailyRecord,
  ) -> impl Future<Output = Result<DailyCallRecord, Self::Error>> + Send + '_;

  /// Return the record for `(salesperson_id, date)`, creating an empty one
  /// if there is none.
  fn get_or_create_daily_record(
    &self,
    salesperson_id: i64,
    date: NaiveDate,
  ) -> impl Future<Output = Result<DailyCallRecord, Self::Error>> + Send + '_;

  fn daily_record_exists(
    &self,
    salesperson_id: i64,
    date: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_daily_record(
    &self,
    salesperson_id: i64,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DailyCallRecord>, Self::Error>> + Send + '_;

  fn get_daily_record_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<DailyCallRecord>, Self::Error>> + Send + '_;

  /// Write a day's aggregate columns and return the updated record.
  fn update_daily_stats(
    &self,
    id: i64,
    stats: DailyStats,
    mode: AnalysisMode,
  ) -> impl Future<Output = Result<DailyCallRecord, Self::Error>> + Send + '_;

  /// Write one channel's counters. Totals are left alone.
  fn update_channel_stats(
    &self,
    id: i64,
    record_type: RecordType,
    counts: ChannelCounts,
    mode: CountMode,
  ) -> impl Future<Output = Result<DailyCallRecord, Self::Error>> + Send + '_;

  /// Delete a daily record together with its call details. Returns how many
  /// details went with it.
  fn delete_daily_record(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Call details ──────────────────────────────────────────────────────

  fn insert_call_detail(
    &self,
    daily_record_id: i64,
    salesperson_id: i64,
    input: NewCallDetail,
  ) -> impl Future<Output = Result<CallDetail, Self::Error>> + Send + '_;

  /// Insert a batch of calls; either all of them are stored or none.
  fn insert_call_details(
    &self,
    daily_record_id: i64,
    salesperson_id: i64,
    inputs: Vec<NewCallDetail>,
  ) -> impl Future<Output = Result<Vec<CallDetail>, Self::Error>> + Send + '_;

  /// The calls of one daily record, oldest first.
  fn list_call_details(
    &self,
    daily_record_id: i64,
  ) -> impl Future<Output = Result<Vec<CallDetail>, Self::Error>> + Send + '_;

  /// A salesperson's calls from the last `days_back` days, newest first. A
  /// window reaching past the earliest representable time has no lower bound.
  fn recent_call_details(
    &self,
    salesperson_id: i64,
    days_back: u32,
    record_type: Option<RecordType>,
  ) -> impl Future<Output = Result<Vec<CallDetail>, Self::Error>> + Send + '_;

  /// Split `filenames` into ones the salesperson already uploaded within
  /// `days_back` days and ones that are new.
  fn check_duplicate_filenames<'a>(
    &'a self,
    salesperson_id: i64,
    filenames: &'a [String],
    days_back: u32,
  ) -> impl Future<Output = Result<DuplicateReport, Self::Error>> + Send + 'a;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Per-salesperson totals over the daily records of one calendar month,
  /// ordered by name. Salespersons without records that month are omitted.
  fn monthly_summary(
    &self,
    year: i32,
    month: u32,
  ) -> impl Future<Output = Result<Vec<MonthlySummary>, Self::Error>> + Send + '_;
}
