//! [`SqliteStore`], the SQLite implementation of [`CallStore`].

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _};

use salescall_core::{
  daily::{AnalysisMode, ChannelCounts, CountMode, DailyCallRecord, NewDailyRecord},
  detail::{CallDetail, DuplicateReport, NewCallDetail, RecordType},
  report::{MonthlySummary, month_bounds},
  salesperson::Salesperson,
  stats::{DailyStats, append_section, checked_score},
  store::CallStore,
};

use crate::{
  Error, Result,
  encode::{
    DAILY_COLUMNS, DETAIL_COLUMNS, RawCallDetail, RawDailyRecord, RawSalesperson,
    SALESPERSON_COLUMNS, decode_dt, encode_date, encode_dt,
  },
  migrate::{MigrationOutcome, Seed, apply_migrations, insert_names, user_version},
  schema::SCHEMA_VERSION,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A call record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, Seed::Defaults).await
  }

  /// Like [`open`](Self::open), but a newly created schema is seeded with
  /// `seed`. Existing databases keep their salespersons.
  pub async fn open_with(path: impl AsRef<Path>, seed: Seed) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, seed).await
  }

  /// Open `path` without applying migrations, for recovering a database this
  /// build cannot migrate. Only [`reset`](Self::reset),
  /// [`schema_version`](Self::schema_version) and
  /// [`verify_schema`](Self::verify_schema) are meaningful until
  /// [`migrate`](Self::migrate) has run.
  pub async fn open_unmigrated(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.configure_connection().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, Seed::Defaults).await
  }

  async fn init(conn: tokio_rusqlite::Connection, seed: Seed) -> Result<Self> {
    let store = Self { conn };
    store.configure_connection().await?;
    store.migrate(seed).await?;
    Ok(store)
  }

  /// Per-connection settings. Foreign keys are off by default in SQLite and
  /// the cascade from daily records to call details depends on them.
  async fn configure_connection(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.pragma_update(None, "foreign_keys", true)?;
        let _mode: String =
          conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Apply pending migrations and return the resulting schema version.
  pub async fn migrate(&self, seed: Seed) -> Result<i64> {
    let outcome = self.conn.call(move |conn| Ok(apply_migrations(conn, &seed)?)).await?;
    finish_migration(outcome)
  }

  /// The `user_version` currently recorded in the database.
  pub async fn schema_version(&self) -> Result<i64> {
    Ok(self.conn.call(|conn| Ok(user_version(conn)?)).await?)
  }

  async fn load_daily(&self, id: i64) -> Result<DailyCallRecord> {
    self
      .get_daily_record_by_id(id)
      .await?
      .ok_or(Error::Core(salescall_core::Error::DailyRecordNotFound(id)))
  }
}

pub(crate) fn finish_migration(outcome: MigrationOutcome) -> Result<i64> {
  match outcome {
    MigrationOutcome::TooNew(found) => {
      Err(Error::UnsupportedSchemaVersion { found, supported: SCHEMA_VERSION })
    }
    MigrationOutcome::Applied { from, to } => {
      if from < to {
        tracing::info!(from, to, "applied schema migrations");
      }
      Ok(to)
    }
  }
}

// ─── CallStore impl ──────────────────────────────────────────────────────────

impl CallStore for SqliteStore {
  type Error = Error;

  // ── Salespersons ──────────────────────────────────────────────────────────

  async fn add_salesperson(&self, name: &str) -> Result<Salesperson> {
    let name = name.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO salespersons (name) VALUES (?1)", rusqlite::params![name])?;
        Ok(select_salesperson(conn, conn.last_insert_rowid())?)
      })
      .await?;

    let salesperson = raw.into_salesperson()?;
    tracing::info!(id = salesperson.id, name = %salesperson.name, "added salesperson");
    Ok(salesperson)
  }

  async fn seed_salespersons(&self, names: &[String]) -> Result<usize> {
    let names = names.to_vec();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = insert_names(&tx, &names)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    tracing::info!(inserted, "seeded salespersons");
    Ok(inserted)
  }

  async fn get_salesperson(&self, id: i64) -> Result<Option<Salesperson>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_salesperson(conn, id).optional()?))
      .await?;

    raw.map(RawSalesperson::into_salesperson).transpose()
  }

  async fn get_salesperson_by_name(&self, name: &str) -> Result<Option<Salesperson>> {
    let name = name.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SALESPERSON_COLUMNS} FROM salespersons WHERE name = ?1"),
              rusqlite::params![name],
              RawSalesperson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSalesperson::into_salesperson).transpose()
  }

  async fn list_salespersons(&self) -> Result<Vec<Salesperson>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {SALESPERSON_COLUMNS} FROM salespersons ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawSalesperson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSalesperson::into_salesperson).collect()
  }

  async fn remove_salesperson(&self, name: &str) -> Result<()> {
    enum Removal {
      Removed,
      NotFound,
      Referenced { daily_records: u64, call_details: u64 },
    }

    let owned = name.to_owned();
    let removal = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id: Option<i64> = tx
          .query_row(
            "SELECT id FROM salespersons WHERE name = ?1",
            rusqlite::params![owned],
            |row| row.get(0),
          )
          .optional()?;
        let Some(id) = id else {
          return Ok(Removal::NotFound);
        };

        let daily_records = count(
          &tx,
          "SELECT COUNT(*) FROM daily_call_records WHERE salesperson_id = ?1",
          id,
        )?;
        let call_details =
          count(&tx, "SELECT COUNT(*) FROM call_details WHERE salesperson_id = ?1", id)?;
        if daily_records > 0 || call_details > 0 {
          return Ok(Removal::Referenced { daily_records, call_details });
        }

        tx.execute("DELETE FROM salespersons WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(Removal::Removed)
      })
      .await?;

    match removal {
      Removal::Removed => {
        tracing::info!(name, "removed salesperson");
        Ok(())
      }
      Removal::NotFound => Err(salescall_core::Error::SalespersonNotFound(name.to_owned()).into()),
      Removal::Referenced { daily_records, call_details } => {
        tracing::warn!(name, daily_records, call_details, "refusing to remove salesperson");
        Err(
          salescall_core::Error::SalespersonHasRecords {
            name: name.to_owned(),
            daily_records,
            call_details,
          }
          .into(),
        )
      }
    }
  }

  // ── Daily records ─────────────────────────────────────────────────────────

  async fn insert_daily_record(&self, input: NewDailyRecord) -> Result<DailyCallRecord> {
    let date_str = encode_date(input.upload_date);
    let average = checked_score(input.average_score)?;

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO daily_call_records (
             salesperson_id, upload_date, total_calls, effective_calls,
             average_score, summary_analysis, improvement_suggestions, processed_files
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            input.salesperson_id,
            date_str,
            input.total_calls,
            input.effective_calls,
            average,
            input.summary_analysis,
            input.improvement_suggestions,
            input.processed_files,
          ],
        )?;
        Ok(select_daily(conn, conn.last_insert_rowid())?)
      })
      .await?;

    raw.into_record()
  }

  async fn get_or_create_daily_record(
    &self,
    salesperson_id: i64,
    date: NaiveDate,
  ) -> Result<DailyCallRecord> {
    let date_str = encode_date(date);

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO daily_call_records (salesperson_id, upload_date) VALUES (?1, ?2)
           ON CONFLICT (salesperson_id, upload_date)
           DO UPDATE SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
          rusqlite::params![salesperson_id, date_str],
        )?;
        Ok(conn.query_row(
          &format!(
            "SELECT {DAILY_COLUMNS} FROM daily_call_records
             WHERE salesperson_id = ?1 AND upload_date = ?2"
          ),
          rusqlite::params![salesperson_id, date_str],
          RawDailyRecord::from_row,
        )?)
      })
      .await?;

    raw.into_record()
  }

  async fn daily_record_exists(&self, salesperson_id: i64, date: NaiveDate) -> Result<bool> {
    let date_str = encode_date(date);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT EXISTS (
               SELECT 1 FROM daily_call_records WHERE salesperson_id = ?1 AND upload_date = ?2
             )",
            rusqlite::params![salesperson_id, date_str],
            |row| row.get(0),
          )?)
        })
        .await?,
    )
  }

  async fn get_daily_record(
    &self,
    salesperson_id: i64,
    date: NaiveDate,
  ) -> Result<Option<DailyCallRecord>> {
    let date_str = encode_date(date);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DAILY_COLUMNS} FROM daily_call_records
                 WHERE salesperson_id = ?1 AND upload_date = ?2"
              ),
              rusqlite::params![salesperson_id, date_str],
              RawDailyRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDailyRecord::into_record).transpose()
  }

  async fn get_daily_record_by_id(&self, id: i64) -> Result<Option<DailyCallRecord>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_daily(conn, id).optional()?))
      .await?;

    raw.map(RawDailyRecord::into_record).transpose()
  }

  async fn update_daily_stats(
    &self,
    id: i64,
    stats: DailyStats,
    mode: AnalysisMode,
  ) -> Result<DailyCallRecord> {
    let now = Utc::now();
    let average = checked_score(stats.average_score)?;

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<(Option<String>, Option<String>)> = tx
          .query_row(
            "SELECT summary_analysis, improvement_suggestions FROM daily_call_records
             WHERE id = ?1",
            rusqlite::params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        let Some((old_summary, old_suggestions)) = existing else {
          return Ok(None);
        };

        let (summary, suggestions) = match mode {
          AnalysisMode::Replace => (stats.summary_analysis, stats.improvement_suggestions),
          AnalysisMode::Append => (
            append_section(
              old_summary.as_deref(),
              stats.summary_analysis.as_deref(),
              now,
              "appended analysis",
            ),
            append_section(
              old_suggestions.as_deref(),
              stats.improvement_suggestions.as_deref(),
              now,
              "additional suggestions",
            ),
          ),
        };

        tx.execute(
          "UPDATE daily_call_records
              SET total_calls = ?2,
                  effective_calls = ?3,
                  average_score = ?4,
                  processed_files = ?5,
                  summary_analysis = ?6,
                  improvement_suggestions = ?7
            WHERE id = ?1",
          rusqlite::params![
            id,
            stats.total_calls,
            stats.effective_calls,
            average,
            stats.processed_files,
            summary,
            suggestions,
          ],
        )?;
        let raw = select_daily(&tx, id)?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(Error::Core(salescall_core::Error::DailyRecordNotFound(id)))?
      .into_record()
  }

  async fn update_channel_stats(
    &self,
    id: i64,
    record_type: RecordType,
    counts: ChannelCounts,
    mode: CountMode,
  ) -> Result<DailyCallRecord> {
    let (calls_col, effective_col) = match record_type {
      RecordType::Audio => ("audio_calls", "audio_effective_calls"),
      RecordType::Image => ("image_calls", "image_effective_calls"),
    };
    let sql = match mode {
      CountMode::Reset => format!(
        "UPDATE daily_call_records SET {calls_col} = ?2, {effective_col} = ?3 WHERE id = ?1"
      ),
      CountMode::Accumulate => format!(
        "UPDATE daily_call_records
            SET {calls_col} = {calls_col} + ?2, {effective_col} = {effective_col} + ?3
          WHERE id = ?1"
      ),
    };

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(&sql, rusqlite::params![id, counts.calls, counts.effective_calls])?)
      })
      .await?;

    if changed == 0 {
      return Err(salescall_core::Error::DailyRecordNotFound(id).into());
    }
    tracing::debug!(id, %record_type, ?mode, calls = counts.calls, "updated channel counters");
    self.load_daily(id).await
  }

  async fn delete_daily_record(&self, id: i64) -> Result<u64> {
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let details =
          count(&tx, "SELECT COUNT(*) FROM call_details WHERE daily_record_id = ?1", id)?;
        let deleted =
          tx.execute("DELETE FROM daily_call_records WHERE id = ?1", rusqlite::params![id])?;
        if deleted == 0 {
          return Ok(None);
        }
        tx.commit()?;
        Ok(Some(details))
      })
      .await?;

    let details = removed.ok_or(Error::Core(salescall_core::Error::DailyRecordNotFound(id)))?;
    tracing::info!(id, details, "deleted daily record and its call details");
    Ok(details)
  }

  // ── Call details ──────────────────────────────────────────────────────────

  async fn insert_call_detail(
    &self,
    daily_record_id: i64,
    salesperson_id: i64,
    mut input: NewCallDetail,
  ) -> Result<CallDetail> {
    input.score = checked_score(input.score)?;

    let raw = self
      .conn
      .call(move |conn| Ok(insert_detail(conn, daily_record_id, salesperson_id, &input)?))
      .await?;

    raw.into_detail()
  }

  async fn insert_call_details(
    &self,
    daily_record_id: i64,
    salesperson_id: i64,
    mut inputs: Vec<NewCallDetail>,
  ) -> Result<Vec<CallDetail>> {
    for input in &mut inputs {
      input.score = checked_score(input.score)?;
    }

    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let rows = inputs
          .iter()
          .map(|input| insert_detail(&tx, daily_record_id, salesperson_id, input))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(rows)
      })
      .await?;

    tracing::info!(daily_record_id, count = raws.len(), "inserted call details");
    raws.into_iter().map(RawCallDetail::into_detail).collect()
  }

  async fn list_call_details(&self, daily_record_id: i64) -> Result<Vec<CallDetail>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DETAIL_COLUMNS} FROM call_details WHERE daily_record_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![daily_record_id], RawCallDetail::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCallDetail::into_detail).collect()
  }

  async fn recent_call_details(
    &self,
    salesperson_id: i64,
    days_back: u32,
    record_type: Option<RecordType>,
  ) -> Result<Vec<CallDetail>> {
    let cutoff = window_start(Utc::now(), days_back).map(encode_dt);
    let type_str = record_type.map(RecordType::as_str);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DETAIL_COLUMNS} FROM call_details
           WHERE salesperson_id = ?1
             AND (?2 IS NULL OR created_at >= ?2)
             AND (?3 IS NULL OR record_type = ?3)
           ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![salesperson_id, cutoff, type_str], RawCallDetail::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCallDetail::into_detail).collect()
  }

  async fn check_duplicate_filenames(
    &self,
    salesperson_id: i64,
    filenames: &[String],
    days_back: u32,
  ) -> Result<DuplicateReport> {
    if filenames.is_empty() {
      return Ok(DuplicateReport::default());
    }

    let now = Utc::now();
    let cutoff = window_start(now, days_back).map(encode_dt);
    let candidates = filenames.to_vec();

    let uploads: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut rows = Vec::new();
        for chunk in candidates.chunks(FILENAMES_PER_QUERY) {
          let placeholders =
            (3..chunk.len() + 3).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
          let mut stmt = conn.prepare(&format!(
            "SELECT original_filename, created_at FROM call_details
             WHERE salesperson_id = ?1
               AND (?2 IS NULL OR created_at >= ?2)
               AND original_filename IN ({placeholders})"
          ))?;

          let mut params: Vec<&dyn rusqlite::ToSql> = vec![&salesperson_id, &cutoff];
          params.extend(chunk.iter().map(|name| name as &dyn rusqlite::ToSql));
          let found = stmt
            .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows.extend(found);
        }
        Ok(rows)
      })
      .await?;

    let uploads = uploads
      .into_iter()
      .map(|(name, at)| Ok((name, decode_dt(&at)?)))
      .collect::<Result<Vec<_>>>()?;

    let report = DuplicateReport::classify(filenames, uploads, now.date_naive());
    tracing::info!(
      salesperson_id,
      days_back,
      candidates = filenames.len(),
      duplicates = report.duplicates.len(),
      "checked for duplicate filenames"
    );
    Ok(report)
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn monthly_summary(&self, year: i32, month: u32) -> Result<Vec<MonthlySummary>> {
    let (first, next) = month_bounds(year, month)?;
    let (first, next) = (encode_date(first), encode_date(next));

    let rows: Vec<(i64, String, i64, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.id, s.name, SUM(d.total_calls), SUM(d.effective_calls)
             FROM daily_call_records d
             JOIN salespersons s ON s.id = d.salesperson_id
            WHERE d.upload_date >= ?1 AND d.upload_date < ?2
            GROUP BY s.id, s.name
            ORDER BY s.name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![first, next], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(year, month, salespersons = rows.len(), "built monthly summary");
    Ok(
      rows
        .into_iter()
        .map(|(id, name, total, effective)| {
          MonthlySummary::new(id, name, total as u64, effective as u64)
        })
        .collect(),
    )
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Candidate filenames bound per duplicate lookup, well under SQLite's
/// host parameter limit.
const FILENAMES_PER_QUERY: usize = 500;

/// Start of the `days_back` window ending at `now`, or `None` when the window
/// reaches past the earliest representable time.
fn window_start(now: DateTime<Utc>, days_back: u32) -> Option<DateTime<Utc>> {
  Duration::try_days(i64::from(days_back)).and_then(|d| now.checked_sub_signed(d))
}

fn select_salesperson(conn: &Connection, id: i64) -> rusqlite::Result<RawSalesperson> {
  conn.query_row(
    &format!("SELECT {SALESPERSON_COLUMNS} FROM salespersons WHERE id = ?1"),
    rusqlite::params![id],
    RawSalesperson::from_row,
  )
}

fn select_daily(conn: &Connection, id: i64) -> rusqlite::Result<RawDailyRecord> {
  conn.query_row(
    &format!("SELECT {DAILY_COLUMNS} FROM daily_call_records WHERE id = ?1"),
    rusqlite::params![id],
    RawDailyRecord::from_row,
  )
}

fn insert_detail(
  conn: &Connection,
  daily_record_id: i64,
  salesperson_id: i64,
  input: &NewCallDetail,
) -> rusqlite::Result<RawCallDetail> {
  conn.execute(
    "INSERT INTO call_details (
       daily_record_id, salesperson_id, original_filename,
       company_name, contact_person, phone_number,
       score, is_effective, conversation_text, analysis_text,
       suggestions, record_type
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      daily_record_id,
      salesperson_id,
      input.original_filename,
      input.company_name,
      input.contact_person,
      input.phone_number,
      input.score,
      input.is_effective,
      input.conversation_text,
      input.analysis_text,
      input.suggestions,
      input.record_type.as_str(),
    ],
  )?;

  conn.query_row(
    &format!("SELECT {DETAIL_COLUMNS} FROM call_details WHERE id = ?1"),
    rusqlite::params![conn.last_insert_rowid()],
    RawCallDetail::from_row,
  )
}

fn count(conn: &Connection, sql: &str, id: i64) -> rusqlite::Result<u64> {
  let n: i64 = conn.query_row(sql, rusqlite::params![id], |row| row.get(0))?;
  Ok(n as u64)
}
