//! Schema administration: catalogue inspection and destructive reset.
//!
//! These are SQLite-specific, so they live on [`SqliteStore`] directly rather
//! than on the `CallStore` trait.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
  Error, Result,
  migrate::{Seed, apply_migrations, drop_schema, seed_base, user_version},
  schema::{REQUIRED_COLUMNS, REQUIRED_INDEXES, REQUIRED_TRIGGERS},
  store::{SqliteStore, finish_migration},
};

// ─── Report types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
  pub name:      String,
  pub decl_type: String,
  pub not_null:  bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
  pub name:    String,
  pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
  pub name:  String,
  pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerInfo {
  pub name:  String,
  pub table: String,
}

/// What the database catalogue says about the installed schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
  pub version:           i64,
  pub tables:            Vec<TableInfo>,
  /// Named indexes only; SQLite's automatic UNIQUE indexes are skipped.
  pub indexes:           Vec<IndexInfo>,
  pub triggers:          Vec<TriggerInfo>,
  pub salesperson_count: u64,
}

impl SchemaReport {
  pub fn table(&self, name: &str) -> Option<&TableInfo> {
    self.tables.iter().find(|t| t.name == name)
  }

  /// Human-readable list of everything the store needs but the catalogue
  /// lacks. Empty when the schema is complete.
  pub fn missing(&self) -> Vec<String> {
    let mut missing = Vec::new();

    for (table, columns) in REQUIRED_COLUMNS {
      let Some(info) = self.table(table) else {
        missing.push(format!("table {table}"));
        continue;
      };
      for column in *columns {
        if !info.columns.iter().any(|c| c.name == *column) {
          missing.push(format!("column {table}.{column}"));
        }
      }
    }

    for index in REQUIRED_INDEXES {
      if !self.indexes.iter().any(|i| i.name == *index) {
        missing.push(format!("index {index}"));
      }
    }

    for trigger in REQUIRED_TRIGGERS {
      if !self.triggers.iter().any(|t| t.name == *trigger) {
        missing.push(format!("trigger {trigger}"));
      }
    }

    missing
  }
}

// ─── Operations ──────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Read the catalogue and check it against what the store requires.
  ///
  /// Returns [`Error::SchemaIncomplete`] naming every missing table, column,
  /// index and trigger.
  pub async fn verify_schema(&self) -> Result<SchemaReport> {
    let report = self.conn.call(|conn| Ok(read_catalogue(conn)?)).await?;

    let missing = report.missing();
    if !missing.is_empty() {
      tracing::error!(?missing, "schema verification failed");
      return Err(Error::SchemaIncomplete(missing.join(", ")));
    }

    tracing::info!(
      version = report.version,
      indexes = report.indexes.len(),
      triggers = report.triggers.len(),
      salespersons = report.salesperson_count,
      "schema verified"
    );
    Ok(report)
  }

  /// Insert whichever seed names are missing without touching anything
  /// else. Returns how many were added.
  pub async fn seed(&self, seed: Seed) -> Result<usize> {
    let added = self.conn.call(move |conn| Ok(seed_base(conn, &seed)?)).await?;
    tracing::info!(added, "seeded salespersons");
    Ok(added)
  }

  /// Drop every table and trigger, then rebuild the schema from scratch and
  /// seed it. All stored data is lost.
  pub async fn reset(&self, seed: Seed) -> Result<i64> {
    tracing::warn!("dropping all call record tables");

    let outcome = self
      .conn
      .call(move |conn| {
        drop_schema(conn)?;
        Ok(apply_migrations(conn, &seed)?)
      })
      .await?;

    let version = finish_migration(outcome)?;
    tracing::info!(version, "database reset");
    Ok(version)
  }
}

pub(crate) fn read_catalogue(conn: &Connection) -> rusqlite::Result<SchemaReport> {
  let version = user_version(conn)?;

  let mut tables = Vec::new();
  for (table, _) in REQUIRED_COLUMNS {
    let mut stmt =
      conn.prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
      .query_map(rusqlite::params![table], |row| {
        Ok(ColumnInfo {
          name:      row.get(0)?,
          decl_type: row.get(1)?,
          not_null:  row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    if !columns.is_empty() {
      tables.push(TableInfo { name: (*table).to_owned(), columns });
    }
  }

  let mut stmt = conn.prepare(
    "SELECT name, tbl_name FROM sqlite_master
     WHERE type = 'index' AND name NOT LIKE 'sqlite_autoindex_%'
     ORDER BY name",
  )?;
  let indexes = stmt
    .query_map([], |row| Ok(IndexInfo { name: row.get(0)?, table: row.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt =
    conn.prepare("SELECT name, tbl_name FROM sqlite_master WHERE type = 'trigger' ORDER BY name")?;
  let triggers = stmt
    .query_map([], |row| Ok(TriggerInfo { name: row.get(0)?, table: row.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let salesperson_count = if tables.iter().any(|t| t.name == "salespersons") {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM salespersons", [], |row| row.get(0))?;
    n as u64
  } else {
    0
  };

  Ok(SchemaReport { version, tables, indexes, triggers, salesperson_count })
}
