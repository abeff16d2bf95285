//! Migration runner.
//!
//! Each pending migration runs in its own transaction together with the
//! `user_version` bump, so a failure leaves the database at the previous
//! version.

use rusqlite::Connection;

use crate::schema::{DROP_ALL, MIGRATIONS, SCHEMA_VERSION, SEED_SALESPERSONS};

/// Which salespersons a freshly created schema starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
  /// The ten built-in names of the base schema.
  Defaults,
  /// Exactly these names instead of the defaults.
  Roster(Vec<String>),
}

pub(crate) enum MigrationOutcome {
  Applied { from: i64, to: i64 },
  /// The database was written by a newer schema than this build knows.
  TooNew(i64),
}

pub(crate) fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
  conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Bring `conn` up to [`SCHEMA_VERSION`]. `seed` is only consulted when the
/// base schema is created.
pub(crate) fn apply_migrations(
  conn: &mut Connection,
  seed: &Seed,
) -> rusqlite::Result<MigrationOutcome> {
  let current = user_version(conn)?;
  if current > SCHEMA_VERSION {
    return Ok(MigrationOutcome::TooNew(current));
  }

  for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
    tracing::debug!(version = migration.version, name = migration.name, "applying migration");
    let tx = conn.transaction()?;
    tx.execute_batch(migration.sql)?;
    if migration.version == 1 {
      seed_base(&tx, seed)?;
    }
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()?;
  }

  Ok(MigrationOutcome::Applied { from: current, to: current.max(SCHEMA_VERSION) })
}

/// Drop everything and reset `user_version` to 0. The caller re-applies
/// migrations afterwards.
pub(crate) fn drop_schema(conn: &mut Connection) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  tx.execute_batch(DROP_ALL)?;
  tx.pragma_update(None, "user_version", 0)?;
  tx.commit()
}

/// Insert the seed's names, skipping ones already present. Returns how many
/// rows were added.
pub(crate) fn seed_base(conn: &Connection, seed: &Seed) -> rusqlite::Result<usize> {
  match seed {
    Seed::Defaults => {
      let before = salesperson_count(conn)?;
      conn.execute_batch(SEED_SALESPERSONS)?;
      Ok((salesperson_count(conn)? - before) as usize)
    }
    Seed::Roster(names) => insert_names(conn, names),
  }
}

fn salesperson_count(conn: &Connection) -> rusqlite::Result<i64> {
  conn.query_row("SELECT COUNT(*) FROM salespersons", [], |row| row.get(0))
}

/// Insert each name unless already present; returns how many were new.
pub(crate) fn insert_names(conn: &Connection, names: &[String]) -> rusqlite::Result<usize> {
  let mut stmt = conn
    .prepare_cached("INSERT INTO salespersons (name) VALUES (?1) ON CONFLICT (name) DO NOTHING")?;
  let mut inserted = 0;
  for name in names {
    inserted += stmt.execute(rusqlite::params![name])?;
  }
  Ok(inserted)
}
