//! Error type for `salescall-store-sqlite`.

use std::fmt;

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] salescall_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// The engine rejected a write. `kind` says which rule was violated.
  #[error("{kind} constraint violated: {message}")]
  Constraint { kind: ConstraintKind, message: String },

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("database schema version {found} is newer than supported version {supported}")]
  UnsupportedSchemaVersion { found: i64, supported: i64 },

  #[error("schema incomplete: {0}")]
  SchemaIncomplete(String),
}

impl Error {
  /// The violated constraint, if this is a constraint error.
  pub fn constraint_kind(&self) -> Option<ConstraintKind> {
    match self {
      Self::Constraint { kind, .. } => Some(*kind),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Constraint classification ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
  /// UNIQUE or PRIMARY KEY.
  Unique,
  ForeignKey,
  Check,
  NotNull,
  /// Raised by a trigger with `RAISE(ABORT, ...)`.
  Trigger,
  Other,
}

impl ConstraintKind {
  fn from_extended_code(code: i32) -> Self {
    match code {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::Unique,
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey,
      ffi::SQLITE_CONSTRAINT_CHECK => Self::Check,
      ffi::SQLITE_CONSTRAINT_NOTNULL => Self::NotNull,
      ffi::SQLITE_CONSTRAINT_TRIGGER => Self::Trigger,
      _ => Self::Other,
    }
  }
}

impl fmt::Display for ConstraintKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Unique => "unique",
      Self::ForeignKey => "foreign key",
      Self::Check => "check",
      Self::NotNull => "not null",
      Self::Trigger => "trigger",
      Self::Other => "other",
    })
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    match err {
      rusqlite::Error::SqliteFailure(failure, message)
        if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Self::Constraint {
          kind:    ConstraintKind::from_extended_code(failure.extended_code),
          message: message.unwrap_or_else(|| failure.to_string()),
        }
      }
      other => Self::Database(tokio_rusqlite::Error::Rusqlite(other)),
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Rusqlite(inner) => Self::from(inner),
      other => Self::Database(other),
    }
  }
}
