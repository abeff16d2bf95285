//! SQLite backend for the sales call record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The schema is installed and upgraded
//! by numbered migrations tracked in `PRAGMA user_version`.

mod admin;
mod encode;
mod migrate;
mod schema;
mod store;

pub mod error;

pub use admin::{ColumnInfo, IndexInfo, SchemaReport, TableInfo, TriggerInfo};
pub use error::{ConstraintKind, Error, Result};
pub use migrate::Seed;
pub use schema::{SCHEMA_VERSION, SEED_COUNT};
pub use store::SqliteStore;
