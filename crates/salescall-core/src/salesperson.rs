//! Salespersons: the identity record every daily record and call hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sales agent. Names are unique across the store.
///
/// `updated_at` doubles as a last-activity marker: it advances whenever one
/// of the salesperson's daily records is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salesperson {
  pub id:         i64,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
