use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use salescall_store_sqlite::Seed;

/// Settings for `salescall-admin`, read from an optional TOML file with
/// `SALESCALL_*` environment variables layered on top.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
  /// Path to the SQLite database. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Names to seed on reset. Empty means the built-in ten.
  #[serde(default)]
  pub roster:     Vec<String>,
}

fn default_store_path() -> PathBuf { PathBuf::from("sales_calls.db") }

impl AdminConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SALESCALL")
          .list_separator(",")
          .with_list_parse_key("roster")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let mut cfg: AdminConfig = settings
      .try_deserialize()
      .context("failed to deserialise AdminConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.roster = normalise_roster(cfg.roster);
    Ok(cfg)
  }

  /// How a freshly created or reset schema is seeded.
  pub fn seed(&self) -> Seed {
    if self.roster.is_empty() {
      Seed::Defaults
    } else {
      Seed::Roster(self.roster.clone())
    }
  }
}

/// Trim names and drop blanks and repeats, keeping first occurrences.
fn normalise_roster(roster: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(roster.len());
  for name in roster {
    let name = name.trim();
    if !name.is_empty() && !out.iter().any(|n| n == name) {
      out.push(name.to_owned());
    }
  }
  out
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
