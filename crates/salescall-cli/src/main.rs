//! `salescall-admin`: schema and roster maintenance for the call record
//! store.
//!
//! Reads `salescall.toml` (or the path given with `--config`) and
//! `SALESCALL_*` environment variables, opens the SQLite store, which applies
//! any pending migrations (except for `reset`), and runs one subcommand.
//!
//! # Usage
//!
//! ```
//! salescall-admin verify --json
//! salescall-admin report 2025-03
//! salescall-admin salesperson add 张三
//! SALESCALL_ROSTER=Ada,Grace salescall-admin reset --yes
//! ```

mod config;

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
};

use anyhow::{Context as _, bail};
use chrono::{Datelike as _, NaiveDate};
use clap::{Parser, Subcommand};
use salescall_core::{report::MonthlySummary, salesperson::Salesperson, store::CallStore};
use salescall_store_sqlite::{ConstraintKind, SchemaReport, SqliteStore};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::AdminConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Sales call record store administration")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "salescall.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the schema or bring it up to date.
  Migrate,
  /// Check that every table, column and trigger is in place.
  Verify {
    /// Print the catalogue report as JSON.
    #[arg(long)]
    json: bool,
  },
  /// Insert any roster names that are missing.
  Seed,
  /// Effective-call totals per salesperson for one month.
  Report {
    /// Month as `YYYY-MM`.
    #[arg(value_parser = parse_month)]
    month: (i32, u32),
    #[arg(long)]
    json:  bool,
  },
  /// Drop all tables and rebuild the schema. Every record is lost. Works on
  /// databases this build cannot migrate.
  Reset {
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
  },
  /// Manage salespersons.
  #[command(subcommand)]
  Salesperson(SalespersonCommand),
}

#[derive(Subcommand)]
enum SalespersonCommand {
  Add {
    name: String,
  },
  List {
    #[arg(long)]
    json: bool,
  },
  /// Remove a salesperson that has no call records.
  Remove {
    name: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes:  bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = AdminConfig::load(&cli.config)?;

  // Reset must not migrate first; that would refuse a newer schema.
  let store = if matches!(cli.command, Command::Reset { .. }) {
    SqliteStore::open_unmigrated(&cfg.store_path).await
  } else {
    SqliteStore::open_with(&cfg.store_path, cfg.seed()).await
  }
  .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Migrate => {
      let version = store.migrate(cfg.seed()).await.context("migration failed")?;
      println!("schema at version {version}");
    }
    Command::Verify { json } => {
      let report = store.verify_schema().await.context("schema verification failed")?;
      if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
      } else {
        print_report(&report);
      }
    }
    Command::Seed => {
      let added = store.seed(cfg.seed()).await.context("seeding failed")?;
      println!("added {added} salesperson(s)");
    }
    Command::Report { month: (year, month), json } => {
      let summary = store
        .monthly_summary(year, month)
        .await
        .with_context(|| format!("failed to build report for {year}-{month:02}"))?;
      if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
      } else {
        print_summary(year, month, &summary);
      }
    }
    Command::Reset { yes } => {
      if !yes && !confirm(&format!("Drop every table in {:?}?", cfg.store_path))? {
        println!("aborted");
        return Ok(());
      }
      let version = store.reset(cfg.seed()).await.context("reset failed")?;
      let count = store.list_salespersons().await?.len();
      println!("schema rebuilt at version {version} with {count} salesperson(s)");
    }
    Command::Salesperson(cmd) => salesperson(&store, cmd).await?,
  }

  Ok(())
}

async fn salesperson(store: &SqliteStore, cmd: SalespersonCommand) -> anyhow::Result<()> {
  match cmd {
    SalespersonCommand::Add { name } => {
      let name = name.trim();
      if name.is_empty() {
        bail!("salesperson name must not be empty");
      }
      match store.add_salesperson(name).await {
        Ok(sp) => println!("added {} (id {})", sp.name, sp.id),
        Err(e) if e.constraint_kind() == Some(ConstraintKind::Unique) => {
          bail!("salesperson {name:?} already exists")
        }
        Err(e) => return Err(e).context("failed to add salesperson"),
      }
    }
    SalespersonCommand::List { json } => {
      let all = store.list_salespersons().await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&all)?);
      } else {
        print_salespersons(&all);
      }
    }
    SalespersonCommand::Remove { name, yes } => {
      if !yes && !confirm(&format!("Remove salesperson {name:?}?"))? {
        println!("aborted");
        return Ok(());
      }
      store
        .remove_salesperson(&name)
        .await
        .with_context(|| format!("failed to remove {name:?}"))?;
      println!("removed {name}");
    }
  }
  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_report(report: &SchemaReport) {
  println!("schema version: {}", report.version);
  for table in &report.tables {
    println!("table {} ({} columns)", table.name, table.columns.len());
    for column in &table.columns {
      let null = if column.not_null { " NOT NULL" } else { "" };
      println!("  {} {}{null}", column.name, column.decl_type);
    }
  }
  for index in &report.indexes {
    println!("index {} on {}", index.name, index.table);
  }
  for trigger in &report.triggers {
    println!("trigger {} on {}", trigger.name, trigger.table);
  }
  println!("salespersons: {}", report.salesperson_count);
}

fn print_summary(year: i32, month: u32, summary: &[MonthlySummary]) {
  if summary.is_empty() {
    println!("no call records for {year}-{month:02}");
    return;
  }
  println!("{:<16} {:>9} {:>7} {:>7}", "salesperson", "effective", "total", "rate");
  for row in summary {
    println!(
      "{:<16} {:>9} {:>7} {:>6.1}%",
      row.salesperson, row.effective_calls, row.total_calls, row.effective_rate
    );
  }
}

fn print_salespersons(all: &[Salesperson]) {
  if all.is_empty() {
    println!("no salespersons");
    return;
  }
  for sp in all {
    println!(
      "{:>4}  {}  (updated {})",
      sp.id,
      sp.name,
      sp.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
  }
}

/// Ask a y/N question on stdin. Anything but `y` or `yes` is a no.
fn confirm(question: &str) -> anyhow::Result<bool> {
  print!("{question} [y/N] ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Parse `YYYY-MM` into a year and month.
fn parse_month(s: &str) -> Result<(i32, u32), String> {
  NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
    .map(|d| (d.year(), d.month()))
    .map_err(|_| format!("expected a month as YYYY-MM, got {s:?}"))
}
