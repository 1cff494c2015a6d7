//! `kealoa` — command-line host for the KEALOA reference database.
//!
//! Reads `kealoa.toml` (or the path given with `--config`), opens the SQLite
//! store it names, and runs one command. Results go to stdout as JSON; logs
//! go to stderr.
//!
//! # Usage
//!
//! ```text
//! kealoa import rounds rounds.csv
//! kealoa import-bundle export.zip --overwrite
//! kealoa stats person "Pat Lee"
//! kealoa check --repair
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use kealoa_core::{
  kind::EntityKind,
  normalize::parse_date,
  round::{DEFAULT_ROUND_NUMBER, RoundKey},
};
use kealoa_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "kealoa", author, version, about = "KEALOA reference database")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "kealoa.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Import one CSV file.
  Import {
    kind:      Kind,
    file:      PathBuf,
    /// Rewrite existing records instead of skipping them.
    #[arg(long)]
    overwrite: bool,
  },
  /// Import every recognised CSV file in a ZIP bundle.
  ImportBundle {
    file:      PathBuf,
    #[arg(long)]
    overwrite: bool,
  },
  /// Export one kind as CSV.
  Export { kind: Kind, file: PathBuf },
  /// Export all kinds into a ZIP bundle.
  ExportBundle { file: PathBuf },
  /// Show statistics for a person or a round.
  Stats {
    #[command(subcommand)]
    target: StatsTarget,
  },
  /// Show the roles a person holds.
  Roles { name: String },
  /// Look for dangling puzzle references and stale guess results.
  Check {
    /// Fix whatever the check finds.
    #[arg(long)]
    repair: bool,
  },
}

#[derive(Subcommand)]
enum StatsTarget {
  /// Career statistics and breakdowns for one guesser.
  Person { name: String },
  /// Per-guesser results for one round.
  Round {
    #[arg(value_parser = parse_date)]
    date:         NaiveDate,
    #[arg(long, default_value_t = DEFAULT_ROUND_NUMBER)]
    round_number: u32,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
  Persons,
  Puzzles,
  Rounds,
  Clues,
  Guesses,
}

impl From<Kind> for EntityKind {
  fn from(kind: Kind) -> Self {
    match kind {
      Kind::Persons => Self::Persons,
      Kind::Puzzles => Self::Puzzles,
      Kind::Rounds => Self::Rounds,
      Kind::Clues => Self::Clues,
      Kind::Guesses => Self::Guesses,
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays machine-readable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  tracing::debug!(path = ?settings.store_path, "opened store");

  match cli.command {
    Command::Import { kind, file, overwrite } => {
      commands::import(&store, kind.into(), &file, overwrite).await
    }
    Command::ImportBundle { file, overwrite } => {
      commands::import_bundle(&store, &file, overwrite).await
    }
    Command::Export { kind, file } => commands::export(&store, kind.into(), &file).await,
    Command::ExportBundle { file } => commands::export_bundle(&store, &file).await,
    Command::Stats { target: StatsTarget::Person { name } } => {
      commands::person_stats(&store, &name).await
    }
    Command::Stats { target: StatsTarget::Round { date, round_number } } => {
      commands::round_stats(&store, RoundKey::new(date, round_number)).await
    }
    Command::Roles { name } => commands::roles(&store, &name).await,
    Command::Check { repair } => commands::check(&store, repair).await,
  }
}
