//! `licita`: unify tender snapshots and check favorites for new documents.
//!
//! # Usage
//!
//! ```text
//! licita unify                    # latest snapshot of each source, run date today
//! licita unify 2025-06-26 --dedup # that day's snapshots, merged by reference
//! licita watch --expediente EXP-1 --expediente EXP-2
//! licita watch --dataset output_final/licitaciones.csv
//! ```
//!
//! Settings come from `licita.toml` (or `--config`) and `LICITA__*`
//! environment variables.

mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use licita_core::{columns::ColumnConfig, source::Source, table::RawTable};
use licita_pipeline::{
  Normalizer, merge_by_key,
  select::{select_favorites, select_flagged},
  tsv, unify,
};
use licita_watch::{ChangeDetector, HttpFetcher};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "licita", author, version, about = "Spanish public-tender aggregator")]
struct Cli {
  /// Path to the TOML settings file.
  #[arg(short, long, default_value = "licita.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build the canonical dataset from each source's raw snapshot.
  Unify {
    /// Run date (YYYY-MM-DD). Also selects that day's snapshots; without it
    /// the latest snapshot of each source is used and the run date is today.
    fecha_proceso: Option<NaiveDate>,

    /// Merge rows sharing the same reference number.
    #[arg(long)]
    dedup: bool,
  },

  /// Check favorite tenders for newly published documents.
  Watch {
    /// Canonical snapshot to read (default: `<output_dir>/licitaciones.csv`).
    #[arg(long, value_name = "PATH")]
    dataset: Option<PathBuf>,

    /// Reference numbers to check. Without any, rows flagged in the
    /// snapshot's `Favorito` column are checked.
    #[arg(long = "expediente", value_name = "ID")]
    expedientes: Vec<String>,
  },
}

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
  let settings = Settings::load(&cli.config)?;
  let columns = ColumnConfig::load(&settings.columns_path).with_context(|| {
    format!(
      "failed to load column mapping from {}",
      settings.columns_path.display()
    )
  })?;

  match cli.command {
    Command::Unify {
      fecha_proceso,
      dedup,
    } => run_unify(&settings, &columns, fecha_proceso, dedup),
    Command::Watch {
      dataset,
      expedientes,
    } => run_watch(&settings, &columns, dataset, &expedientes).await,
  }
}

// ─── unify ────────────────────────────────────────────────────────────────────

fn run_unify(
  settings: &Settings,
  columns: &ColumnConfig,
  fecha_proceso: Option<NaiveDate>,
  dedup: bool,
) -> anyhow::Result<()> {
  let run_date = fecha_proceso.unwrap_or_else(|| Local::now().date_naive());
  let normalizer = Normalizer::new(columns, run_date);

  let mut tables = Vec::with_capacity(Source::ALL.len());
  for source in Source::ALL {
    match load_source(&settings.input_dir, source, fecha_proceso) {
      Ok(raw) => tables.push(normalizer.normalize(source, &raw)),
      Err(e) => tracing::warn!(error = %e, "source left out of this run"),
    }
  }

  let mut table = unify(&columns.canonical_names(), tables);
  if dedup || settings.dedup {
    table = merge_by_key(&table, &settings.merge_options())
      .context("failed to merge rows by key")?;
  }

  let path = settings.output_dir.join(tsv::CANONICAL_FILE_NAME);
  tsv::write_canonical(&path, &table)
    .with_context(|| format!("failed to write {}", path.display()))?;

  tracing::info!(rows = table.len(), path = %path.display(), run_date = %run_date, "dataset ready");
  Ok(())
}

/// A source's raw snapshot; any failure makes the whole source unavailable.
fn load_source(
  dir: &Path,
  source: Source,
  date: Option<NaiveDate>,
) -> licita_pipeline::Result<RawTable> {
  let path = tsv::locate_source_file(dir, source, date)?;
  tracing::info!(source = %source, path = %path.display(), "reading source snapshot");
  tsv::read_raw_table(&path).map_err(|e| licita_pipeline::Error::SourceUnavailable {
    portal: source,
    reason: e.to_string(),
  })
}

// ─── watch ────────────────────────────────────────────────────────────────────

async fn run_watch(
  settings: &Settings,
  columns: &ColumnConfig,
  dataset: Option<PathBuf>,
  expedientes: &[String],
) -> anyhow::Result<()> {
  let path =
    dataset.unwrap_or_else(|| settings.output_dir.join(tsv::CANONICAL_FILE_NAME));
  let snapshot = tsv::read_canonical(&path, columns)
    .with_context(|| format!("failed to read snapshot {}", path.display()))?;
  let table = &snapshot.table;

  let favorites = if !expedientes.is_empty() {
    select_favorites(table, &settings.key_field, &settings.url_field, expedientes)?
  } else if let Some(flags) = snapshot.flags(tsv::FLAG_COLUMN) {
    select_flagged(table, &flags, &settings.key_field, &settings.url_field)?
  } else {
    tracing::warn!(
      column = tsv::FLAG_COLUMN,
      "no --expediente given and the snapshot has no flag column"
    );
    Vec::new()
  };

  if favorites.is_empty() {
    tracing::info!("no favorite tenders to check");
    return Ok(());
  }

  let fetcher = HttpFetcher::new(&settings.watch.http_options())?;
  let detector = ChangeDetector::new(fetcher, settings.watch.watch_options());
  let results = detector.check(favorites).await;

  for r in results.iter().filter(|r| r.updated()) {
    tracing::info!(
      expediente = %r.favorite.expediente,
      new_documents = r.new_documents.len(),
      "tender has new documents"
    );
  }

  let out = tsv::write_check_results(
    &settings.output_dir_fav,
    &results,
    table.fields(),
    Local::now().date_naive(),
  )?;
  tracing::info!(path = %out.display(), "check results written");
  Ok(())
}
