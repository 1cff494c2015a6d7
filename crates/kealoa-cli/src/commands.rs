//! One function per subcommand. Each prints its result to stdout as JSON.

use std::{
  fs::File,
  io::{BufReader, BufWriter},
  path::Path,
};

use anyhow::Context as _;
use kealoa_core::{kind::EntityKind, round::RoundKey, store::KealoaStore};
use kealoa_transfer::{Exporter, Importer, report};
use serde::Serialize;
use serde_json::json;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
  println!("{out}");
  Ok(())
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
  let file =
    File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
  Ok(BufReader::new(file))
}

fn create(path: &Path) -> anyhow::Result<File> {
  File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

// ─── Transfer ────────────────────────────────────────────────────────────────

pub async fn import<S: KealoaStore>(
  store: &S,
  kind: EntityKind,
  path: &Path,
  overwrite: bool,
) -> anyhow::Result<()> {
  let result = Importer::new(store)
    .overwrite(overwrite)
    .import_csv(kind, open(path)?)
    .await
    .with_context(|| format!("failed to import {kind} from {}", path.display()))?;
  print_json(&result)
}

pub async fn import_bundle<S: KealoaStore>(
  store: &S,
  path: &Path,
  overwrite: bool,
) -> anyhow::Result<()> {
  let results = Importer::new(store)
    .overwrite(overwrite)
    .import_zip(open(path)?)
    .await
    .with_context(|| format!("failed to import bundle {}", path.display()))?;
  print_json(&results)
}

pub async fn export<S: KealoaStore>(
  store: &S,
  kind: EntityKind,
  path: &Path,
) -> anyhow::Result<()> {
  let table = Exporter::new(store).export(kind).await?;
  table
    .write(BufWriter::new(create(path)?))
    .with_context(|| format!("failed to write {}", path.display()))?;
  print_json(&json!({
    "kind": kind,
    "rows": table.len(),
    "file": path.display().to_string()
  }))
}

pub async fn export_bundle<S: KealoaStore>(store: &S, path: &Path) -> anyhow::Result<()> {
  let bundle = Exporter::new(store).export_bundle().await?;
  kealoa_csv::write_bundle(create(path)?, &bundle)
    .with_context(|| format!("failed to write {}", path.display()))?;

  let rows: serde_json::Map<_, _> = bundle
    .iter()
    .map(|(kind, table)| (kind.to_string(), json!(table.len())))
    .collect();
  print_json(&json!({ "file": path.display().to_string(), "rows": rows }))
}

// ─── Reports ─────────────────────────────────────────────────────────────────

pub async fn person_stats<S: KealoaStore>(store: &S, name: &str) -> anyhow::Result<()> {
  print_json(&report::person_report(store, name).await?)
}

pub async fn round_stats<S: KealoaStore>(store: &S, key: RoundKey) -> anyhow::Result<()> {
  print_json(&report::round_report(store, key).await?)
}

pub async fn roles<S: KealoaStore>(store: &S, name: &str) -> anyhow::Result<()> {
  print_json(&report::roles_report(store, name).await?)
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

pub async fn check<S: KealoaStore>(store: &S, repair: bool) -> anyhow::Result<()> {
  let report = store.data_check().await.context("data check failed")?;
  if !repair || report.is_clean() {
    return print_json(&json!({ "report": report, "repaired": null }));
  }

  let repaired = store.repair_data().await.context("repair failed")?;
  print_json(&json!({ "report": report, "repaired": repaired }))
}
