//! Export: store contents back into the CSV shapes the importer reads.

use std::collections::HashMap;

use chrono::NaiveDate;
use kealoa_core::{
  kind::EntityKind,
  normalize::join_list,
  person::PersonId,
  puzzle::PuzzleId,
  store::KealoaStore,
};
use kealoa_csv::{Bundle, Table};
use tracing::info;

use crate::{Error, Result};

// ─── Column sets ─────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &[&str] = &[
  "full_name",
  "home_page_url",
  "nicknames",
  "media_id",
  "xwordinfo_profile_name",
  "xwordinfo_image_url",
];

pub const PUZZLE_COLUMNS: &[&str] = &["publication_date", "constructors", "editor"];

pub const ROUND_COLUMNS: &[&str] = &[
  "round_date",
  "round_number",
  "episode_number",
  "episode_id",
  "clue_giver",
  "episode_url",
  "episode_start_seconds",
  "guessers",
  "solution_words",
  "description",
  "description2",
];

pub const CLUE_COLUMNS: &[&str] = &[
  "round_date",
  "round_number",
  "clue_number",
  "puzzle_date",
  "puzzle_clue_number",
  "puzzle_clue_direction",
  "clue_text",
  "correct_answer",
];

pub const GUESS_COLUMNS: &[&str] =
  &["round_date", "round_number", "clue_number", "guesser", "guessed_word"];

fn cell<T: ToString>(value: Option<T>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Exporter ────────────────────────────────────────────────────────────────

/// Reads a store into CSV tables.
pub struct Exporter<'s, S> {
  store: &'s S,
}

impl<'s, S: KealoaStore> Exporter<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  /// Every entity of `kind` as one table.
  pub async fn export(&self, kind: EntityKind) -> Result<Table> {
    let table = match kind {
      EntityKind::Persons => self.persons().await?,
      EntityKind::Puzzles => self.puzzles().await?,
      EntityKind::Rounds => self.rounds().await?,
      EntityKind::Clues => self.clues().await?,
      EntityKind::Guesses => self.guesses().await?,
    };
    info!(%kind, rows = table.len(), "export finished");
    Ok(table)
  }

  /// All five kinds.
  pub async fn export_bundle(&self) -> Result<Bundle> {
    let mut bundle = Bundle::new();
    for kind in EntityKind::in_import_order() {
      bundle.insert(kind, self.export(kind).await?);
    }
    Ok(bundle)
  }

  async fn names(&self) -> Result<HashMap<PersonId, String>> {
    let persons = self.store.list_persons().await.map_err(Error::store)?;
    Ok(persons.into_iter().map(|p| (p.person_id, p.full_name)).collect())
  }

  async fn puzzle_dates(&self) -> Result<HashMap<PuzzleId, NaiveDate>> {
    let puzzles = self.store.list_puzzles().await.map_err(Error::store)?;
    Ok(
      puzzles
        .into_iter()
        .map(|p| (p.puzzle_id, p.publication_date))
        .collect(),
    )
  }

  async fn persons(&self) -> Result<Table> {
    let mut table = Table::new(PERSON_COLUMNS);
    for p in self.store.list_persons().await.map_err(Error::store)? {
      table.push_record([
        p.full_name,
        cell(p.home_page_url),
        cell(p.nicknames),
        cell(p.media_id),
        cell(p.xwordinfo_profile_name),
        cell(p.xwordinfo_image_url),
      ]);
    }
    Ok(table)
  }

  async fn puzzles(&self) -> Result<Table> {
    let names = self.names().await?;
    let mut table = Table::new(PUZZLE_COLUMNS);
    for p in self.store.list_puzzles().await.map_err(Error::store)? {
      let constructors: Vec<String> = self
        .store
        .puzzle_constructors(p.puzzle_id)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|c| c.full_name)
        .collect();
      table.push_record([
        p.publication_date.to_string(),
        join_list(&constructors),
        cell(p.editor_id.and_then(|id| names.get(&id))),
      ]);
    }
    Ok(table)
  }

  async fn rounds(&self) -> Result<Table> {
    let names = self.names().await?;
    let mut table = Table::new(ROUND_COLUMNS);
    for r in self.store.list_rounds().await.map_err(Error::store)? {
      let guessers: Vec<String> = self
        .store
        .round_guessers(r.round_id)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|p| p.full_name)
        .collect();
      let solutions = self
        .store
        .round_solutions(r.round_id)
        .await
        .map_err(Error::store)?;
      table.push_record([
        r.round_date.to_string(),
        r.round_number.to_string(),
        cell(r.episode_number),
        cell(r.episode_id),
        cell(names.get(&r.clue_giver_id)),
        cell(r.episode_url),
        cell(r.episode_start_seconds),
        join_list(&guessers),
        join_list(&solutions),
        cell(r.description),
        cell(r.description2),
      ]);
    }
    Ok(table)
  }

  async fn clues(&self) -> Result<Table> {
    let puzzle_dates = self.puzzle_dates().await?;
    let mut table = Table::new(CLUE_COLUMNS);
    for r in self.store.list_rounds().await.map_err(Error::store)? {
      for c in self.store.list_clues(r.round_id).await.map_err(Error::store)? {
        table.push_record([
          r.round_date.to_string(),
          r.round_number.to_string(),
          c.clue_number.to_string(),
          cell(c.puzzle_id.and_then(|id| puzzle_dates.get(&id))),
          cell(c.puzzle_clue_number),
          cell(c.puzzle_clue_direction),
          cell(c.clue_text),
          c.correct_answer,
        ]);
      }
    }
    Ok(table)
  }

  async fn guesses(&self) -> Result<Table> {
    let names = self.names().await?;
    let mut table = Table::new(GUESS_COLUMNS);
    for r in self.store.list_rounds().await.map_err(Error::store)? {
      for c in self.store.list_clues(r.round_id).await.map_err(Error::store)? {
        for g in self.store.list_guesses(c.clue_id).await.map_err(Error::store)? {
          table.push_record([
            r.round_date.to_string(),
            r.round_number.to_string(),
            c.clue_number.to_string(),
            cell(names.get(&g.guesser_id)),
            g.guessed_word,
          ]);
        }
      }
    }
    Ok(table)
  }
}
