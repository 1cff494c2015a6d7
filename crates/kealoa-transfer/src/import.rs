//! Import reconciler: CSV tables into store writes.
//!
//! Rows are processed in file order and each one ends as exactly one of
//! imported or skipped. A row whose natural key already exists is skipped
//! (or rewritten from the row when overwriting). A row that fails validation,
//! or whose round or clue cannot be found, is skipped and reported as
//! `Line N: reason`, where line 1 is the header. Persons and puzzles named by
//! a row are created on demand; rounds and clues never are.
//!
//! Only unparseable input or a store failure aborts an import.

use std::{
  collections::BTreeMap,
  io::{Read, Seek},
};

use chrono::NaiveDate;
use kealoa_core::{
  clue::{Direction, NewClue},
  guess::NewGuess,
  kind::EntityKind,
  normalize::{parse_date, parse_number, split_list, upper},
  person::{NewPerson, PersonId},
  puzzle::{NewPuzzle, PuzzleId},
  round::{DEFAULT_ROUND_NUMBER, NewRound, Round, RoundKey},
  store::KealoaStore,
};
use kealoa_csv::{Bundle, Row, Table};
use serde::Serialize;
use tracing::{info, warn};

use crate::{Error, Result};

// ─── Result ──────────────────────────────────────────────────────────────────

/// Summary of one import call. `imported + skipped` is the number of data
/// rows; every entry in `errors` belongs to a skipped row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
  pub imported: u64,
  pub skipped:  u64,
  pub errors:   Vec<String>,
}

impl ImportResult {
  fn record(&mut self, index: usize, outcome: RowResult) -> Result<()> {
    match outcome {
      Ok(Outcome::Imported) => self.imported += 1,
      Ok(Outcome::Skipped) => self.skipped += 1,
      Err(RowError::Rejected(reason)) => {
        let message = format!("Line {}: {reason}", index + 2);
        warn!("{message}");
        self.errors.push(message);
        self.skipped += 1;
      }
      Err(RowError::Fatal(e)) => return Err(e),
    }
    Ok(())
  }
}

enum Outcome {
  Imported,
  Skipped,
}

enum RowError {
  /// The row is skipped with this reason.
  Rejected(String),
  /// The whole import stops.
  Fatal(Error),
}

impl From<kealoa_core::Error> for RowError {
  fn from(e: kealoa_core::Error) -> Self { Self::Rejected(e.to_string()) }
}

type RowResult = Result<Outcome, RowError>;

fn fatal<E>(e: E) -> RowError
where
  E: std::error::Error + Send + Sync + 'static,
{
  RowError::Fatal(Error::store(e))
}

// ─── Cell helpers ────────────────────────────────────────────────────────────

fn required<'r>(row: &'r Row, column: &'static str) -> Result<&'r str, RowError> {
  row
    .get(column)
    .ok_or_else(|| kealoa_core::Error::MissingField(column).into())
}

fn text(row: &Row, column: &str) -> Option<String> {
  row.get(column).map(str::to_owned)
}

fn list(row: &Row, column: &str) -> Vec<String> {
  row.get(column).map(split_list).unwrap_or_default()
}

fn required_date(row: &Row, column: &'static str) -> Result<NaiveDate, RowError> {
  Ok(parse_date(required(row, column)?)?)
}

fn optional_date(row: &Row, column: &str) -> Result<Option<NaiveDate>, RowError> {
  Ok(row.get(column).map(parse_date).transpose()?)
}

fn required_number(row: &Row, column: &'static str) -> Result<u32, RowError> {
  Ok(parse_number(column, required(row, column)?)?)
}

fn optional_number(row: &Row, column: &'static str) -> Result<Option<u32>, RowError> {
  Ok(row.get(column).map(|v| parse_number(column, v)).transpose()?)
}

fn round_key(row: &Row) -> Result<RoundKey, RowError> {
  let date = required_date(row, "round_date")?;
  let number = optional_number(row, "round_number")?.unwrap_or(DEFAULT_ROUND_NUMBER);
  Ok(RoundKey::new(date, number))
}

// ─── Importer ────────────────────────────────────────────────────────────────

/// Reconciles CSV tables against a store.
pub struct Importer<'s, S> {
  store:     &'s S,
  overwrite: bool,
}

impl<'s, S: KealoaStore> Importer<'s, S> {
  /// An importer that skips rows whose record already exists.
  pub fn new(store: &'s S) -> Self { Self { store, overwrite: false } }

  /// Rewrite existing records from their rows instead of skipping them.
  pub fn overwrite(self, overwrite: bool) -> Self { Self { overwrite, ..self } }

  /// Import every row of `table` as entities of `kind`.
  pub async fn import(&self, kind: EntityKind, table: &Table) -> Result<ImportResult> {
    let mut result = ImportResult::default();

    for (index, row) in table.rows().iter().enumerate() {
      let outcome = match kind {
        EntityKind::Persons => self.person_row(row).await,
        EntityKind::Puzzles => self.puzzle_row(row).await,
        EntityKind::Rounds => self.round_row(row).await,
        EntityKind::Clues => self.clue_row(row).await,
        EntityKind::Guesses => self.guess_row(row).await,
      };
      result.record(index, outcome)?;
    }

    info!(
      %kind,
      rows = table.len(),
      imported = result.imported,
      skipped = result.skipped,
      errors = result.errors.len(),
      overwrite = self.overwrite,
      "import finished"
    );
    Ok(result)
  }

  /// Import every table of a bundle, parents before children.
  pub async fn import_bundle(
    &self,
    bundle: &Bundle,
  ) -> Result<BTreeMap<EntityKind, ImportResult>> {
    let mut results = BTreeMap::new();
    for (kind, table) in bundle.iter() {
      results.insert(kind, self.import(kind, table).await?);
    }
    Ok(results)
  }

  /// Parse CSV from `reader` and import it. Input that is not valid CSV
  /// fails the whole call before any row is written.
  pub async fn import_csv<R: Read>(&self, kind: EntityKind, reader: R) -> Result<ImportResult> {
    let table = kealoa_csv::parse(reader)?;
    self.import(kind, &table).await
  }

  /// Read a ZIP bundle from `reader` and import it.
  pub async fn import_zip<R: Read + Seek>(
    &self,
    reader: R,
  ) -> Result<BTreeMap<EntityKind, ImportResult>> {
    let bundle = kealoa_csv::read_bundle(reader)?;
    self.import_bundle(&bundle).await
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  async fn person_id(&self, name: &str) -> Result<PersonId, RowError> {
    let (person, _) = self
      .store
      .find_or_create_person(name)
      .await
      .map_err(fatal)?;
    Ok(person.person_id)
  }

  async fn person_ids(&self, names: &[String]) -> Result<Vec<PersonId>, RowError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
      ids.push(self.person_id(name).await?);
    }
    Ok(ids)
  }

  async fn optional_person_id(&self, name: Option<&str>) -> Result<Option<PersonId>, RowError> {
    match name {
      Some(name) => Ok(Some(self.person_id(name).await?)),
      None => Ok(None),
    }
  }

  async fn puzzle_id(&self, date: Option<NaiveDate>) -> Result<Option<PuzzleId>, RowError> {
    let Some(date) = date else { return Ok(None) };
    let (puzzle, _) = self
      .store
      .find_or_create_puzzle(date)
      .await
      .map_err(fatal)?;
    Ok(Some(puzzle.puzzle_id))
  }

  async fn round(&self, key: RoundKey) -> Result<Round, RowError> {
    self
      .store
      .find_round(key)
      .await
      .map_err(fatal)?
      .ok_or_else(|| RowError::Rejected(format!("round {key} not found")))
  }

  // ── Rows ──────────────────────────────────────────────────────────────────

  async fn person_row(&self, row: &Row) -> RowResult {
    let full_name = required(row, "full_name")?;
    let input = NewPerson {
      full_name:              full_name.to_owned(),
      nicknames:              text(row, "nicknames"),
      home_page_url:          text(row, "home_page_url"),
      media_id:               optional_number(row, "media_id")?.map(i64::from),
      xwordinfo_profile_name: text(row, "xwordinfo_profile_name"),
      xwordinfo_image_url:    text(row, "xwordinfo_image_url"),
    };

    match self.store.find_person_by_name(full_name).await.map_err(fatal)? {
      None => {
        self.store.create_person(input).await.map_err(fatal)?;
      }
      Some(_) if !self.overwrite => return Ok(Outcome::Skipped),
      Some(existing) => {
        // The stored spelling of the name wins.
        let input = NewPerson { full_name: existing.full_name, ..input };
        self
          .store
          .update_person(existing.person_id, input)
          .await
          .map_err(fatal)?;
      }
    }
    Ok(Outcome::Imported)
  }

  async fn puzzle_row(&self, row: &Row) -> RowResult {
    let date = required_date(row, "publication_date")?;
    let existing = self.store.find_puzzle_by_date(date).await.map_err(fatal)?;
    if existing.is_some() && !self.overwrite {
      return Ok(Outcome::Skipped);
    }

    let input = NewPuzzle {
      publication_date: date,
      editor_id:        self.optional_person_id(row.get("editor")).await?,
      constructor_ids:  self.person_ids(&list(row, "constructors")).await?,
    };

    match existing {
      None => {
        self.store.create_puzzle(input).await.map_err(fatal)?;
      }
      Some(puzzle) => {
        self
          .store
          .update_puzzle(puzzle.puzzle_id, input)
          .await
          .map_err(fatal)?;
      }
    }
    Ok(Outcome::Imported)
  }

  async fn round_row(&self, row: &Row) -> RowResult {
    let key = round_key(row)?;
    let clue_giver = required(row, "clue_giver")?;
    let episode_number = optional_number(row, "episode_number")?;
    let episode_id = optional_number(row, "episode_id")?.map(i64::from);
    let episode_start_seconds = optional_number(row, "episode_start_seconds")?;

    let existing = self.store.find_round(key).await.map_err(fatal)?;
    if existing.is_some() && !self.overwrite {
      return Ok(Outcome::Skipped);
    }

    let input = NewRound {
      round_date: key.date,
      round_number: key.number,
      episode_number,
      episode_id,
      episode_url: text(row, "episode_url"),
      episode_start_seconds,
      clue_giver_id: self.person_id(clue_giver).await?,
      description: text(row, "description"),
      description2: text(row, "description2"),
      solution_words: list(row, "solution_words"),
      guesser_ids: self.person_ids(&list(row, "guessers")).await?,
    };

    match existing {
      None => {
        self.store.create_round(input).await.map_err(fatal)?;
      }
      Some(round) => {
        self
          .store
          .update_round(round.round_id, input)
          .await
          .map_err(fatal)?;
      }
    }
    Ok(Outcome::Imported)
  }

  async fn clue_row(&self, row: &Row) -> RowResult {
    let key = round_key(row)?;
    let clue_number = required_number(row, "clue_number")?;
    let correct_answer = upper(required(row, "correct_answer")?);
    let puzzle_date = optional_date(row, "puzzle_date")?;
    let puzzle_clue_number = optional_number(row, "puzzle_clue_number")?;
    let puzzle_clue_direction = row
      .get("puzzle_clue_direction")
      .map(Direction::normalize)
      .transpose()?;

    let round = self.round(key).await?;
    let existing = self
      .store
      .find_clue(round.round_id, clue_number)
      .await
      .map_err(fatal)?;
    if existing.is_some() && !self.overwrite {
      return Ok(Outcome::Skipped);
    }

    let input = NewClue {
      round_id: round.round_id,
      clue_number,
      puzzle_id: self.puzzle_id(puzzle_date).await?,
      puzzle_clue_number,
      puzzle_clue_direction,
      clue_text: text(row, "clue_text"),
      correct_answer,
    };

    match existing {
      None => {
        self.store.create_clue(input).await.map_err(fatal)?;
      }
      Some(clue) => {
        self
          .store
          .update_clue(clue.clue_id, input)
          .await
          .map_err(fatal)?;
      }
    }
    Ok(Outcome::Imported)
  }

  async fn guess_row(&self, row: &Row) -> RowResult {
    let key = round_key(row)?;
    let clue_number = required_number(row, "clue_number")?;
    let guesser = required(row, "guesser")?;
    let guessed_word = required(row, "guessed_word")?;

    let round = self.round(key).await?;
    let clue = self
      .store
      .find_clue(round.round_id, clue_number)
      .await
      .map_err(fatal)?
      .ok_or_else(|| {
        RowError::Rejected(format!("clue {clue_number} of round {key} not found"))
      })?;
    let guesser_id = self.person_id(guesser).await?;

    match self
      .store
      .find_guess(clue.clue_id, guesser_id)
      .await
      .map_err(fatal)?
    {
      None => {
        self
          .store
          .create_guess(NewGuess::new(clue.clue_id, guesser_id, guessed_word))
          .await
          .map_err(fatal)?;
      }
      Some(_) if !self.overwrite => return Ok(Outcome::Skipped),
      Some(guess) => {
        self
          .store
          .update_guess(guess.guess_id, guessed_word)
          .await
          .map_err(fatal)?;
      }
    }
    Ok(Outcome::Imported)
  }
}
