//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text so that lexical order is date order
//! and SQLite's `strftime` can read them. Directions are stored as `A` / `D`.

use std::str::FromStr as _;

use chrono::NaiveDate;
use kealoa_core::{
  clue::{Clue, Direction},
  guess::Guess,
  person::Person,
  puzzle::Puzzle,
  round::Round,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String {
  date.format(DATE_FORMAT).to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Direction ───────────────────────────────────────────────────────────────

pub fn encode_direction(d: Direction) -> &'static str { d.as_str() }

pub fn decode_direction(s: &str) -> Result<Direction> {
  Direction::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown direction: {s:?}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Qualify every column in a comma-separated list with a table alias, for
/// use in joins.
pub fn prefixed(alias: &str, columns: &str) -> String {
  columns
    .split(',')
    .map(|c| format!("{alias}.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// SQLite hands back `COUNT`/`SUM` as signed integers.
pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Persons and guesses have no encoded columns and are built directly from
// rows. The other kinds go through a `Raw*` struct holding the undecoded
// text, mirroring how rows leave the connection thread.

pub const PERSON_COLUMNS: &str = "person_id, full_name, nicknames, home_page_url, \
   media_id, xwordinfo_profile_name, xwordinfo_image_url";

pub fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
  Ok(Person {
    person_id:              row.get(0)?,
    full_name:              row.get(1)?,
    nicknames:              row.get(2)?,
    home_page_url:          row.get(3)?,
    media_id:               row.get(4)?,
    xwordinfo_profile_name: row.get(5)?,
    xwordinfo_image_url:    row.get(6)?,
  })
}

pub const GUESS_COLUMNS: &str =
  "guess_id, clue_id, guesser_id, guessed_word, is_correct";

pub fn guess_from_row(row: &Row<'_>) -> rusqlite::Result<Guess> {
  Ok(Guess {
    guess_id:     row.get(0)?,
    clue_id:      row.get(1)?,
    guesser_id:   row.get(2)?,
    guessed_word: row.get(3)?,
    is_correct:   row.get(4)?,
  })
}

pub const PUZZLE_COLUMNS: &str = "puzzle_id, publication_date, editor_id";

pub struct RawPuzzle {
  pub puzzle_id:        i64,
  pub publication_date: String,
  pub editor_id:        Option<i64>,
}

impl RawPuzzle {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      puzzle_id:        row.get(0)?,
      publication_date: row.get(1)?,
      editor_id:        row.get(2)?,
    })
  }

  pub fn into_puzzle(self) -> Result<Puzzle> {
    Ok(Puzzle {
      puzzle_id:        self.puzzle_id,
      publication_date: decode_date(&self.publication_date)?,
      editor_id:        self.editor_id,
    })
  }
}

pub const ROUND_COLUMNS: &str = "round_id, round_date, round_number, \
   episode_number, episode_id, episode_url, episode_start_seconds, \
   clue_giver_id, description, description2";

pub struct RawRound {
  pub round_id:              i64,
  pub round_date:            String,
  pub round_number:          u32,
  pub episode_number:        Option<u32>,
  pub episode_id:            Option<i64>,
  pub episode_url:           Option<String>,
  pub episode_start_seconds: Option<u32>,
  pub clue_giver_id:         i64,
  pub description:           Option<String>,
  pub description2:          Option<String>,
}

impl RawRound {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      round_id:              row.get(0)?,
      round_date:            row.get(1)?,
      round_number:          row.get(2)?,
      episode_number:        row.get(3)?,
      episode_id:            row.get(4)?,
      episode_url:           row.get(5)?,
      episode_start_seconds: row.get(6)?,
      clue_giver_id:         row.get(7)?,
      description:           row.get(8)?,
      description2:          row.get(9)?,
    })
  }

  pub fn into_round(self) -> Result<Round> {
    Ok(Round {
      round_id:              self.round_id,
      round_date:            decode_date(&self.round_date)?,
      round_number:          self.round_number,
      episode_number:        self.episode_number,
      episode_id:            self.episode_id,
      episode_url:           self.episode_url,
      episode_start_seconds: self.episode_start_seconds,
      clue_giver_id:         self.clue_giver_id,
      description:           self.description,
      description2:          self.description2,
    })
  }
}

pub const CLUE_COLUMNS: &str = "clue_id, round_id, clue_number, puzzle_id, \
   puzzle_clue_number, puzzle_clue_direction, clue_text, correct_answer";

pub struct RawClue {
  pub clue_id:               i64,
  pub round_id:              i64,
  pub clue_number:           u32,
  pub puzzle_id:             Option<i64>,
  pub puzzle_clue_number:    Option<u32>,
  pub puzzle_clue_direction: Option<String>,
  pub clue_text:             Option<String>,
  pub correct_answer:        String,
}

impl RawClue {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      clue_id:               row.get(0)?,
      round_id:              row.get(1)?,
      clue_number:           row.get(2)?,
      puzzle_id:             row.get(3)?,
      puzzle_clue_number:    row.get(4)?,
      puzzle_clue_direction: row.get(5)?,
      clue_text:             row.get(6)?,
      correct_answer:        row.get(7)?,
    })
  }

  pub fn into_clue(self) -> Result<Clue> {
    Ok(Clue {
      clue_id:               self.clue_id,
      round_id:              self.round_id,
      clue_number:           self.clue_number,
      puzzle_id:             self.puzzle_id,
      puzzle_clue_number:    self.puzzle_clue_number,
      puzzle_clue_direction: self
        .puzzle_clue_direction
        .as_deref()
        .map(decode_direction)
        .transpose()?,
      clue_text:             self.clue_text,
      correct_answer:        self.correct_answer,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_use_iso_text() {
    let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(encode_date(d), "2024-01-01");
    assert_eq!(decode_date("2024-01-01").unwrap(), d);
    assert!(matches!(decode_date("01/01/2024"), Err(Error::Decode(_))));
  }

  #[test]
  fn prefixed_qualifies_each_column() {
    assert_eq!(prefixed("g", "guess_id, clue_id"), "g.guess_id, g.clue_id");
  }

  #[test]
  fn directions_use_single_letters() {
    assert_eq!(encode_direction(Direction::Down), "D");
    assert_eq!(decode_direction("A").unwrap(), Direction::Across);
    assert!(decode_direction("Across").is_err());
  }
}
