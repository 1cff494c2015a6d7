//! Clue — one question inside a round, usually lifted from a crossword.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  Error, Result, normalize::upper, puzzle::PuzzleId, round::RoundId,
};

pub type ClueId = i64;

/// Which way the clue's entry runs in the source puzzle.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString,
  Serialize, Deserialize,
)]
pub enum Direction {
  #[strum(serialize = "A")]
  #[serde(rename = "A")]
  Across,
  #[strum(serialize = "D")]
  #[serde(rename = "D")]
  Down,
}

impl Direction {
  /// Normalise free-form input: the first character, upper-cased, must be
  /// `A` or `D`. So `"across"`, `"a"` and `"Down"` are all accepted.
  pub fn normalize(raw: &str) -> Result<Self> {
    let first = raw.trim().chars().next().map(|c| c.to_ascii_uppercase());
    match first {
      Some('A') => Ok(Self::Across),
      Some('D') => Ok(Self::Down),
      _ => Err(Error::InvalidDirection(raw.trim().to_owned())),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Across => "A",
      Self::Down => "D",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
  pub clue_id:               ClueId,
  pub round_id:              RoundId,
  pub clue_number:           u32,
  /// May dangle if the puzzle was deleted; see the data check.
  pub puzzle_id:             Option<PuzzleId>,
  pub puzzle_clue_number:    Option<u32>,
  pub puzzle_clue_direction: Option<Direction>,
  pub clue_text:             Option<String>,
  /// Always upper-case.
  pub correct_answer:        String,
}

/// Input to [`crate::store::KealoaStore::create_clue`] and
/// [`crate::store::KealoaStore::update_clue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClue {
  pub round_id:              RoundId,
  pub clue_number:           u32,
  pub puzzle_id:             Option<PuzzleId>,
  pub puzzle_clue_number:    Option<u32>,
  pub puzzle_clue_direction: Option<Direction>,
  pub clue_text:             Option<String>,
  pub correct_answer:        String,
}

impl NewClue {
  pub fn new(round_id: RoundId, clue_number: u32, correct_answer: &str) -> Self {
    Self {
      round_id,
      clue_number,
      puzzle_id: None,
      puzzle_clue_number: None,
      puzzle_clue_direction: None,
      clue_text: None,
      correct_answer: upper(correct_answer),
    }
  }
}
