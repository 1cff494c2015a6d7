//! Error type for `kealoa-store-sqlite`.

use chrono::NaiveDate;
use kealoa_core::{
  clue::ClueId, guess::GuessId, person::PersonId, puzzle::PuzzleId,
  round::{RoundId, RoundKey},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kealoa_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  #[error("puzzle not found: {0}")]
  PuzzleNotFound(PuzzleId),

  #[error("round not found: {0}")]
  RoundNotFound(RoundId),

  #[error("clue not found: {0}")]
  ClueNotFound(ClueId),

  #[error("guess not found: {0}")]
  GuessNotFound(GuessId),

  #[error("a person named {0:?} already exists")]
  DuplicatePerson(String),

  #[error("a puzzle dated {0} already exists")]
  DuplicatePuzzle(NaiveDate),

  #[error("round {0} already exists")]
  DuplicateRound(RoundKey),

  #[error("round {round_id} already has clue {clue_number}")]
  DuplicateClue { round_id: RoundId, clue_number: u32 },

  #[error("person {guesser_id} already guessed clue {clue_id}")]
  DuplicateGuess { clue_id: ClueId, guesser_id: PersonId },

  #[error("person {0} is the clue giver of at least one round")]
  PersonHostsRounds(PersonId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
