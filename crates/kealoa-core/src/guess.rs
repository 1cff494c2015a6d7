//! Guess — one guesser's answer to one clue.

use serde::{Deserialize, Serialize};

use crate::{clue::ClueId, normalize::upper, person::PersonId};

pub type GuessId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
  pub guess_id:     GuessId,
  pub clue_id:      ClueId,
  pub guesser_id:   PersonId,
  /// Always upper-case.
  pub guessed_word: String,
  /// Derived from the clue's answer when the guess (or the clue) was last
  /// written. Never accepted from callers.
  pub is_correct:   bool,
}

/// Input to [`crate::store::KealoaStore::create_guess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuess {
  pub clue_id:      ClueId,
  pub guesser_id:   PersonId,
  pub guessed_word: String,
}

impl NewGuess {
  pub fn new(clue_id: ClueId, guesser_id: PersonId, guessed_word: &str) -> Self {
    Self { clue_id, guesser_id, guessed_word: upper(guessed_word) }
  }
}

/// Whether `guessed_word` answers a clue whose answer is `correct_answer`.
///
/// Comparison ignores case and surrounding whitespace.
pub fn is_correct(guessed_word: &str, correct_answer: &str) -> bool {
  upper(guessed_word) == upper(correct_answer)
}
