//! Puzzle — a published crossword, keyed by its publication date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::person::PersonId;

pub type PuzzleId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
  pub puzzle_id:        PuzzleId,
  pub publication_date: NaiveDate,
  pub editor_id:        Option<PersonId>,
}

/// Input to [`crate::store::KealoaStore::create_puzzle`] and
/// [`crate::store::KealoaStore::update_puzzle`].
///
/// `constructor_ids` is positional: the first id gets `constructor_order` 1.
/// On update the stored list is replaced in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPuzzle {
  pub publication_date: NaiveDate,
  pub editor_id:        Option<PersonId>,
  pub constructor_ids:  Vec<PersonId>,
}

impl NewPuzzle {
  pub fn new(publication_date: NaiveDate) -> Self {
    Self { publication_date, editor_id: None, constructor_ids: Vec::new() }
  }
}
