//! Data check — integrity problems the schema does not prevent.

use serde::{Deserialize, Serialize};

use crate::{clue::Clue, guess::Guess};

/// Problems found by [`crate::store::KealoaStore::data_check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCheckReport {
  /// Clues whose `puzzle_id` names a puzzle that no longer exists.
  pub orphan_clues:  Vec<Clue>,
  /// Guesses whose stored `is_correct` disagrees with the clue's current
  /// answer.
  pub stale_guesses: Vec<Guess>,
}

impl DataCheckReport {
  pub fn is_clean(&self) -> bool {
    self.orphan_clues.is_empty() && self.stale_guesses.is_empty()
  }
}

/// Rows changed by [`crate::store::KealoaStore::repair_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSummary {
  pub cleared_puzzle_refs: u64,
  pub corrected_guesses:   u64,
}
