//! Round — one game of KEALOA, keyed by date and round number.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::person::PersonId;

pub type RoundId = i64;

/// Round number assumed when a date carries a single round.
pub const DEFAULT_ROUND_NUMBER: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
  pub round_id:              RoundId,
  pub round_date:            NaiveDate,
  pub round_number:          u32,
  pub episode_number:        Option<u32>,
  pub episode_id:            Option<i64>,
  pub episode_url:           Option<String>,
  pub episode_start_seconds: Option<u32>,
  pub clue_giver_id:         PersonId,
  pub description:           Option<String>,
  pub description2:          Option<String>,
}

/// Natural key of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundKey {
  pub date:   NaiveDate,
  pub number: u32,
}

impl RoundKey {
  pub fn new(date: NaiveDate, number: u32) -> Self { Self { date, number } }
}

impl std::fmt::Display for RoundKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.number == DEFAULT_ROUND_NUMBER {
      write!(f, "{}", self.date)
    } else {
      write!(f, "{} round {}", self.date, self.number)
    }
  }
}

/// Input to [`crate::store::KealoaStore::create_round`] and
/// [`crate::store::KealoaStore::update_round`].
///
/// `solution_words` are stored upper-cased in the order given; on update both
/// `solution_words` and `guesser_ids` replace the stored sets in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRound {
  pub round_date:            NaiveDate,
  pub round_number:          u32,
  pub episode_number:        Option<u32>,
  pub episode_id:            Option<i64>,
  pub episode_url:           Option<String>,
  pub episode_start_seconds: Option<u32>,
  pub clue_giver_id:         PersonId,
  pub description:           Option<String>,
  pub description2:          Option<String>,
  pub solution_words:        Vec<String>,
  pub guesser_ids:           Vec<PersonId>,
}

impl NewRound {
  /// A round with only its required fields set.
  pub fn new(round_date: NaiveDate, clue_giver_id: PersonId) -> Self {
    Self {
      round_date,
      round_number: DEFAULT_ROUND_NUMBER,
      episode_number: None,
      episode_id: None,
      episode_url: None,
      episode_start_seconds: None,
      clue_giver_id,
      description: None,
      description2: None,
      solution_words: Vec::new(),
      guesser_ids: Vec::new(),
    }
  }

  pub fn key(&self) -> RoundKey { RoundKey::new(self.round_date, self.round_number) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_key_display_omits_default_number() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(RoundKey::new(date, 1).to_string(), "2024-01-01");
    assert_eq!(RoundKey::new(date, 2).to_string(), "2024-01-01 round 2");
  }
}
