//! Statistics types and the arithmetic behind them.
//!
//! Stores return raw tallies ([`RoundResult`], [`DatedTally`], …). Everything
//! derived from those tallies (percentages, medians, day-of-week and decade
//! grouping) is computed here so every backend agrees on the edge cases:
//!
//! - a percentage over zero answers is `0`, never `NaN`;
//! - the median of an even-length series is the mean of its middle pair;
//! - every summary of an empty series is all zeros.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{clue::Direction, person::PersonId, round::RoundId};

// ─── Arithmetic ──────────────────────────────────────────────────────────────

/// `100 * correct / answered`, or `0` when nothing was answered.
pub fn percentage(correct: u64, answered: u64) -> f64 {
  if answered == 0 {
    return 0.0;
  }
  100.0 * correct as f64 / answered as f64
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 { (value * 10.0).round() / 10.0 }

/// Render a percentage the way reports show it, e.g. `66.7%`.
pub fn format_percentage(value: f64) -> String { format!("{value:.1}%") }

/// Median of `values`; `0` for an empty slice.
pub fn median(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(f64::total_cmp);
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    (sorted[mid - 1] + sorted[mid]) / 2.0
  } else {
    sorted[mid]
  }
}

/// Arithmetic mean rounded to one decimal; `0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  round1(values.iter().sum::<f64>() / values.len() as f64)
}

/// Day of week with Sunday as 1 and Saturday as 7.
pub fn day_of_week(date: NaiveDate) -> u8 {
  date.weekday().number_from_sunday() as u8
}

/// `floor(year / 10) * 10`.
pub fn decade(date: NaiveDate) -> i32 { date.year().div_euclid(10) * 10 }

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Min / mean / median / max over one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub min:    f64,
  /// Rounded to one decimal.
  pub mean:   f64,
  pub median: f64,
  pub max:    f64,
}

impl Summary {
  pub fn from_values(values: &[f64]) -> Self {
    if values.is_empty() {
      return Self::default();
    }
    Self {
      min:    values.iter().copied().fold(f64::INFINITY, f64::min),
      mean:   mean(values),
      median: median(values),
      max:    values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
  }

  /// The same summary rendered as percentage strings.
  pub fn as_percentages(&self) -> FormattedSummary {
    FormattedSummary {
      min:    format_percentage(self.min),
      mean:   format_percentage(self.mean),
      median: format_percentage(self.median),
      max:    format_percentage(self.max),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedSummary {
  pub min:    String,
  pub mean:   String,
  pub median: String,
  pub max:    String,
}

// ─── Round-level results ─────────────────────────────────────────────────────

/// How one guesser did in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuesserSummary {
  pub person_id:     PersonId,
  pub full_name:     String,
  pub total_guesses: u64,
  pub correct_count: u64,
  pub percentage:    f64,
}

impl GuesserSummary {
  pub fn new(
    person_id: PersonId,
    full_name: String,
    total_guesses: u64,
    correct_count: u64,
  ) -> Self {
    Self {
      person_id,
      full_name,
      total_guesses,
      correct_count,
      percentage: percentage(correct_count, total_guesses),
    }
  }
}

/// One person's tally for one round they were assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
  pub round_id:      RoundId,
  pub round_date:    NaiveDate,
  pub round_number:  u32,
  pub answered:      u64,
  pub correct_count: u64,
  pub percentage:    f64,
}

impl RoundResult {
  pub fn new(
    round_id: RoundId,
    round_date: NaiveDate,
    round_number: u32,
    answered: u64,
    correct_count: u64,
  ) -> Self {
    Self {
      round_id,
      round_date,
      round_number,
      answered,
      correct_count,
      percentage: percentage(correct_count, answered),
    }
  }
}

/// Distribution of a person's per-round results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundDistribution {
  pub rounds:     usize,
  /// Over the number of correct guesses per round.
  pub correct:    Summary,
  /// Over the percentage correct per round.
  pub percentage: Summary,
}

impl RoundDistribution {
  pub fn from_results(results: &[RoundResult]) -> Self {
    let correct: Vec<f64> =
      results.iter().map(|r| r.correct_count as f64).collect();
    let percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
    Self {
      rounds:     results.len(),
      correct:    Summary::from_values(&correct),
      percentage: Summary::from_values(&percentages),
    }
  }
}

// ─── Person-level results ────────────────────────────────────────────────────

/// Career totals for one person as a guesser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonStats {
  pub rounds_played:  u64,
  pub clues_answered: u64,
  pub correct_count:  u64,
  pub percentage:     f64,
}

impl PersonStats {
  pub fn new(rounds_played: u64, clues_answered: u64, correct_count: u64) -> Self {
    Self {
      rounds_played,
      clues_answered,
      correct_count,
      percentage: percentage(correct_count, clues_answered),
    }
  }
}

// ─── Breakdowns ──────────────────────────────────────────────────────────────

/// The dimension a breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownDimension {
  ClueNumber,
  Direction,
  DayOfWeek,
  Decade,
  Constructor,
}

/// The group key of one breakdown row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BreakdownKey {
  ClueNumber(u32),
  Direction(Direction),
  /// 1 = Sunday … 7 = Saturday.
  DayOfWeek(u8),
  Decade(i32),
  Constructor {
    person_id: PersonId,
    full_name: String,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
  pub key:            BreakdownKey,
  pub total_answered: u64,
  pub correct_count:  u64,
  pub percentage:     f64,
}

impl BreakdownRow {
  pub fn new(key: BreakdownKey, total_answered: u64, correct_count: u64) -> Self {
    Self {
      key,
      total_answered,
      correct_count,
      percentage: percentage(correct_count, total_answered),
    }
  }
}

/// Answers a person gave to clues from puzzles published on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatedTally {
  pub date:     NaiveDate,
  pub answered: u64,
  pub correct:  u64,
}

/// Regroup per-date tallies under a key derived from the date.
pub fn group_by_date<F>(tallies: &[DatedTally], key_of: F) -> Vec<BreakdownRow>
where
  F: Fn(NaiveDate) -> BreakdownKey,
{
  let mut groups: BTreeMap<BreakdownKey, (u64, u64)> = BTreeMap::new();
  for t in tallies {
    let entry = groups.entry(key_of(t.date)).or_default();
    entry.0 += t.answered;
    entry.1 += t.correct;
  }
  groups
    .into_iter()
    .map(|(key, (answered, correct))| BreakdownRow::new(key, answered, correct))
    .collect()
}

pub fn by_day_of_week(tallies: &[DatedTally]) -> Vec<BreakdownRow> {
  group_by_date(tallies, |d| BreakdownKey::DayOfWeek(day_of_week(d)))
}

pub fn by_decade(tallies: &[DatedTally]) -> Vec<BreakdownRow> {
  group_by_date(tallies, |d| BreakdownKey::Decade(decade(d)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn median_follows_standard_definition() {
    assert_eq!(median(&[]), 0.0);
    assert_eq!(median(&[5.0]), 5.0);
    assert_eq!(median(&[2.0, 8.0]), 5.0);
    assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
    assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
  }

  #[test]
  fn percentage_of_nothing_is_zero() {
    assert_eq!(percentage(0, 0), 0.0);
    assert!(!percentage(0, 0).is_nan());
    assert_eq!(percentage(3, 4), 75.0);
  }

  #[test]
  fn mean_is_rounded_to_one_decimal() {
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(mean(&[1.0, 2.0, 2.0]), 1.7);
    assert_eq!(mean(&[10.0, 20.0]), 15.0);
  }

  #[test]
  fn percentages_format_with_one_decimal() {
    assert_eq!(format_percentage(percentage(2, 3)), "66.7%");
    assert_eq!(format_percentage(0.0), "0.0%");
  }

  #[test]
  fn summary_of_empty_series_is_zero() {
    assert_eq!(Summary::from_values(&[]), Summary::default());
  }

  #[test]
  fn summary_of_series() {
    let s = Summary::from_values(&[4.0, 1.0, 7.0, 2.0]);
    assert_eq!(s.min, 1.0);
    assert_eq!(s.max, 7.0);
    assert_eq!(s.median, 3.0);
    assert_eq!(s.mean, 3.5);
  }

  #[test]
  fn distribution_covers_both_series() {
    let results = vec![
      RoundResult::new(1, date(2024, 1, 1), 1, 4, 3),
      RoundResult::new(2, date(2024, 1, 8), 1, 4, 1),
      RoundResult::new(3, date(2024, 1, 15), 1, 0, 0),
    ];
    let d = RoundDistribution::from_results(&results);
    assert_eq!(d.rounds, 3);
    assert_eq!(d.correct.median, 1.0);
    assert_eq!(d.correct.max, 3.0);
    assert_eq!(d.percentage.min, 0.0);
    assert_eq!(d.percentage.median, 25.0);
    assert_eq!(d.percentage.max, 75.0);
    assert_eq!(d.percentage.mean, 33.3);
  }

  #[test]
  fn days_of_week_start_on_sunday() {
    // 2024-01-07 was a Sunday, 2024-01-13 a Saturday.
    assert_eq!(day_of_week(date(2024, 1, 7)), 1);
    assert_eq!(day_of_week(date(2024, 1, 13)), 7);
  }

  #[test]
  fn decades_floor_the_year() {
    assert_eq!(decade(date(1999, 12, 31)), 1990);
    assert_eq!(decade(date(2000, 1, 1)), 2000);
    assert_eq!(decade(date(2024, 6, 1)), 2020);
  }

  #[test]
  fn tallies_regroup_by_decade_and_weekday() {
    let tallies = [
      DatedTally { date: date(1995, 1, 1), answered: 2, correct: 1 },
      DatedTally { date: date(1998, 1, 4), answered: 3, correct: 3 },
      DatedTally { date: date(2021, 1, 5), answered: 1, correct: 0 },
    ];

    let decades = by_decade(&tallies);
    assert_eq!(decades.len(), 2);
    assert_eq!(decades[0], BreakdownRow::new(BreakdownKey::Decade(1990), 5, 4));
    assert_eq!(decades[1], BreakdownRow::new(BreakdownKey::Decade(2020), 1, 0));

    // 1995-01-01 and 1998-01-04 were both Sundays.
    let days = by_day_of_week(&tallies);
    assert_eq!(days[0].key, BreakdownKey::DayOfWeek(1));
    assert_eq!(days[0].total_answered, 5);
    assert_eq!(days[1].key, BreakdownKey::DayOfWeek(3));
    assert_eq!(days[1].percentage, 0.0);
  }
}
