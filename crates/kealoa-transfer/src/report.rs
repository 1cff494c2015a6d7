//! Read-only reports assembled from the store's statistics queries.

use kealoa_core::{
  clue::Clue,
  person::{Person, PersonId, PersonRoles},
  round::{Round, RoundKey},
  stats::{
    BreakdownDimension, BreakdownRow, FormattedSummary, GuesserSummary,
    PersonStats, RoundDistribution, RoundResult, format_percentage,
  },
  store::KealoaStore,
};
use serde::Serialize;

use crate::{Error, Result};

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PersonReport {
  pub person:                   Person,
  pub roles:                    PersonRoles,
  pub stats:                    PersonStats,
  /// `stats.percentage` as shown to readers, e.g. `66.7%`.
  pub overall_percentage:       String,
  pub rounds:                   Vec<RoundResult>,
  pub distribution:             RoundDistribution,
  pub distribution_percentages: FormattedSummary,
  pub breakdowns:               Breakdowns,
}

#[derive(Debug, Clone, Serialize)]
pub struct Breakdowns {
  pub clue_number: Vec<BreakdownRow>,
  pub direction:   Vec<BreakdownRow>,
  pub day_of_week: Vec<BreakdownRow>,
  pub decade:      Vec<BreakdownRow>,
  pub constructor: Vec<BreakdownRow>,
}

async fn person_named<S: KealoaStore>(store: &S, full_name: &str) -> Result<Person> {
  store
    .find_person_by_name(full_name)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::PersonNotFound(full_name.trim().to_owned()))
}

async fn breakdown<S: KealoaStore>(
  store: &S,
  id: PersonId,
  dimension: BreakdownDimension,
) -> Result<Vec<BreakdownRow>> {
  store.person_breakdown(id, dimension).await.map_err(Error::store)
}

/// Everything known about one person's play, looked up by name.
///
/// A person who never played gets a report of zeros.
pub async fn person_report<S: KealoaStore>(store: &S, full_name: &str) -> Result<PersonReport> {
  let person = person_named(store, full_name).await?;
  let id = person.person_id;

  let roles = store.person_roles(id).await.map_err(Error::store)?;
  let stats = store.person_stats(id).await.map_err(Error::store)?;
  let rounds = store.person_round_results(id).await.map_err(Error::store)?;
  let distribution = RoundDistribution::from_results(&rounds);

  let breakdowns = Breakdowns {
    clue_number: breakdown(store, id, BreakdownDimension::ClueNumber).await?,
    direction:   breakdown(store, id, BreakdownDimension::Direction).await?,
    day_of_week: breakdown(store, id, BreakdownDimension::DayOfWeek).await?,
    decade:      breakdown(store, id, BreakdownDimension::Decade).await?,
    constructor: breakdown(store, id, BreakdownDimension::Constructor).await?,
  };

  Ok(PersonReport {
    person,
    roles,
    overall_percentage: format_percentage(stats.percentage),
    stats,
    rounds,
    distribution_percentages: distribution.percentage.as_percentages(),
    distribution,
    breakdowns,
  })
}

#[derive(Debug, Clone, Serialize)]
pub struct RolesReport {
  pub person: Person,
  pub roles:  PersonRoles,
}

pub async fn roles_report<S: KealoaStore>(store: &S, full_name: &str) -> Result<RolesReport> {
  let person = person_named(store, full_name).await?;
  let roles = store
    .person_roles(person.person_id)
    .await
    .map_err(Error::store)?;
  Ok(RolesReport { person, roles })
}

// ─── Round ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
  pub round:          Round,
  pub clue_giver:     Option<Person>,
  pub solution_words: Vec<String>,
  pub guessers:       Vec<GuesserSummary>,
  pub clues:          Vec<Clue>,
}

/// One round with its guessers' scores.
pub async fn round_report<S: KealoaStore>(store: &S, key: RoundKey) -> Result<RoundReport> {
  let round = store
    .find_round(key)
    .await
    .map_err(Error::store)?
    .ok_or(Error::RoundNotFound(key))?;
  let id = round.round_id;

  Ok(RoundReport {
    clue_giver:     store
      .get_person(round.clue_giver_id)
      .await
      .map_err(Error::store)?,
    solution_words: store.round_solutions(id).await.map_err(Error::store)?,
    guessers:       store.guesser_summaries(id).await.map_err(Error::store)?,
    clues:          store.list_clues(id).await.map_err(Error::store)?,
    round,
  })
}
