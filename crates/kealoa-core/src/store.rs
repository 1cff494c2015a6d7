//! The `KealoaStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `kealoa-store-sqlite`).
//! Higher layers (`kealoa-transfer`, `kealoa-cli`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  check::{DataCheckReport, RepairSummary},
  clue::{Clue, ClueId, NewClue},
  guess::{Guess, GuessId, NewGuess},
  person::{NewPerson, Person, PersonId, PersonRoles},
  puzzle::{NewPuzzle, Puzzle, PuzzleId},
  round::{NewRound, Round, RoundId, RoundKey},
  stats::{
    BreakdownDimension, BreakdownRow, GuesserSummary, PersonStats, RoundResult,
  },
};

/// Abstraction over a KEALOA store backend.
///
/// Invariants every backend upholds:
///
/// - person names are unique ignoring case, puzzle dates are unique, round
///   keys are unique, clue numbers are unique per round, and a person guesses
///   a clue at most once;
/// - answers, solution words and guessed words are stored upper-cased;
/// - a guess's `is_correct` is computed by the store from the clue's answer
///   whenever the guess or its clue is written;
/// - ordered children (solution words, constructors) are replaced in full
///   inside one transaction.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait KealoaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Persons ───────────────────────────────────────────────────────────

  /// Returns a conflict error if the name is taken (ignoring case).
  fn create_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Exact match on the trimmed name, ignoring case.
  fn find_person_by_name<'a>(
    &'a self,
    full_name: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// Look the name up and insert a name-only person if it is absent, as one
  /// atomic step. The flag is `true` when a person was created.
  fn find_or_create_person<'a>(
    &'a self,
    full_name: &'a str,
  ) -> impl Future<Output = Result<(Person, bool), Self::Error>> + Send + 'a;

  fn update_person(
    &self,
    id: PersonId,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Delete a person with their guesses and junction rows. Fails if the
  /// person hosts any round. Returns `false` if there was no such person.
  fn delete_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All persons ordered by name.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn person_roles(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<PersonRoles, Self::Error>> + Send + '_;

  // ── Puzzles ───────────────────────────────────────────────────────────

  fn create_puzzle(
    &self,
    input: NewPuzzle,
  ) -> impl Future<Output = Result<Puzzle, Self::Error>> + Send + '_;

  fn get_puzzle(
    &self,
    id: PuzzleId,
  ) -> impl Future<Output = Result<Option<Puzzle>, Self::Error>> + Send + '_;

  fn find_puzzle_by_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Puzzle>, Self::Error>> + Send + '_;

  /// Like [`Self::find_or_create_person`], for a constructor-less puzzle.
  fn find_or_create_puzzle(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<(Puzzle, bool), Self::Error>> + Send + '_;

  fn update_puzzle(
    &self,
    id: PuzzleId,
    input: NewPuzzle,
  ) -> impl Future<Output = Result<Puzzle, Self::Error>> + Send + '_;

  /// Delete a puzzle and its constructor links. Clues that referenced it are
  /// left dangling; see [`Self::data_check`].
  fn delete_puzzle(
    &self,
    id: PuzzleId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All puzzles ordered by publication date.
  fn list_puzzles(
    &self,
  ) -> impl Future<Output = Result<Vec<Puzzle>, Self::Error>> + Send + '_;

  /// Constructors in `constructor_order`.
  fn puzzle_constructors(
    &self,
    id: PuzzleId,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Rounds ────────────────────────────────────────────────────────────

  fn create_round(
    &self,
    input: NewRound,
  ) -> impl Future<Output = Result<Round, Self::Error>> + Send + '_;

  fn get_round(
    &self,
    id: RoundId,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  fn find_round(
    &self,
    key: RoundKey,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  fn update_round(
    &self,
    id: RoundId,
    input: NewRound,
  ) -> impl Future<Output = Result<Round, Self::Error>> + Send + '_;

  /// Delete a round with its clues, guesses, solution words and guesser
  /// links.
  fn delete_round(
    &self,
    id: RoundId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All rounds ordered by date then number.
  fn list_rounds(
    &self,
  ) -> impl Future<Output = Result<Vec<Round>, Self::Error>> + Send + '_;

  /// Solution words in `word_order`.
  fn round_solutions(
    &self,
    id: RoundId,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Guessers ordered by name.
  fn round_guessers(
    &self,
    id: RoundId,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Clues ─────────────────────────────────────────────────────────────

  fn create_clue(
    &self,
    input: NewClue,
  ) -> impl Future<Output = Result<Clue, Self::Error>> + Send + '_;

  fn get_clue(
    &self,
    id: ClueId,
  ) -> impl Future<Output = Result<Option<Clue>, Self::Error>> + Send + '_;

  fn find_clue(
    &self,
    round_id: RoundId,
    clue_number: u32,
  ) -> impl Future<Output = Result<Option<Clue>, Self::Error>> + Send + '_;

  /// Update a clue and re-derive `is_correct` for all of its guesses.
  fn update_clue(
    &self,
    id: ClueId,
    input: NewClue,
  ) -> impl Future<Output = Result<Clue, Self::Error>> + Send + '_;

  fn delete_clue(
    &self,
    id: ClueId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Clues of one round ordered by clue number.
  fn list_clues(
    &self,
    round_id: RoundId,
  ) -> impl Future<Output = Result<Vec<Clue>, Self::Error>> + Send + '_;

  // ── Guesses ───────────────────────────────────────────────────────────

  fn create_guess(
    &self,
    input: NewGuess,
  ) -> impl Future<Output = Result<Guess, Self::Error>> + Send + '_;

  /// Replace the guessed word and re-derive `is_correct`.
  fn update_guess<'a>(
    &'a self,
    id: GuessId,
    guessed_word: &'a str,
  ) -> impl Future<Output = Result<Guess, Self::Error>> + Send + 'a;

  fn find_guess(
    &self,
    clue_id: ClueId,
    guesser_id: PersonId,
  ) -> impl Future<Output = Result<Option<Guess>, Self::Error>> + Send + '_;

  fn delete_guess(
    &self,
    id: GuessId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Guesses for one clue ordered by guesser name.
  fn list_guesses(
    &self,
    clue_id: ClueId,
  ) -> impl Future<Output = Result<Vec<Guess>, Self::Error>> + Send + '_;

  // ── Statistics ────────────────────────────────────────────────────────

  /// Everyone who played the round: its listed guessers, including those
  /// without guesses, plus anyone who guessed in it.
  fn guesser_summaries(
    &self,
    round_id: RoundId,
  ) -> impl Future<Output = Result<Vec<GuesserSummary>, Self::Error>> + Send + '_;

  /// Career totals; all zeros for a person with no history.
  fn person_stats(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<PersonStats, Self::Error>> + Send + '_;

  /// One entry per round the person played (listed as guesser or guessed
  /// in), in date order.
  fn person_round_results(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<RoundResult>, Self::Error>> + Send + '_;

  fn person_breakdown(
    &self,
    person_id: PersonId,
    dimension: BreakdownDimension,
  ) -> impl Future<Output = Result<Vec<BreakdownRow>, Self::Error>> + Send + '_;

  // ── Data check ────────────────────────────────────────────────────────

  fn data_check(
    &self,
  ) -> impl Future<Output = Result<DataCheckReport, Self::Error>> + Send + '_;

  /// Clear dangling puzzle references and re-derive stale `is_correct`
  /// flags.
  fn repair_data(
    &self,
  ) -> impl Future<Output = Result<RepairSummary, Self::Error>> + Send + '_;
}
