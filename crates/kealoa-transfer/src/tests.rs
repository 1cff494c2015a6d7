//! Import, export and report tests against an in-memory SQLite store.

use std::io::Cursor;

use chrono::NaiveDate;
use kealoa_core::{kind::EntityKind, round::RoundKey, store::KealoaStore};
use kealoa_csv::{Bundle, parse, write_bundle};
use kealoa_store_sqlite::SqliteStore;

use crate::{Error, Exporter, ImportResult, Importer, report};

const PERSONS: &str = "full_name,home_page_url
Pat Lee,https://example.com/pat
Quiz Master,
";

const PUZZLES: &str = "publication_date,constructors
2023-12-31,\"Bea Bee, Al Ay\"
";

const ROUNDS: &str = "round_date,episode_number,clue_giver,episode_url,episode_start_seconds,guessers,solution_words,description
2024-01-01,101,Quiz Master,https://example.com/ep101,95,\"Pat Lee, Sam Kim\",\"kea, loa\",Birds
";

const CLUES: &str = "round_date,clue_number,puzzle_date,puzzle_clue_number,puzzle_clue_direction,clue_text,correct_answer
2024-01-01,1,2023-12-31,17,Across,Hawaiian parrot,kea
2024-01-01,2,2023-12-31,4,D,Hawaiian for long,loa
";

const GUESSES: &str = "round_date,clue_number,guesser,guessed_word
2024-01-01,1,Pat Lee,KEA
2024-01-01,2,Pat Lee,kea
2024-01-01,1,Sam Kim,kea
";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn import(s: &SqliteStore, kind: EntityKind, csv: &str) -> ImportResult {
  Importer::new(s)
    .import_csv(kind, csv.as_bytes())
    .await
    .expect("import")
}

async fn import_overwriting(s: &SqliteStore, kind: EntityKind, csv: &str) -> ImportResult {
  Importer::new(s)
    .overwrite(true)
    .import_csv(kind, csv.as_bytes())
    .await
    .expect("import")
}

/// A store holding one fully populated round.
async fn seeded() -> SqliteStore {
  let s = store().await;
  for (kind, csv) in [
    (EntityKind::Persons, PERSONS),
    (EntityKind::Puzzles, PUZZLES),
    (EntityKind::Rounds, ROUNDS),
    (EntityKind::Clues, CLUES),
    (EntityKind::Guesses, GUESSES),
  ] {
    let result = import(&s, kind, csv).await;
    assert!(result.errors.is_empty(), "{kind}: {:?}", result.errors);
  }
  s
}

fn imported(n: u64) -> ImportResult {
  ImportResult { imported: n, skipped: 0, errors: vec![] }
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn persons_import_twice_skips_everything() {
  let s = store().await;

  assert_eq!(import(&s, EntityKind::Persons, PERSONS).await, imported(2));

  let second = import(&s, EntityKind::Persons, PERSONS).await;
  assert_eq!(second.imported, 0);
  assert_eq!(second.skipped, 2);
  assert!(second.errors.is_empty());
  assert_eq!(s.list_persons().await.unwrap().len(), 2);
}

#[tokio::test]
async fn puzzles_import_twice_skips_everything() {
  let s = store().await;
  let csv = "publication_date,constructors
2024-01-07,\"Bea Bee, Al Ay\"
1/8/2024,Al Ay
";

  assert_eq!(import(&s, EntityKind::Puzzles, csv).await, imported(2));
  let second = import(&s, EntityKind::Puzzles, csv).await;
  assert_eq!((second.imported, second.skipped), (0, 2));

  assert_eq!(s.list_puzzles().await.unwrap().len(), 2);
  // "Al Ay" was created once and reused.
  assert_eq!(s.list_persons().await.unwrap().len(), 2);

  let puzzle = s.find_puzzle_by_date(date(2024, 1, 7)).await.unwrap().unwrap();
  let names: Vec<_> = s
    .puzzle_constructors(puzzle.puzzle_id)
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.full_name)
    .collect();
  assert_eq!(names, vec!["Bea Bee", "Al Ay"]);
}

#[tokio::test]
async fn overwrite_rewrites_existing_rows() {
  let s = store().await;
  import(&s, EntityKind::Persons, PERSONS).await;

  let csv = "full_name,home_page_url,nicknames
pat lee,https://pat.example.org,PL
";
  assert_eq!(import_overwriting(&s, EntityKind::Persons, csv).await, imported(1));

  let pat = s.find_person_by_name("Pat Lee").await.unwrap().unwrap();
  assert_eq!(pat.full_name, "Pat Lee");
  assert_eq!(pat.home_page_url.as_deref(), Some("https://pat.example.org"));
  assert_eq!(pat.nicknames.as_deref(), Some("PL"));
  assert_eq!(s.list_persons().await.unwrap().len(), 2);
}

// ─── Person resolution ───────────────────────────────────────────────────────

#[tokio::test]
async fn unseen_guesser_is_created_once() {
  let s = store().await;
  let csv = "round_date,clue_giver,guessers
2024-01-01,Host,Alex
2024-01-08,Host,alex
";

  assert_eq!(import(&s, EntityKind::Rounds, csv).await, imported(2));

  let persons = s.list_persons().await.unwrap();
  let alexes: Vec<_> = persons
    .iter()
    .filter(|p| p.full_name.eq_ignore_ascii_case("alex"))
    .collect();
  assert_eq!(alexes.len(), 1);
  assert_eq!(alexes[0].full_name, "Alex");
}

#[tokio::test]
async fn non_ascii_guesser_is_created_once() {
  let s = store().await;
  let csv = "round_date,clue_giver,guessers
2024-01-01,Host,Élodie
2024-01-08,Host,élodie
";

  assert_eq!(import(&s, EntityKind::Rounds, csv).await, imported(2));

  let names: Vec<_> = s
    .list_persons()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.full_name)
    .collect();
  assert_eq!(names, vec!["Host", "Élodie"]);

  let elodie = s.find_person_by_name("élodie").await.unwrap().unwrap();
  assert_eq!(elodie.full_name, "Élodie");
}

#[tokio::test]
async fn single_host_round_scenario() {
  let s = store().await;
  let persons = "full_name
Pat Lee
";
  let rounds = "round_date,episode_number,clue_giver,guessers,solution_words
2024-01-01,10,Pat Lee,\"Pat Lee, Sam Kim\",\"kea, loa\"
";

  assert_eq!(import(&s, EntityKind::Persons, persons).await, imported(1));
  assert_eq!(s.list_persons().await.unwrap().len(), 1);

  assert_eq!(import(&s, EntityKind::Rounds, rounds).await, imported(1));

  let rounds = s.list_rounds().await.unwrap();
  assert_eq!(rounds.len(), 1);
  assert_eq!(rounds[0].episode_number, Some(10));

  let names: Vec<_> = s
    .list_persons()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.full_name)
    .collect();
  assert_eq!(names, vec!["Pat Lee", "Sam Kim"]);
  assert_eq!(
    s.round_solutions(rounds[0].round_id).await.unwrap(),
    vec!["KEA", "LOA"]
  );
}

#[tokio::test]
async fn round_row_resolves_guessers_and_solutions() {
  let s = store().await;
  import(&s, EntityKind::Persons, PERSONS).await;

  assert_eq!(import(&s, EntityKind::Rounds, ROUNDS).await, imported(1));

  let rounds = s.list_rounds().await.unwrap();
  assert_eq!(rounds.len(), 1);
  let round = &rounds[0];
  assert_eq!(round.episode_number, Some(101));
  assert_eq!(round.episode_start_seconds, Some(95));
  assert_eq!(round.round_number, 1);

  assert_eq!(
    s.round_solutions(round.round_id).await.unwrap(),
    vec!["KEA", "LOA"]
  );
  let guessers: Vec<_> = s
    .round_guessers(round.round_id)
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.full_name)
    .collect();
  assert_eq!(guessers, vec!["Pat Lee", "Sam Kim"]);

  // Only "Sam Kim" was new.
  assert_eq!(s.list_persons().await.unwrap().len(), 3);
}

// ─── Row errors ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn clue_for_unknown_round_is_skipped() {
  let s = store().await;
  let csv = "round_date,clue_number,puzzle_date,correct_answer
2030-05-05,1,2030-05-04,KEA
";

  let result = import(&s, EntityKind::Clues, csv).await;
  assert_eq!(result.imported, 0);
  assert_eq!(result.skipped, 1);
  assert_eq!(result.errors, vec!["Line 2: round 2030-05-05 not found"]);

  assert!(s.list_rounds().await.unwrap().is_empty());
  assert!(s.list_puzzles().await.unwrap().is_empty());
}

#[tokio::test]
async fn guess_for_unknown_round_or_clue_is_skipped() {
  let s = seeded().await;
  let csv = "round_date,round_number,clue_number,guesser,guessed_word
2024-01-01,2,1,Pat Lee,KEA
2024-01-01,,9,Pat Lee,KEA
";

  let result = import(&s, EntityKind::Guesses, csv).await;
  assert_eq!((result.imported, result.skipped), (0, 2));
  assert_eq!(result.errors, vec![
    "Line 2: round 2024-01-01 round 2 not found",
    "Line 3: clue 9 of round 2024-01-01 not found",
  ]);
}

#[tokio::test]
async fn invalid_direction_skips_only_that_row() {
  let s = store().await;
  import(&s, EntityKind::Rounds, "round_date,clue_giver\n2024-01-01,Host\n").await;
  let csv = "round_date,clue_number,puzzle_clue_direction,correct_answer
2024-01-01,1,across,KEA
2024-01-01,2,X,LOA
2024-01-01,3,d,ERNE
";

  let result = import(&s, EntityKind::Clues, csv).await;
  assert_eq!(result.imported, 2);
  assert_eq!(result.skipped, 1);
  assert_eq!(result.errors, vec![
    "Line 3: invalid direction \"X\" (expected A or D)"
  ]);
}

#[tokio::test]
async fn missing_and_malformed_fields_are_row_errors() {
  let s = store().await;
  let csv = "round_date,clue_giver,episode_number
2024-01-01,,1
13/45/2024,Host,1
2024-01-02,Host,one
2024-01-03,Host,7.0
";

  let result = import(&s, EntityKind::Rounds, csv).await;
  assert_eq!(result.imported + result.skipped, 4);
  assert_eq!(result.imported, 1);
  assert_eq!(result.errors, vec![
    "Line 2: missing required field clue_giver",
    "Line 3: invalid date \"13/45/2024\"",
    "Line 4: invalid episode_number \"one\" (expected a whole number)",
  ]);

  let round = s
    .find_round(RoundKey::new(date(2024, 1, 3), 1))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(round.episode_number, Some(7));
}

#[tokio::test]
async fn malformed_csv_is_fatal() {
  let s = store().await;
  let err = Importer::new(&s)
    .import_csv(EntityKind::Persons, &[0xff, 0xfe, b'\n', 0x80][..])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Csv(_)));
}

// ─── Guesses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn guesses_are_judged_against_the_answer() {
  let s = seeded().await;

  let round = s
    .find_round(RoundKey::new(date(2024, 1, 1), 1))
    .await
    .unwrap()
    .unwrap();
  let clue = s.find_clue(round.round_id, 2).await.unwrap().unwrap();
  assert_eq!(clue.correct_answer, "LOA");

  let pat = s.find_person_by_name("Pat Lee").await.unwrap().unwrap();
  let wrong = s
    .find_guess(clue.clue_id, pat.person_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(wrong.guessed_word, "KEA");
  assert!(!wrong.is_correct);

  let csv = "round_date,clue_number,guesser,guessed_word\n2024-01-01,2,Pat Lee,loa\n";
  assert_eq!(import(&s, EntityKind::Guesses, csv).await.skipped, 1);
  assert_eq!(import_overwriting(&s, EntityKind::Guesses, csv).await, imported(1));

  let fixed = s
    .find_guess(clue.clue_id, pat.person_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fixed.guessed_word, "LOA");
  assert!(fixed.is_correct);
}

// ─── Bundles ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bundle_imports_parents_first() {
  let s = store().await;
  let mut bundle = Bundle::new();
  bundle.insert(EntityKind::Guesses, parse(GUESSES.as_bytes()).unwrap());
  bundle.insert(EntityKind::Clues, parse(CLUES.as_bytes()).unwrap());
  bundle.insert(EntityKind::Rounds, parse(ROUNDS.as_bytes()).unwrap());

  let results = Importer::new(&s).import_bundle(&bundle).await.unwrap();
  assert_eq!(
    results.keys().copied().collect::<Vec<_>>(),
    vec![EntityKind::Rounds, EntityKind::Clues, EntityKind::Guesses]
  );
  assert_eq!(results[&EntityKind::Clues], imported(2));
  assert_eq!(results[&EntityKind::Guesses], imported(3));
}

#[tokio::test]
async fn export_reimports_to_the_same_data() {
  let original = seeded().await;
  let exported = Exporter::new(&original).export_bundle().await.unwrap();

  let zip = write_bundle(Cursor::new(Vec::new()), &exported)
    .unwrap()
    .into_inner();

  let copy = store().await;
  let results = Importer::new(&copy).import_zip(Cursor::new(zip)).await.unwrap();
  assert_eq!(results.len(), 5);
  assert!(results.values().all(|r| r.errors.is_empty()));

  let reexported = Exporter::new(&copy).export_bundle().await.unwrap();
  assert_eq!(reexported, exported);

  let again = Importer::new(&copy).import_bundle(&exported).await.unwrap();
  assert!(again.values().all(|r| r.imported == 0));
}

#[tokio::test]
async fn exported_clues_carry_natural_keys() {
  let s = seeded().await;
  let clues = Exporter::new(&s).export(EntityKind::Clues).await.unwrap();

  assert_eq!(clues.len(), 2);
  let first = &clues.rows()[0];
  assert_eq!(first.get("round_date"), Some("2024-01-01"));
  assert_eq!(first.get("round_number"), Some("1"));
  assert_eq!(first.get("puzzle_date"), Some("2023-12-31"));
  assert_eq!(first.get("puzzle_clue_direction"), Some("A"));
  assert_eq!(first.get("correct_answer"), Some("KEA"));
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn person_report_collects_everything() {
  let s = seeded().await;
  let report = report::person_report(&s, "pat lee").await.unwrap();

  assert_eq!(report.person.full_name, "Pat Lee");
  assert!(report.roles.player);
  assert_eq!(report.stats.clues_answered, 2);
  assert_eq!(report.stats.correct_count, 1);
  assert_eq!(report.overall_percentage, "50.0%");
  assert_eq!(report.rounds.len(), 1);
  assert_eq!(report.distribution.rounds, 1);
  assert_eq!(report.distribution_percentages.median, "50.0%");
  assert_eq!(report.breakdowns.clue_number.len(), 2);
  assert_eq!(report.breakdowns.direction.len(), 2);
  // 2023-12-31 was a Sunday.
  assert_eq!(report.breakdowns.day_of_week.len(), 1);
  assert_eq!(report.breakdowns.decade.len(), 1);
  assert_eq!(report.breakdowns.constructor.len(), 2);
}

#[tokio::test]
async fn unlisted_guesser_is_counted_as_playing() {
  let s = seeded().await;
  let csv = "round_date,clue_number,guesser,guessed_word
2024-01-01,1,Newbie,KEA
2024-01-01,2,Newbie,loa
";
  assert_eq!(import(&s, EntityKind::Guesses, csv).await, imported(2));

  let report = report::person_report(&s, "Newbie").await.unwrap();
  assert!(report.roles.player);
  assert_eq!(report.stats.rounds_played, 1);
  assert_eq!(report.stats.clues_answered, 2);
  assert_eq!(report.stats.correct_count, 2);
  assert_eq!(report.rounds.len(), 1);
  assert_eq!(report.distribution.rounds, 1);
  assert_eq!(report.distribution_percentages.median, "100.0%");

  let round = report::round_report(&s, RoundKey::new(date(2024, 1, 1), 1))
    .await
    .unwrap();
  let names: Vec<_> = round.guessers.iter().map(|g| g.full_name.as_str()).collect();
  assert_eq!(names, vec!["Newbie", "Pat Lee", "Sam Kim"]);
}

#[tokio::test]
async fn person_report_for_newcomer_is_all_zero() {
  let s = seeded().await;
  let report = report::person_report(&s, "Bea Bee").await.unwrap();

  assert!(report.roles.constructor);
  assert_eq!(report.stats.clues_answered, 0);
  assert_eq!(report.overall_percentage, "0.0%");
  assert_eq!(report.distribution.rounds, 0);
  assert!(report.breakdowns.decade.is_empty());

  let err = report::person_report(&s, "Nobody").await.unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(ref n) if n == "Nobody"));
}

#[tokio::test]
async fn round_report_lists_every_guesser() {
  let s = seeded().await;
  let report = report::round_report(&s, RoundKey::new(date(2024, 1, 1), 1))
    .await
    .unwrap();

  assert_eq!(report.clue_giver.map(|p| p.full_name).as_deref(), Some("Quiz Master"));
  assert_eq!(report.solution_words, vec!["KEA", "LOA"]);
  assert_eq!(report.clues.len(), 2);
  assert_eq!(report.guessers.len(), 2);
  assert_eq!(report.guessers[1].full_name, "Sam Kim");
  assert_eq!(report.guessers[1].percentage, 100.0);

  let err = report::round_report(&s, RoundKey::new(date(2024, 1, 2), 1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::RoundNotFound(_)));
}

#[tokio::test]
async fn roles_report_reflects_usage() {
  let s = seeded().await;
  let host = report::roles_report(&s, "Quiz Master").await.unwrap();
  assert!(host.roles.clue_giver);
  assert!(!host.roles.player);
}
