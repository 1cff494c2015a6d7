//! [`SqliteStore`] — the SQLite implementation of [`KealoaStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension as _, Row, params};
use tracing::{debug, info};

use kealoa_core::{
  check::{DataCheckReport, RepairSummary},
  clue::{Clue, ClueId, NewClue},
  guess::{Guess, GuessId, NewGuess, is_correct},
  normalize::{name_key, upper},
  person::{NewPerson, Person, PersonId, PersonRoles},
  puzzle::{NewPuzzle, Puzzle, PuzzleId},
  round::{NewRound, Round, RoundId, RoundKey},
  stats::{
    BreakdownDimension, BreakdownKey, BreakdownRow, DatedTally, GuesserSummary,
    PersonStats, RoundResult, by_day_of_week, by_decade,
  },
  store::KealoaStore,
};

use crate::{
  Error, Result,
  encode::{
    CLUE_COLUMNS, GUESS_COLUMNS, PERSON_COLUMNS, PUZZLE_COLUMNS, ROUND_COLUMNS,
    RawClue, RawPuzzle, RawRound, decode_count, decode_date, decode_direction,
    encode_date, encode_direction, guess_from_row, person_from_row, prefixed,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A KEALOA store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Outcome of a write that can hit a uniqueness clash or a missing row.
enum Write<T> {
  Done(T),
  Conflict,
  Missing,
}

impl<T> Write<T> {
  fn resolve(self, conflict: Error, missing: Error) -> Result<T> {
    match self {
      Self::Done(value) => Ok(value),
      Self::Conflict => Err(conflict),
      Self::Missing => Err(missing),
    }
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────
//
// Everything below runs inside `tokio_rusqlite::Connection::call` and takes a
// plain `&Connection`, so it can be used with either a connection or an open
// transaction.

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
where
  P: rusqlite::Params,
  F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt.query_map(params, f)?.collect::<rusqlite::Result<Vec<_>>>();
  rows
}

/// Keep the first occurrence of each id, preserving order.
fn unique_ids(ids: &[i64]) -> Vec<i64> {
  let mut seen = Vec::with_capacity(ids.len());
  for id in ids {
    if !seen.contains(id) {
      seen.push(*id);
    }
  }
  seen
}

fn person_by_id(conn: &Connection, id: PersonId) -> rusqlite::Result<Option<Person>> {
  conn
    .query_row(
      &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"),
      [id],
      person_from_row,
    )
    .optional()
}

fn person_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Person>> {
  conn
    .query_row(
      &format!(
        "SELECT {PERSON_COLUMNS} FROM persons WHERE name_key = ?1"
      ),
      [name_key(name)],
      person_from_row,
    )
    .optional()
}

fn insert_person(conn: &Connection, input: &NewPerson) -> rusqlite::Result<Person> {
  let full_name = input.full_name.trim();
  conn.execute(
    "INSERT INTO persons (
       full_name, name_key, nicknames, home_page_url, media_id,
       xwordinfo_profile_name, xwordinfo_image_url
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      full_name,
      name_key(full_name),
      input.nicknames,
      input.home_page_url,
      input.media_id,
      input.xwordinfo_profile_name,
      input.xwordinfo_image_url,
    ],
  )?;
  Ok(Person {
    person_id:              conn.last_insert_rowid(),
    full_name:              full_name.to_owned(),
    nicknames:              input.nicknames.clone(),
    home_page_url:          input.home_page_url.clone(),
    media_id:               input.media_id,
    xwordinfo_profile_name: input.xwordinfo_profile_name.clone(),
    xwordinfo_image_url:    input.xwordinfo_image_url.clone(),
  })
}

fn puzzle_by_id(conn: &Connection, id: PuzzleId) -> rusqlite::Result<Option<RawPuzzle>> {
  conn
    .query_row(
      &format!("SELECT {PUZZLE_COLUMNS} FROM puzzles WHERE puzzle_id = ?1"),
      [id],
      RawPuzzle::from_row,
    )
    .optional()
}

fn puzzle_by_date(conn: &Connection, date: &str) -> rusqlite::Result<Option<RawPuzzle>> {
  conn
    .query_row(
      &format!("SELECT {PUZZLE_COLUMNS} FROM puzzles WHERE publication_date = ?1"),
      [date],
      RawPuzzle::from_row,
    )
    .optional()
}

/// Replace a puzzle's constructor list in full; order starts at 1.
fn replace_constructors(
  conn: &Connection,
  puzzle_id: PuzzleId,
  person_ids: &[PersonId],
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM puzzle_constructors WHERE puzzle_id = ?1",
    [puzzle_id],
  )?;
  let mut stmt = conn.prepare(
    "INSERT INTO puzzle_constructors (puzzle_id, person_id, constructor_order)
     VALUES (?1, ?2, ?3)",
  )?;
  for (i, person_id) in unique_ids(person_ids).into_iter().enumerate() {
    stmt.execute(params![puzzle_id, person_id, (i + 1) as i64])?;
  }
  Ok(())
}

fn round_by_id(conn: &Connection, id: RoundId) -> rusqlite::Result<Option<RawRound>> {
  conn
    .query_row(
      &format!("SELECT {ROUND_COLUMNS} FROM rounds WHERE round_id = ?1"),
      [id],
      RawRound::from_row,
    )
    .optional()
}

fn round_by_key(
  conn: &Connection,
  date: &str,
  number: u32,
) -> rusqlite::Result<Option<RawRound>> {
  conn
    .query_row(
      &format!(
        "SELECT {ROUND_COLUMNS} FROM rounds WHERE round_date = ?1 AND round_number = ?2"
      ),
      params![date, number],
      RawRound::from_row,
    )
    .optional()
}

/// Replace a round's solution words in full; words are upper-cased and
/// ordered from 1.
fn replace_solutions(
  conn: &Connection,
  round_id: RoundId,
  words: &[String],
) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM round_solutions WHERE round_id = ?1", [round_id])?;
  let mut stmt = conn.prepare(
    "INSERT INTO round_solutions (round_id, word, word_order) VALUES (?1, ?2, ?3)",
  )?;
  let words = words.iter().map(|w| upper(w)).filter(|w| !w.is_empty());
  for (i, word) in words.enumerate() {
    stmt.execute(params![round_id, word, (i + 1) as i64])?;
  }
  Ok(())
}

fn replace_guessers(
  conn: &Connection,
  round_id: RoundId,
  person_ids: &[PersonId],
) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM round_guessers WHERE round_id = ?1", [round_id])?;
  let mut stmt = conn
    .prepare("INSERT INTO round_guessers (round_id, person_id) VALUES (?1, ?2)")?;
  for person_id in unique_ids(person_ids) {
    stmt.execute(params![round_id, person_id])?;
  }
  Ok(())
}

/// Insert a round (`id` is `None`) or overwrite every column of an existing
/// one, then replace its solution words and guessers.
fn write_round(
  conn: &Connection,
  id: Option<RoundId>,
  date: &str,
  input: &NewRound,
) -> rusqlite::Result<RoundId> {
  let round_id = match id {
    None => {
      conn.execute(
        "INSERT INTO rounds (
           round_date, round_number, episode_number, episode_id, episode_url,
           episode_start_seconds, clue_giver_id, description, description2
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
          date,
          input.round_number,
          input.episode_number,
          input.episode_id,
          input.episode_url,
          input.episode_start_seconds,
          input.clue_giver_id,
          input.description,
          input.description2,
        ],
      )?;
      conn.last_insert_rowid()
    }
    Some(id) => {
      conn.execute(
        "UPDATE rounds SET
           round_date = ?1, round_number = ?2, episode_number = ?3,
           episode_id = ?4, episode_url = ?5, episode_start_seconds = ?6,
           clue_giver_id = ?7, description = ?8, description2 = ?9
         WHERE round_id = ?10",
        params![
          date,
          input.round_number,
          input.episode_number,
          input.episode_id,
          input.episode_url,
          input.episode_start_seconds,
          input.clue_giver_id,
          input.description,
          input.description2,
          id,
        ],
      )?;
      id
    }
  };
  replace_solutions(conn, round_id, &input.solution_words)?;
  replace_guessers(conn, round_id, &input.guesser_ids)?;
  Ok(round_id)
}

fn clue_by_id(conn: &Connection, id: ClueId) -> rusqlite::Result<Option<RawClue>> {
  conn
    .query_row(
      &format!("SELECT {CLUE_COLUMNS} FROM clues WHERE clue_id = ?1"),
      [id],
      RawClue::from_row,
    )
    .optional()
}

/// Whether a clue other than `except` already uses `clue_number` in the round.
fn clue_number_taken(
  conn: &Connection,
  round_id: RoundId,
  clue_number: u32,
  except: Option<ClueId>,
) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (
       SELECT 1 FROM clues
       WHERE round_id = ?1 AND clue_number = ?2 AND clue_id IS NOT ?3
     )",
    params![round_id, clue_number, except],
    |r| r.get(0),
  )
}

fn guess_by_id(conn: &Connection, id: GuessId) -> rusqlite::Result<Option<Guess>> {
  conn
    .query_row(
      &format!("SELECT {GUESS_COLUMNS} FROM guesses WHERE guess_id = ?1"),
      [id],
      guess_from_row,
    )
    .optional()
}

/// Recompute `is_correct` for every guess of a clue. Returns the number of
/// guesses whose flag changed.
fn rederive_guesses(
  conn: &Connection,
  clue_id: ClueId,
  correct_answer: &str,
) -> rusqlite::Result<usize> {
  let guesses: Vec<(GuessId, String, bool)> = query_all(
    conn,
    "SELECT guess_id, guessed_word, is_correct FROM guesses WHERE clue_id = ?1",
    [clue_id],
    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
  )?;
  let mut changed = 0;
  for (guess_id, word, stored) in guesses {
    let derived = is_correct(&word, correct_answer);
    if derived != stored {
      conn.execute(
        "UPDATE guesses SET is_correct = ?2 WHERE guess_id = ?1",
        params![guess_id, derived],
      )?;
      changed += 1;
    }
  }
  Ok(changed)
}

// Shared SQL for the data check and repair.

const ORPHAN_CLUE_FILTER: &str = "puzzle_id IS NOT NULL
   AND NOT EXISTS (SELECT 1 FROM puzzles p WHERE p.puzzle_id = clues.puzzle_id)";

const STALE_GUESS_FILTER: &str = "is_correct !=
   (guessed_word = (SELECT c.correct_answer FROM clues c WHERE c.clue_id = guesses.clue_id))";

// ─── KealoaStore impl ────────────────────────────────────────────────────────

impl KealoaStore for SqliteStore {
  type Error = Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    let name = input.full_name.trim().to_owned();
    if name.is_empty() {
      return Err(kealoa_core::Error::MissingField("full_name").into());
    }

    let created: Option<Person> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if person_by_name(&tx, &input.full_name)?.is_some() {
          return Ok(None);
        }
        let person = insert_person(&tx, &input)?;
        tx.commit()?;
        Ok(Some(person))
      })
      .await?;

    let person = created.ok_or(Error::DuplicatePerson(name))?;
    debug!(person_id = person.person_id, name = %person.full_name, "created person");
    Ok(person)
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    Ok(self.conn.call(move |conn| Ok(person_by_id(conn, id)?)).await?)
  }

  async fn find_person_by_name(&self, full_name: &str) -> Result<Option<Person>> {
    let name = full_name.trim().to_owned();
    Ok(self.conn.call(move |conn| Ok(person_by_name(conn, &name)?)).await?)
  }

  async fn find_or_create_person(&self, full_name: &str) -> Result<(Person, bool)> {
    let name = full_name.trim().to_owned();
    if name.is_empty() {
      return Err(kealoa_core::Error::MissingField("full_name").into());
    }

    let (person, created) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(existing) = person_by_name(&tx, &name)? {
          return Ok((existing, false));
        }
        let person = insert_person(&tx, &NewPerson::named(name))?;
        tx.commit()?;
        Ok((person, true))
      })
      .await?;

    if created {
      debug!(person_id = person.person_id, name = %person.full_name, "created person");
    }
    Ok((person, created))
  }

  async fn update_person(&self, id: PersonId, input: NewPerson) -> Result<Person> {
    let name = input.full_name.trim().to_owned();
    if name.is_empty() {
      return Err(kealoa_core::Error::MissingField("full_name").into());
    }
    let conflict = Error::DuplicatePerson(name.clone());

    let outcome: Write<Person> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if person_by_id(&tx, id)?.is_none() {
          return Ok(Write::Missing);
        }
        if person_by_name(&tx, &name)?.is_some_and(|p| p.person_id != id) {
          return Ok(Write::Conflict);
        }
        tx.execute(
          "UPDATE persons SET
             full_name = ?2, name_key = ?3, nicknames = ?4, home_page_url = ?5,
             media_id = ?6, xwordinfo_profile_name = ?7, xwordinfo_image_url = ?8
           WHERE person_id = ?1",
          params![
            id,
            name,
            name_key(&name),
            input.nicknames,
            input.home_page_url,
            input.media_id,
            input.xwordinfo_profile_name,
            input.xwordinfo_image_url,
          ],
        )?;
        let person = person_by_id(&tx, id)?;
        tx.commit()?;
        Ok(person.map_or(Write::Missing, Write::Done))
      })
      .await?;

    outcome.resolve(conflict, Error::PersonNotFound(id))
  }

  async fn delete_person(&self, id: PersonId) -> Result<bool> {
    let outcome: Write<bool> = self
      .conn
      .call(move |conn| {
        let hosts: bool = conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM rounds WHERE clue_giver_id = ?1)",
          [id],
          |r| r.get(0),
        )?;
        if hosts {
          return Ok(Write::Conflict);
        }
        let deleted = conn.execute("DELETE FROM persons WHERE person_id = ?1", [id])?;
        Ok(Write::Done(deleted > 0))
      })
      .await?;

    let deleted =
      outcome.resolve(Error::PersonHostsRounds(id), Error::PersonNotFound(id))?;
    if deleted {
      info!(person_id = id, "deleted person");
    }
    Ok(deleted)
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    Ok(
      self
        .conn
        .call(|conn| {
          Ok(query_all(
            conn,
            &format!(
              "SELECT {PERSON_COLUMNS} FROM persons ORDER BY full_name COLLATE NOCASE"
            ),
            [],
            person_from_row,
          )?)
        })
        .await?,
    )
  }

  async fn person_roles(&self, id: PersonId) -> Result<PersonRoles> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT
               EXISTS (SELECT 1 FROM round_participants  WHERE person_id     = ?1),
               EXISTS (SELECT 1 FROM puzzle_constructors WHERE person_id     = ?1),
               EXISTS (SELECT 1 FROM puzzles             WHERE editor_id     = ?1),
               EXISTS (SELECT 1 FROM rounds              WHERE clue_giver_id = ?1)",
            [id],
            |r| {
              Ok(PersonRoles {
                player:      r.get(0)?,
                constructor: r.get(1)?,
                editor:      r.get(2)?,
                clue_giver:  r.get(3)?,
              })
            },
          )?)
        })
        .await?,
    )
  }

  // ── Puzzles ───────────────────────────────────────────────────────────────

  async fn create_puzzle(&self, input: NewPuzzle) -> Result<Puzzle> {
    let date = input.publication_date;
    let date_str = encode_date(date);
    let editor_id = input.editor_id;

    let created: Option<PuzzleId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if puzzle_by_date(&tx, &date_str)?.is_some() {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO puzzles (publication_date, editor_id) VALUES (?1, ?2)",
          params![date_str, input.editor_id],
        )?;
        let puzzle_id = tx.last_insert_rowid();
        replace_constructors(&tx, puzzle_id, &input.constructor_ids)?;
        tx.commit()?;
        Ok(Some(puzzle_id))
      })
      .await?;

    let puzzle_id = created.ok_or(Error::DuplicatePuzzle(date))?;
    debug!(puzzle_id, %date, "created puzzle");
    Ok(Puzzle { puzzle_id, publication_date: date, editor_id })
  }

  async fn get_puzzle(&self, id: PuzzleId) -> Result<Option<Puzzle>> {
    let raw = self.conn.call(move |conn| Ok(puzzle_by_id(conn, id)?)).await?;
    raw.map(RawPuzzle::into_puzzle).transpose()
  }

  async fn find_puzzle_by_date(&self, date: NaiveDate) -> Result<Option<Puzzle>> {
    let date_str = encode_date(date);
    let raw = self
      .conn
      .call(move |conn| Ok(puzzle_by_date(conn, &date_str)?))
      .await?;
    raw.map(RawPuzzle::into_puzzle).transpose()
  }

  async fn find_or_create_puzzle(&self, date: NaiveDate) -> Result<(Puzzle, bool)> {
    let date_str = encode_date(date);

    let (raw, created) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(existing) = puzzle_by_date(&tx, &date_str)? {
          return Ok((existing, false));
        }
        tx.execute(
          "INSERT INTO puzzles (publication_date) VALUES (?1)",
          [&date_str],
        )?;
        let raw = RawPuzzle {
          puzzle_id:        tx.last_insert_rowid(),
          publication_date: date_str,
          editor_id:        None,
        };
        tx.commit()?;
        Ok((raw, true))
      })
      .await?;

    let puzzle = raw.into_puzzle()?;
    if created {
      debug!(puzzle_id = puzzle.puzzle_id, %date, "created puzzle");
    }
    Ok((puzzle, created))
  }

  async fn update_puzzle(&self, id: PuzzleId, input: NewPuzzle) -> Result<Puzzle> {
    let date = input.publication_date;
    let date_str = encode_date(date);

    let outcome: Write<RawPuzzle> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if puzzle_by_id(&tx, id)?.is_none() {
          return Ok(Write::Missing);
        }
        if puzzle_by_date(&tx, &date_str)?.is_some_and(|p| p.puzzle_id != id) {
          return Ok(Write::Conflict);
        }
        tx.execute(
          "UPDATE puzzles SET publication_date = ?2, editor_id = ?3 WHERE puzzle_id = ?1",
          params![id, date_str, input.editor_id],
        )?;
        replace_constructors(&tx, id, &input.constructor_ids)?;
        let raw = puzzle_by_id(&tx, id)?;
        tx.commit()?;
        Ok(raw.map_or(Write::Missing, Write::Done))
      })
      .await?;

    outcome
      .resolve(Error::DuplicatePuzzle(date), Error::PuzzleNotFound(id))?
      .into_puzzle()
  }

  async fn delete_puzzle(&self, id: PuzzleId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM puzzles WHERE puzzle_id = ?1", [id])? > 0)
      })
      .await?;
    if deleted {
      info!(puzzle_id = id, "deleted puzzle");
    }
    Ok(deleted)
  }

  async fn list_puzzles(&self) -> Result<Vec<Puzzle>> {
    let raws = self
      .conn
      .call(|conn| {
        Ok(query_all(
          conn,
          &format!("SELECT {PUZZLE_COLUMNS} FROM puzzles ORDER BY publication_date"),
          [],
          RawPuzzle::from_row,
        )?)
      })
      .await?;
    raws.into_iter().map(RawPuzzle::into_puzzle).collect()
  }

  async fn puzzle_constructors(&self, id: PuzzleId) -> Result<Vec<Person>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_all(
            conn,
            &format!(
              "SELECT {} FROM puzzle_constructors pc
               JOIN persons p ON p.person_id = pc.person_id
               WHERE pc.puzzle_id = ?1
               ORDER BY pc.constructor_order",
              prefixed("p", PERSON_COLUMNS)
            ),
            [id],
            person_from_row,
          )?)
        })
        .await?,
    )
  }

  // ── Rounds ────────────────────────────────────────────────────────────────

  async fn create_round(&self, input: NewRound) -> Result<Round> {
    let key = input.key();
    let date_str = encode_date(key.date);

    let created: Option<RawRound> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if round_by_key(&tx, &date_str, input.round_number)?.is_some() {
          return Ok(None);
        }
        let round_id = write_round(&tx, None, &date_str, &input)?;
        let raw = round_by_id(&tx, round_id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let round = created.ok_or(Error::DuplicateRound(key))?.into_round()?;
    debug!(round_id = round.round_id, %key, "created round");
    Ok(round)
  }

  async fn get_round(&self, id: RoundId) -> Result<Option<Round>> {
    let raw = self.conn.call(move |conn| Ok(round_by_id(conn, id)?)).await?;
    raw.map(RawRound::into_round).transpose()
  }

  async fn find_round(&self, key: RoundKey) -> Result<Option<Round>> {
    let date_str = encode_date(key.date);
    let raw = self
      .conn
      .call(move |conn| Ok(round_by_key(conn, &date_str, key.number)?))
      .await?;
    raw.map(RawRound::into_round).transpose()
  }

  async fn update_round(&self, id: RoundId, input: NewRound) -> Result<Round> {
    let key = input.key();
    let date_str = encode_date(key.date);

    let outcome: Write<RawRound> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if round_by_id(&tx, id)?.is_none() {
          return Ok(Write::Missing);
        }
        if round_by_key(&tx, &date_str, input.round_number)?
          .is_some_and(|r| r.round_id != id)
        {
          return Ok(Write::Conflict);
        }
        write_round(&tx, Some(id), &date_str, &input)?;
        let raw = round_by_id(&tx, id)?;
        tx.commit()?;
        Ok(raw.map_or(Write::Missing, Write::Done))
      })
      .await?;

    outcome
      .resolve(Error::DuplicateRound(key), Error::RoundNotFound(id))?
      .into_round()
  }

  async fn delete_round(&self, id: RoundId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM rounds WHERE round_id = ?1", [id])? > 0)
      })
      .await?;
    if deleted {
      info!(round_id = id, "deleted round");
    }
    Ok(deleted)
  }

  async fn list_rounds(&self) -> Result<Vec<Round>> {
    let raws = self
      .conn
      .call(|conn| {
        Ok(query_all(
          conn,
          &format!(
            "SELECT {ROUND_COLUMNS} FROM rounds ORDER BY round_date, round_number"
          ),
          [],
          RawRound::from_row,
        )?)
      })
      .await?;
    raws.into_iter().map(RawRound::into_round).collect()
  }

  async fn round_solutions(&self, id: RoundId) -> Result<Vec<String>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_all(
            conn,
            "SELECT word FROM round_solutions WHERE round_id = ?1 ORDER BY word_order",
            [id],
            |r| r.get(0),
          )?)
        })
        .await?,
    )
  }

  async fn round_guessers(&self, id: RoundId) -> Result<Vec<Person>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_all(
            conn,
            &format!(
              "SELECT {} FROM round_guessers rg
               JOIN persons p ON p.person_id = rg.person_id
               WHERE rg.round_id = ?1
               ORDER BY p.full_name COLLATE NOCASE",
              prefixed("p", PERSON_COLUMNS)
            ),
            [id],
            person_from_row,
          )?)
        })
        .await?,
    )
  }

  // ── Clues ─────────────────────────────────────────────────────────────────

  async fn create_clue(&self, input: NewClue) -> Result<Clue> {
    let round_id = input.round_id;
    let clue_number = input.clue_number;

    let outcome: Write<RawClue> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if round_by_id(&tx, input.round_id)?.is_none() {
          return Ok(Write::Missing);
        }
        if clue_number_taken(&tx, input.round_id, input.clue_number, None)? {
          return Ok(Write::Conflict);
        }
        tx.execute(
          "INSERT INTO clues (
             round_id, clue_number, puzzle_id, puzzle_clue_number,
             puzzle_clue_direction, clue_text, correct_answer
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            input.round_id,
            input.clue_number,
            input.puzzle_id,
            input.puzzle_clue_number,
            input.puzzle_clue_direction.map(encode_direction),
            input.clue_text,
            upper(&input.correct_answer),
          ],
        )?;
        let raw = clue_by_id(&tx, tx.last_insert_rowid())?;
        tx.commit()?;
        Ok(raw.map_or(Write::Missing, Write::Done))
      })
      .await?;

    let clue = outcome
      .resolve(
        Error::DuplicateClue { round_id, clue_number },
        Error::RoundNotFound(round_id),
      )?
      .into_clue()?;
    debug!(clue_id = clue.clue_id, round_id, clue_number, "created clue");
    Ok(clue)
  }

  async fn get_clue(&self, id: ClueId) -> Result<Option<Clue>> {
    let raw = self.conn.call(move |conn| Ok(clue_by_id(conn, id)?)).await?;
    raw.map(RawClue::into_clue).transpose()
  }

  async fn find_clue(&self, round_id: RoundId, clue_number: u32) -> Result<Option<Clue>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CLUE_COLUMNS} FROM clues WHERE round_id = ?1 AND clue_number = ?2"
              ),
              params![round_id, clue_number],
              RawClue::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawClue::into_clue).transpose()
  }

  async fn update_clue(&self, id: ClueId, input: NewClue) -> Result<Clue> {
    let round_id = input.round_id;
    let clue_number = input.clue_number;

    let outcome: Write<(RawClue, usize)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if clue_by_id(&tx, id)?.is_none() {
          return Ok(Write::Missing);
        }
        if clue_number_taken(&tx, input.round_id, input.clue_number, Some(id))? {
          return Ok(Write::Conflict);
        }
        let answer = upper(&input.correct_answer);
        tx.execute(
          "UPDATE clues SET
             round_id = ?2, clue_number = ?3, puzzle_id = ?4,
             puzzle_clue_number = ?5, puzzle_clue_direction = ?6,
             clue_text = ?7, correct_answer = ?8
           WHERE clue_id = ?1",
          params![
            id,
            input.round_id,
            input.clue_number,
            input.puzzle_id,
            input.puzzle_clue_number,
            input.puzzle_clue_direction.map(encode_direction),
            input.clue_text,
            answer,
          ],
        )?;
        let rederived = rederive_guesses(&tx, id, &answer)?;
        let raw = clue_by_id(&tx, id)?;
        tx.commit()?;
        Ok(raw.map_or(Write::Missing, |r| Write::Done((r, rederived))))
      })
      .await?;

    let (raw, rederived) = outcome.resolve(
      Error::DuplicateClue { round_id, clue_number },
      Error::ClueNotFound(id),
    )?;
    if rederived > 0 {
      info!(clue_id = id, rederived, "answer change re-derived guess correctness");
    }
    raw.into_clue()
  }

  async fn delete_clue(&self, id: ClueId) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute("DELETE FROM clues WHERE clue_id = ?1", [id])? > 0)
        })
        .await?,
    )
  }

  async fn list_clues(&self, round_id: RoundId) -> Result<Vec<Clue>> {
    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_all(
          conn,
          &format!(
            "SELECT {CLUE_COLUMNS} FROM clues WHERE round_id = ?1 ORDER BY clue_number"
          ),
          [round_id],
          RawClue::from_row,
        )?)
      })
      .await?;
    raws.into_iter().map(RawClue::into_clue).collect()
  }

  // ── Guesses ───────────────────────────────────────────────────────────────

  async fn create_guess(&self, input: NewGuess) -> Result<Guess> {
    let clue_id = input.clue_id;
    let guesser_id = input.guesser_id;

    let outcome: Write<Guess> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let answer: Option<String> = tx
          .query_row(
            "SELECT correct_answer FROM clues WHERE clue_id = ?1",
            [input.clue_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(answer) = answer else {
          return Ok(Write::Missing);
        };
        let taken: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM guesses WHERE clue_id = ?1 AND guesser_id = ?2)",
          params![input.clue_id, input.guesser_id],
          |r| r.get(0),
        )?;
        if taken {
          return Ok(Write::Conflict);
        }
        let word = upper(&input.guessed_word);
        let correct = is_correct(&word, &answer);
        tx.execute(
          "INSERT INTO guesses (clue_id, guesser_id, guessed_word, is_correct)
           VALUES (?1, ?2, ?3, ?4)",
          params![input.clue_id, input.guesser_id, word, correct],
        )?;
        let guess = Guess {
          guess_id:     tx.last_insert_rowid(),
          clue_id:      input.clue_id,
          guesser_id:   input.guesser_id,
          guessed_word: word,
          is_correct:   correct,
        };
        tx.commit()?;
        Ok(Write::Done(guess))
      })
      .await?;

    outcome.resolve(
      Error::DuplicateGuess { clue_id, guesser_id },
      Error::ClueNotFound(clue_id),
    )
  }

  async fn update_guess(&self, id: GuessId, guessed_word: &str) -> Result<Guess> {
    let word = upper(guessed_word);

    let updated: Option<Guess> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let answer: Option<String> = tx
          .query_row(
            "SELECT c.correct_answer FROM guesses g
             JOIN clues c ON c.clue_id = g.clue_id
             WHERE g.guess_id = ?1",
            [id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(answer) = answer else {
          return Ok(None);
        };
        tx.execute(
          "UPDATE guesses SET guessed_word = ?2, is_correct = ?3 WHERE guess_id = ?1",
          params![id, word, is_correct(&word, &answer)],
        )?;
        let guess = guess_by_id(&tx, id)?;
        tx.commit()?;
        Ok(guess)
      })
      .await?;

    updated.ok_or(Error::GuessNotFound(id))
  }

  async fn find_guess(&self, clue_id: ClueId, guesser_id: PersonId) -> Result<Option<Guess>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!(
                  "SELECT {GUESS_COLUMNS} FROM guesses WHERE clue_id = ?1 AND guesser_id = ?2"
                ),
                params![clue_id, guesser_id],
                guess_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn delete_guess(&self, id: GuessId) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute("DELETE FROM guesses WHERE guess_id = ?1", [id])? > 0)
        })
        .await?,
    )
  }

  async fn list_guesses(&self, clue_id: ClueId) -> Result<Vec<Guess>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_all(
            conn,
            &format!(
              "SELECT {} FROM guesses g
               JOIN persons p ON p.person_id = g.guesser_id
               WHERE g.clue_id = ?1
               ORDER BY p.full_name COLLATE NOCASE",
              prefixed("g", GUESS_COLUMNS)
            ),
            [clue_id],
            guess_from_row,
          )?)
        })
        .await?,
    )
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  async fn guesser_summaries(&self, round_id: RoundId) -> Result<Vec<GuesserSummary>> {
    // LEFT JOINs keep listed guessers who never answered.
    let rows: Vec<(PersonId, String, i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(query_all(
          conn,
          "SELECT p.person_id, p.full_name,
                  COUNT(g.guess_id), COALESCE(SUM(g.is_correct), 0)
           FROM round_participants rg
           JOIN persons p       ON p.person_id = rg.person_id
           LEFT JOIN clues c    ON c.round_id  = rg.round_id
           LEFT JOIN guesses g  ON g.clue_id   = c.clue_id
                               AND g.guesser_id = rg.person_id
           WHERE rg.round_id = ?1
           GROUP BY p.person_id, p.full_name
           ORDER BY p.full_name COLLATE NOCASE",
          [round_id],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )?)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(person_id, name, total, correct)| {
          GuesserSummary::new(person_id, name, decode_count(total), decode_count(correct))
        })
        .collect(),
    )
  }

  async fn person_stats(&self, person_id: PersonId) -> Result<PersonStats> {
    let (rounds, answered, correct): (i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM round_participants WHERE person_id = ?1),
             (SELECT COUNT(*) FROM guesses WHERE guesser_id = ?1),
             (SELECT COALESCE(SUM(is_correct), 0) FROM guesses WHERE guesser_id = ?1)",
          [person_id],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(PersonStats::new(
      decode_count(rounds),
      decode_count(answered),
      decode_count(correct),
    ))
  }

  async fn person_round_results(&self, person_id: PersonId) -> Result<Vec<RoundResult>> {
    let rows: Vec<(RoundId, String, u32, i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(query_all(
          conn,
          "SELECT r.round_id, r.round_date, r.round_number,
                  COUNT(g.guess_id), COALESCE(SUM(g.is_correct), 0)
           FROM round_participants rg
           JOIN rounds r       ON r.round_id = rg.round_id
           LEFT JOIN clues c   ON c.round_id = r.round_id
           LEFT JOIN guesses g ON g.clue_id  = c.clue_id
                              AND g.guesser_id = rg.person_id
           WHERE rg.person_id = ?1
           GROUP BY r.round_id, r.round_date, r.round_number
           ORDER BY r.round_date, r.round_number",
          [person_id],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )?)
      })
      .await?;

    rows
      .into_iter()
      .map(|(round_id, date, number, answered, correct)| {
        Ok(RoundResult::new(
          round_id,
          decode_date(&date)?,
          number,
          decode_count(answered),
          decode_count(correct),
        ))
      })
      .collect()
  }

  async fn person_breakdown(
    &self,
    person_id: PersonId,
    dimension: BreakdownDimension,
  ) -> Result<Vec<BreakdownRow>> {
    match dimension {
      BreakdownDimension::ClueNumber => {
        let rows: Vec<(u32, i64, i64)> = self
          .conn
          .call(move |conn| {
            Ok(query_all(
              conn,
              "SELECT c.clue_number, COUNT(*), COALESCE(SUM(g.is_correct), 0)
               FROM guesses g
               JOIN clues c ON c.clue_id = g.clue_id
               WHERE g.guesser_id = ?1
               GROUP BY c.clue_number
               ORDER BY c.clue_number",
              [person_id],
              |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?)
          })
          .await?;
        Ok(
          rows
            .into_iter()
            .map(|(n, answered, correct)| {
              BreakdownRow::new(
                BreakdownKey::ClueNumber(n),
                decode_count(answered),
                decode_count(correct),
              )
            })
            .collect(),
        )
      }

      BreakdownDimension::Direction => {
        let rows: Vec<(String, i64, i64)> = self
          .conn
          .call(move |conn| {
            Ok(query_all(
              conn,
              "SELECT c.puzzle_clue_direction, COUNT(*), COALESCE(SUM(g.is_correct), 0)
               FROM guesses g
               JOIN clues c ON c.clue_id = g.clue_id
               WHERE g.guesser_id = ?1 AND c.puzzle_clue_direction IS NOT NULL
               GROUP BY c.puzzle_clue_direction
               ORDER BY c.puzzle_clue_direction",
              [person_id],
              |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?)
          })
          .await?;
        rows
          .into_iter()
          .map(|(d, answered, correct)| {
            Ok(BreakdownRow::new(
              BreakdownKey::Direction(decode_direction(&d)?),
              decode_count(answered),
              decode_count(correct),
            ))
          })
          .collect()
      }

      BreakdownDimension::DayOfWeek | BreakdownDimension::Decade => {
        let rows: Vec<(String, i64, i64)> = self
          .conn
          .call(move |conn| {
            Ok(query_all(
              conn,
              "SELECT pz.publication_date, COUNT(*), COALESCE(SUM(g.is_correct), 0)
               FROM guesses g
               JOIN clues c    ON c.clue_id    = g.clue_id
               JOIN puzzles pz ON pz.puzzle_id = c.puzzle_id
               WHERE g.guesser_id = ?1
               GROUP BY pz.publication_date",
              [person_id],
              |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?)
          })
          .await?;
        let tallies = rows
          .into_iter()
          .map(|(date, answered, correct)| {
            Ok(DatedTally {
              date:     decode_date(&date)?,
              answered: decode_count(answered),
              correct:  decode_count(correct),
            })
          })
          .collect::<Result<Vec<_>>>()?;
        Ok(if dimension == BreakdownDimension::DayOfWeek {
          by_day_of_week(&tallies)
        } else {
          by_decade(&tallies)
        })
      }

      BreakdownDimension::Constructor => {
        let rows: Vec<(PersonId, String, i64, i64)> = self
          .conn
          .call(move |conn| {
            Ok(query_all(
              conn,
              "SELECT p.person_id, p.full_name,
                      COUNT(*), COALESCE(SUM(g.is_correct), 0)
               FROM guesses g
               JOIN clues c                ON c.clue_id    = g.clue_id
               JOIN puzzle_constructors pc ON pc.puzzle_id = c.puzzle_id
               JOIN persons p              ON p.person_id  = pc.person_id
               WHERE g.guesser_id = ?1
               GROUP BY p.person_id, p.full_name
               ORDER BY p.full_name COLLATE NOCASE",
              [person_id],
              |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?)
          })
          .await?;
        Ok(
          rows
            .into_iter()
            .map(|(id, full_name, answered, correct)| {
              BreakdownRow::new(
                BreakdownKey::Constructor { person_id: id, full_name },
                decode_count(answered),
                decode_count(correct),
              )
            })
            .collect(),
        )
      }
    }
  }

  // ── Data check ────────────────────────────────────────────────────────────

  async fn data_check(&self) -> Result<DataCheckReport> {
    let (raw_clues, stale_guesses) = self
      .conn
      .call(|conn| {
        let clues = query_all(
          conn,
          &format!(
            "SELECT {CLUE_COLUMNS} FROM clues WHERE {ORPHAN_CLUE_FILTER} ORDER BY clue_id"
          ),
          [],
          RawClue::from_row,
        )?;
        let guesses = query_all(
          conn,
          &format!(
            "SELECT {GUESS_COLUMNS} FROM guesses WHERE {STALE_GUESS_FILTER} ORDER BY guess_id"
          ),
          [],
          guess_from_row,
        )?;
        Ok((clues, guesses))
      })
      .await?;

    Ok(DataCheckReport {
      orphan_clues: raw_clues
        .into_iter()
        .map(RawClue::into_clue)
        .collect::<Result<_>>()?,
      stale_guesses,
    })
  }

  async fn repair_data(&self) -> Result<RepairSummary> {
    let (cleared, corrected) = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let cleared = tx.execute(
          &format!("UPDATE clues SET puzzle_id = NULL WHERE {ORPHAN_CLUE_FILTER}"),
          [],
        )?;
        let corrected = tx.execute(
          &format!(
            "UPDATE guesses SET is_correct = NOT is_correct WHERE {STALE_GUESS_FILTER}"
          ),
          [],
        )?;
        tx.commit()?;
        Ok((cleared, corrected))
      })
      .await?;

    let summary = RepairSummary {
      cleared_puzzle_refs: cleared as u64,
      corrected_guesses:   corrected as u64,
    };
    info!(
      cleared_puzzle_refs = summary.cleared_puzzle_refs,
      corrected_guesses = summary.corrected_guesses,
      "repaired data"
    );
    Ok(summary)
  }
}
