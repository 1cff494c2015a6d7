//! SQL schema for the KEALOA SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    person_id              INTEGER PRIMARY KEY,
    full_name              TEXT NOT NULL,
    name_key               TEXT NOT NULL,     -- lower-cased full_name
    nicknames              TEXT,
    home_page_url          TEXT,
    media_id               INTEGER,
    xwordinfo_profile_name TEXT,
    xwordinfo_image_url    TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS persons_name_idx
    ON persons(name_key);

CREATE TABLE IF NOT EXISTS puzzles (
    puzzle_id        INTEGER PRIMARY KEY,
    publication_date TEXT NOT NULL UNIQUE,   -- YYYY-MM-DD
    editor_id        INTEGER REFERENCES persons(person_id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS puzzle_constructors (
    puzzle_id         INTEGER NOT NULL REFERENCES puzzles(puzzle_id) ON DELETE CASCADE,
    person_id         INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    constructor_order INTEGER NOT NULL,      -- 1-based
    PRIMARY KEY (puzzle_id, person_id)
);

CREATE TABLE IF NOT EXISTS rounds (
    round_id              INTEGER PRIMARY KEY,
    round_date            TEXT NOT NULL,     -- YYYY-MM-DD
    round_number          INTEGER NOT NULL DEFAULT 1,
    episode_number        INTEGER,
    episode_id            INTEGER,
    episode_url           TEXT,
    episode_start_seconds INTEGER,
    clue_giver_id         INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE RESTRICT,
    description           TEXT,
    description2          TEXT,
    UNIQUE (round_date, round_number)
);

CREATE TABLE IF NOT EXISTS round_solutions (
    round_id   INTEGER NOT NULL REFERENCES rounds(round_id) ON DELETE CASCADE,
    word       TEXT NOT NULL,                -- upper-case
    word_order INTEGER NOT NULL,             -- 1-based
    PRIMARY KEY (round_id, word_order)
);

CREATE TABLE IF NOT EXISTS round_guessers (
    round_id  INTEGER NOT NULL REFERENCES rounds(round_id) ON DELETE CASCADE,
    person_id INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    PRIMARY KEY (round_id, person_id)
);

-- puzzle_id deliberately carries no foreign key: deleting a puzzle leaves
-- its clues pointing at a missing row, which the data check reports.
CREATE TABLE IF NOT EXISTS clues (
    clue_id               INTEGER PRIMARY KEY,
    round_id              INTEGER NOT NULL REFERENCES rounds(round_id) ON DELETE CASCADE,
    clue_number           INTEGER NOT NULL,
    puzzle_id             INTEGER,
    puzzle_clue_number    INTEGER,
    puzzle_clue_direction TEXT CHECK (puzzle_clue_direction IN ('A', 'D')),
    clue_text             TEXT,
    correct_answer        TEXT NOT NULL,     -- upper-case
    UNIQUE (round_id, clue_number)
);

CREATE TABLE IF NOT EXISTS guesses (
    guess_id     INTEGER PRIMARY KEY,
    clue_id      INTEGER NOT NULL REFERENCES clues(clue_id) ON DELETE CASCADE,
    guesser_id   INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    guessed_word TEXT NOT NULL,              -- upper-case
    is_correct   INTEGER NOT NULL,           -- derived at write time
    UNIQUE (clue_id, guesser_id)
);

-- Everyone who played a round: listed guessers plus anyone with a guess in it.
CREATE VIEW IF NOT EXISTS round_participants AS
    SELECT round_id, person_id FROM round_guessers
    UNION
    SELECT c.round_id, g.guesser_id
    FROM guesses g
    JOIN clues c ON c.clue_id = g.clue_id;

CREATE INDEX IF NOT EXISTS clues_puzzle_idx     ON clues(puzzle_id);
CREATE INDEX IF NOT EXISTS guesses_guesser_idx  ON guesses(guesser_id);
CREATE INDEX IF NOT EXISTS guessers_person_idx  ON round_guessers(person_id);
CREATE INDEX IF NOT EXISTS constructors_person_idx ON puzzle_constructors(person_id);

PRAGMA user_version = 1;
";
