//! Normalisation of raw text fields into domain values.
//!
//! These are shared by the store (which upper-cases on every write) and by
//! the import reconciler (which parses CSV cells).

use chrono::NaiveDate;

use crate::{Error, Result};

/// Trim and upper-case a word or answer.
pub fn upper(s: &str) -> String { s.trim().to_uppercase() }

/// Key under which person names are compared: trimmed and lower-cased with
/// full Unicode case folding, so `Élodie` and `élodie` share one key.
pub fn name_key(name: &str) -> String { name.trim().to_lowercase() }

/// Date formats accepted on input, tried in order. Output always uses the
/// first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse `YYYY-MM-DD`, `M/D/YYYY` or `YYYY/MM/DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
  let s = raw.trim();
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    .ok_or_else(|| Error::InvalidDate(s.to_owned()))
}

/// Parse a non-negative whole number, tolerating a trailing `.0` as written
/// by spreadsheet exports.
pub fn parse_number(field: &'static str, raw: &str) -> Result<u32> {
  let s = raw.trim();
  let digits = s.strip_suffix(".0").unwrap_or(s);
  digits.parse::<u32>().map_err(|_| Error::InvalidNumber {
    field,
    value: s.to_owned(),
  })
}

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Join names or words back into the form [`split_list`] reads.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
  items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_iso_and_us_dates() {
    let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(parse_date("2024-03-07").unwrap(), expected);
    assert_eq!(parse_date("3/7/2024").unwrap(), expected);
    assert_eq!(parse_date(" 2024/03/07 ").unwrap(), expected);
  }

  #[test]
  fn rejects_garbage_date() {
    assert_eq!(
      parse_date("yesterday"),
      Err(Error::InvalidDate("yesterday".into()))
    );
    assert!(parse_date("2024-02-30").is_err());
  }

  #[test]
  fn numbers_tolerate_spreadsheet_suffix() {
    assert_eq!(parse_number("clue_number", "12").unwrap(), 12);
    assert_eq!(parse_number("clue_number", "12.0").unwrap(), 12);
    assert!(parse_number("clue_number", "-1").is_err());
    assert!(parse_number("clue_number", "twelve").is_err());
  }

  #[test]
  fn name_key_folds_non_ascii_case() {
    assert_eq!(name_key(" Élodie "), name_key("élodie"));
    assert_eq!(name_key("ÅSA ÖBERG"), "åsa öberg");
    assert_ne!(name_key("Pat Lee"), name_key("Pat Lea"));
  }

  #[test]
  fn split_list_trims_and_drops_empties() {
    assert_eq!(split_list("Pat Lee, Sam Kim,, "), vec!["Pat Lee", "Sam Kim"]);
    assert!(split_list("").is_empty());
  }

  #[test]
  fn join_list_inverts_split() {
    let names = vec!["A".to_owned(), "B".to_owned()];
    assert_eq!(split_list(&join_list(&names)), names);
  }
}
