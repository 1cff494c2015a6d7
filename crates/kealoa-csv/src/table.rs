//! Header-keyed CSV tables.
//!
//! Header names are matched case-insensitively and every cell is trimmed.
//! Short rows are tolerated; missing trailing cells read as absent.

use std::io::{Read, Write};

use crate::error::Result;

// ─── Row ─────────────────────────────────────────────────────────────────────

/// One data row, keyed by normalised header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
  cells: Vec<(String, String)>,
}

impl Row {
  /// The trimmed value of `column`, or `None` when the column is absent or
  /// the cell is empty.
  pub fn get(&self, column: &str) -> Option<&str> {
    let column = normalize_header(column);
    self
      .cells
      .iter()
      .find(|(name, _)| *name == column)
      .map(|(_, value)| value.as_str())
      .filter(|value| !value.is_empty())
  }

  fn raw(&self, column: &str) -> &str {
    self
      .cells
      .iter()
      .find(|(name, _)| name == column)
      .map_or("", |(_, value)| value.as_str())
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A parsed CSV file: the header row plus every data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
  headers: Vec<String>,
  rows:    Vec<Row>,
}

impl Table {
  /// An empty table with the given columns, for building exports.
  pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
    Self {
      headers: headers.iter().map(|h| normalize_header(h.as_ref())).collect(),
      rows:    Vec::new(),
    }
  }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn rows(&self) -> &[Row] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Whether the header row names `column`.
  pub fn has_column(&self, column: &str) -> bool {
    let column = normalize_header(column);
    self.headers.iter().any(|h| *h == column)
  }

  /// Append a row given as values in header order. Extra values are dropped;
  /// missing ones are left empty.
  pub fn push_record<I, S>(&mut self, values: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let cells = self
      .headers
      .iter()
      .cloned()
      .zip(values.into_iter().map(|v| v.into().trim().to_owned()))
      .collect();
    self.rows.push(Row { cells });
  }

  /// Write the header row followed by every data row.
  pub fn write<W: Write>(&self, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&self.headers)?;
    for row in &self.rows {
      out.write_record(self.headers.iter().map(|h| row.raw(h)))?;
    }
    out.flush()?;
    Ok(())
  }

  /// The table serialised as CSV bytes.
  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    self.write(&mut buf)?;
    Ok(buf)
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a CSV document whose first record is the header row.
///
/// Any malformed record fails the whole parse.
pub fn parse<R: Read>(reader: R) -> Result<Table> {
  let mut input = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let mut table = Table::new(&input.headers()?.iter().collect::<Vec<_>>());
  for record in input.records() {
    table.push_record(record?.iter());
  }
  Ok(table)
}

fn normalize_header(raw: &str) -> String {
  raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}
