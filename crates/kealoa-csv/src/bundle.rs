//! ZIP bundles holding one CSV file per entity kind.

use std::{
  collections::BTreeMap,
  io::{Read, Seek, Write},
};

use kealoa_core::kind::EntityKind;
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::FileOptions};

use crate::{error::Result, table::{Table, parse}};

/// The tables found in (or destined for) a bundle, keyed by kind.
///
/// Iteration follows [`EntityKind`] declaration order, which is the order
/// tables must be imported in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
  tables: BTreeMap<EntityKind, Table>,
}

impl Bundle {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, kind: EntityKind, table: Table) {
    self.tables.insert(kind, table);
  }

  pub fn get(&self, kind: EntityKind) -> Option<&Table> { self.tables.get(&kind) }

  pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
    self.tables.keys().copied()
  }

  /// Present tables in import order.
  pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &Table)> {
    self.tables.iter().map(|(kind, table)| (*kind, table))
  }

  pub fn is_empty(&self) -> bool { self.tables.is_empty() }
}

/// Read every recognised `<kind>.csv` member of a ZIP archive.
///
/// Members are matched by file name regardless of directory. Other members
/// are ignored; if two members name the same kind, the later one wins.
pub fn read_bundle<R: Read + Seek>(reader: R) -> Result<Bundle> {
  let mut archive = ZipArchive::new(reader)?;
  let mut bundle = Bundle::new();

  for i in 0..archive.len() {
    let mut member = archive.by_index(i)?;
    if member.is_dir() {
      continue;
    }
    let Some(kind) = EntityKind::from_file_name(member.name()) else {
      continue;
    };
    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes)?;
    bundle.insert(kind, parse(bytes.as_slice())?);
  }

  Ok(bundle)
}

/// Write each table of `bundle` as `<kind>.csv` into a new ZIP archive and
/// return the finished writer.
pub fn write_bundle<W: Write + Seek>(writer: W, bundle: &Bundle) -> Result<W> {
  let mut zip = ZipWriter::new(writer);
  let options =
    FileOptions::default().compression_method(CompressionMethod::Deflated);

  for (kind, table) in bundle.iter() {
    zip.start_file(kind.file_name(), options)?;
    table.write(&mut zip)?;
  }

  Ok(zip.finish()?)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
    let mut t = Table::new(headers);
    for row in rows {
      t.push_record(row.iter().copied());
    }
    t
  }

  #[test]
  fn bundle_survives_a_zip_round_trip() {
    let mut bundle = Bundle::new();
    bundle.insert(
      EntityKind::Guesses,
      table(&["round_date", "clue_number", "guesser", "guessed_word"], &[&[
        "2024-01-01",
        "1",
        "Pat Lee",
        "KEA",
      ]]),
    );
    bundle.insert(
      EntityKind::Persons,
      table(&["full_name"], &[&["Pat Lee"], &["Sam Kim"]]),
    );

    let bytes = write_bundle(Cursor::new(Vec::new()), &bundle)
      .unwrap()
      .into_inner();
    let read = read_bundle(Cursor::new(bytes)).unwrap();

    assert_eq!(read, bundle);
    assert_eq!(
      read.kinds().collect::<Vec<_>>(),
      vec![EntityKind::Persons, EntityKind::Guesses]
    );
  }

  #[test]
  fn unrelated_members_are_ignored() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    zip.start_file("README.txt", options).unwrap();
    zip.write_all(b"hello").unwrap();
    zip.start_file("export/Rounds.csv", options).unwrap();
    zip.write_all(b"round_date,clue_giver\n2024-01-01,Host\n").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let bundle = read_bundle(Cursor::new(bytes)).unwrap();
    assert_eq!(bundle.kinds().collect::<Vec<_>>(), vec![EntityKind::Rounds]);
    let rounds = bundle.get(EntityKind::Rounds).unwrap();
    assert_eq!(rounds.rows()[0].get("clue_giver"), Some("Host"));
  }

  #[test]
  fn garbage_is_not_a_bundle() {
    let err = read_bundle(Cursor::new(b"not a zip".to_vec())).unwrap_err();
    assert!(matches!(err, crate::Error::Zip(_)));
  }
}
