//! The entity kinds that travel as CSV files.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

/// One importable / exportable entity kind.
///
/// Variants are declared in dependency order: each kind may reference only
/// kinds declared before it, so iterating in declaration order is a safe
/// import order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString,
  EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Persons,
  Puzzles,
  Rounds,
  Clues,
  Guesses,
}

impl EntityKind {
  /// All kinds in import order.
  pub fn in_import_order() -> impl Iterator<Item = Self> { Self::iter() }

  /// Conventional file name inside a bundle, e.g. `rounds.csv`.
  pub fn file_name(&self) -> String { format!("{self}.csv") }

  /// Recognise a bundle member by its file name, ignoring directories and
  /// case.
  pub fn from_file_name(path: &str) -> Option<Self> {
    let name = path.rsplit(['/', '\\']).next()?;
    let stem = name
      .strip_suffix(".csv")
      .or_else(|| name.strip_suffix(".CSV"))?;
    stem.parse().ok()
  }
}
