//! Error types for `kealoa-core`.

use thiserror::Error;

/// Validation failures raised while normalising raw field values.
///
/// The `Display` text of each variant is user-facing: the import reconciler
/// embeds it verbatim in its `"Line N: …"` messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("invalid direction {0:?} (expected A or D)")]
  InvalidDirection(String),

  #[error("invalid date {0:?}")]
  InvalidDate(String),

  #[error("invalid {field} {value:?} (expected a whole number)")]
  InvalidNumber { field: &'static str, value: String },

  #[error("missing required field {0}")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
