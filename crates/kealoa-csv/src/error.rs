//! Error types for the kealoa-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("ZIP error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
