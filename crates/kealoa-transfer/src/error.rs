//! Error types for kealoa-transfer.
//!
//! Row-level problems never surface here; they are collected into
//! [`crate::ImportResult::errors`]. These are the failures that abort a whole
//! call.

use kealoa_core::round::RoundKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("codec error: {0}")]
  Csv(#[from] kealoa_csv::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("no person named {0:?}")]
  PersonNotFound(String),

  #[error("round {0} not found")]
  RoundNotFound(RoundKey),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
