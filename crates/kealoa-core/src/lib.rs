//! Core types and trait definitions for the KEALOA reference database.
//!
//! This crate is deliberately free of database and file-format dependencies.
//! All other crates depend on it.

pub mod check;
pub mod clue;
pub mod error;
pub mod guess;
pub mod kind;
pub mod normalize;
pub mod person;
pub mod puzzle;
pub mod round;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
