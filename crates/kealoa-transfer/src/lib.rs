//! Moving KEALOA data in and out of a store.
//!
//! [`Importer`] reconciles CSV tables row by row against any
//! [`KealoaStore`], [`Exporter`] writes the store back out in the same
//! shapes, and [`report`] assembles the statistics views.
//!
//! [`KealoaStore`]: kealoa_core::store::KealoaStore

pub mod error;
pub mod export;
pub mod import;
pub mod report;

pub use error::{Error, Result};
pub use export::Exporter;
pub use import::{ImportResult, Importer};

#[cfg(test)]
mod tests;
