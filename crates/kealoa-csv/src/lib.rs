//! CSV and ZIP codec for KEALOA tables.
//!
//! Converts between CSV text and header-keyed [`Table`]s, and between ZIP
//! bundles and one table per [`EntityKind`]. Pure synchronous; no database
//! dependencies. Interpreting the cells is left to the caller.
//!
//! # Quick start
//!
//! ```no_run
//! use kealoa_csv::parse;
//!
//! let input = "full_name,home_page_url\nPat Lee,\n";
//! let table = parse(input.as_bytes()).unwrap();
//! assert_eq!(table.rows()[0].get("full_name"), Some("Pat Lee"));
//! assert_eq!(table.rows()[0].get("home_page_url"), None);
//! ```
//!
//! [`EntityKind`]: kealoa_core::kind::EntityKind

mod bundle;
pub mod error;
mod table;

pub use bundle::{Bundle, read_bundle, write_bundle};
pub use error::{Error, Result};
pub use table::{Row, Table, parse};
