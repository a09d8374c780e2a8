//! Bulk export and import of hierarchical taxonomy terms
//!
//! Terms are exported from a [`store::TaxonomyStore`] to CSV or JSON and
//! imported back with a two-pass algorithm that recreates parent links even
//! when destination ids differ from the source ids.

pub mod config;
pub mod errors;
pub mod formats;
pub mod sanitize;
pub mod services;
pub mod store;
pub mod taxonomy;
pub mod term;

pub use services::{ExportResult, ExportService, ImportReport, ImportService};
pub use store::{InMemoryStore, JsonFileStore, TaxonomyStore};
pub use taxonomy::TaxonomyKind;
pub use term::{Term, TermId};
