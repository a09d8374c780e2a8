//! Taxonomy store abstraction
//!
//! The transfer services never talk to a concrete term table. They go through
//! [`TaxonomyStore`], which the host implements over its own storage. The
//! in-memory store backs the tests and, wrapped in [`JsonFileStore`], the CLI.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

use crate::errors::StoreResult;
use crate::taxonomy::TaxonomyKind;
use crate::term::{NewTerm, Term, TermId, TermUpdate};

pub trait TaxonomyStore {
    fn find_by_id(&self, taxonomy: TaxonomyKind, id: TermId) -> Option<Term>;

    /// First term whose name matches exactly
    fn find_by_name(&self, taxonomy: TaxonomyKind, name: &str) -> Option<Term>;

    fn find_by_slug(&self, taxonomy: TaxonomyKind, slug: &str) -> Option<Term>;

    /// Create a term and return its id. Slug uniqueness is enforced here and
    /// nowhere else.
    fn create(&mut self, taxonomy: TaxonomyKind, term: NewTerm) -> StoreResult<TermId>;

    fn update(&mut self, taxonomy: TaxonomyKind, id: TermId, changes: TermUpdate) -> StoreResult<()>;

    fn set_meta(&mut self, taxonomy: TaxonomyKind, id: TermId, key: &str, value: &str) -> StoreResult<()>;

    fn get_meta(&self, taxonomy: TaxonomyKind, id: TermId, key: &str) -> Option<String>;

    /// All terms of the taxonomy in id order
    fn terms(&self, taxonomy: TaxonomyKind) -> Vec<Term>;
}
