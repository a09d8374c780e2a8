//! JSON file persistence for the in-memory store

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{InMemoryStore, TaxonomyStore};
use crate::errors::{StoreError, StoreResult};
use crate::taxonomy::TaxonomyKind;
use crate::term::{NewTerm, Term, TermId, TermUpdate};

/// An [`InMemoryStore`] loaded from and saved back to a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Load the store at `path`. A missing file opens an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            debug!("Loading store from: {}", path.display());
            let content = fs::read_to_string(&path)
                .map_err(|e| StoreError::Persistence(format!("{}: {}", path.display(), e)))?;
            serde_json::from_str(&content)
                .map_err(|e| StoreError::Persistence(format!("{}: {}", path.display(), e)))?
        } else {
            debug!("No store at {}, starting empty", path.display());
            InMemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    /// Write the current state back to the file
    pub fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Persistence(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.inner)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| StoreError::Persistence(format!("{}: {}", self.path.display(), e)))?;
        info!("Saved store to: {}", self.path.display());
        Ok(())
    }
}

impl TaxonomyStore for JsonFileStore {
    fn find_by_id(&self, taxonomy: TaxonomyKind, id: TermId) -> Option<Term> {
        self.inner.find_by_id(taxonomy, id)
    }

    fn find_by_name(&self, taxonomy: TaxonomyKind, name: &str) -> Option<Term> {
        self.inner.find_by_name(taxonomy, name)
    }

    fn find_by_slug(&self, taxonomy: TaxonomyKind, slug: &str) -> Option<Term> {
        self.inner.find_by_slug(taxonomy, slug)
    }

    fn create(&mut self, taxonomy: TaxonomyKind, term: NewTerm) -> StoreResult<TermId> {
        self.inner.create(taxonomy, term)
    }

    fn update(&mut self, taxonomy: TaxonomyKind, id: TermId, changes: TermUpdate) -> StoreResult<()> {
        self.inner.update(taxonomy, id, changes)
    }

    fn set_meta(&mut self, taxonomy: TaxonomyKind, id: TermId, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set_meta(taxonomy, id, key, value)
    }

    fn get_meta(&self, taxonomy: TaxonomyKind, id: TermId, key: &str) -> Option<String> {
        self.inner.get_meta(taxonomy, id, key)
    }

    fn terms(&self, taxonomy: TaxonomyKind) -> Vec<Term> {
        self.inner.terms(taxonomy)
    }
}
