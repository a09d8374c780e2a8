use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TaxonomyStore;
use crate::errors::{StoreError, StoreResult};
use crate::sanitize;
use crate::taxonomy::TaxonomyKind;
use crate::term::{NewTerm, Term, TermId, TermUpdate};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct TaxonomyTable {
    terms: IndexMap<TermId, Term>,
    #[serde(default)]
    meta: IndexMap<TermId, IndexMap<String, String>>,
}

impl TaxonomyTable {
    fn slug_taken(&self, slug: &str, except: Option<TermId>) -> bool {
        self.terms
            .values()
            .any(|t| t.slug == slug && Some(t.id) != except)
    }

    /// `base`, then `base-2`, `base-3`, ... until one is free
    fn unique_slug(&self, base: &str) -> String {
        if !self.slug_taken(base, None) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.slug_taken(candidate, None))
            .unwrap_or_else(|| base.to_string())
    }

    /// True when `ancestor` is `id` itself or appears on the parent chain above `id`
    fn is_ancestor_or_self(&self, ancestor: TermId, id: TermId) -> bool {
        let mut current = id;
        let mut steps = 0;
        while current != 0 && steps <= self.terms.len() {
            if current == ancestor {
                return true;
            }
            current = self.terms.get(&current).map(|t| t.parent).unwrap_or(0);
            steps += 1;
        }
        false
    }
}

/// Term tables held in memory, one per taxonomy name. Ids come from a
/// single counter shared by all taxonomies.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InMemoryStore {
    #[serde(default)]
    last_id: TermId,
    #[serde(default)]
    taxonomies: IndexMap<String, TaxonomyTable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, taxonomy: TaxonomyKind) -> Option<&TaxonomyTable> {
        self.taxonomies.get(taxonomy.taxonomy_name())
    }

    /// Next free id. Never below an id already present, so a snapshot with a
    /// stale or missing counter cannot hand out an occupied id.
    fn next_id(&self) -> TermId {
        let highest = self
            .taxonomies
            .values()
            .flat_map(|table| table.terms.keys())
            .copied()
            .max()
            .unwrap_or(0);
        self.last_id.max(highest) + 1
    }

    fn table_mut(&mut self, taxonomy: TaxonomyKind) -> &mut TaxonomyTable {
        self.taxonomies
            .entry(taxonomy.taxonomy_name().to_string())
            .or_default()
    }

    /// Set the number of items tagged with a term. Owned by the host, not by
    /// the transfer pipeline.
    pub fn set_count(&mut self, taxonomy: TaxonomyKind, id: TermId, count: u64) -> StoreResult<()> {
        let term = self
            .table_mut(taxonomy)
            .terms
            .get_mut(&id)
            .ok_or(StoreError::TermNotFound(id))?;
        term.count = count;
        Ok(())
    }

    /// Delete a term. Its children move up to its parent.
    pub fn remove(&mut self, taxonomy: TaxonomyKind, id: TermId) -> StoreResult<Term> {
        let table = self.table_mut(taxonomy);
        let removed = table
            .terms
            .shift_remove(&id)
            .ok_or(StoreError::TermNotFound(id))?;
        table.meta.shift_remove(&id);
        for term in table.terms.values_mut() {
            if term.parent == id {
                term.parent = removed.parent;
            }
        }
        Ok(removed)
    }

    pub fn len(&self, taxonomy: TaxonomyKind) -> usize {
        self.table(taxonomy).map(|t| t.terms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, taxonomy: TaxonomyKind) -> bool {
        self.len(taxonomy) == 0
    }
}

impl TaxonomyStore for InMemoryStore {
    fn find_by_id(&self, taxonomy: TaxonomyKind, id: TermId) -> Option<Term> {
        self.table(taxonomy)?.terms.get(&id).cloned()
    }

    fn find_by_name(&self, taxonomy: TaxonomyKind, name: &str) -> Option<Term> {
        self.table(taxonomy)?
            .terms
            .values()
            .find(|t| t.name == name)
            .cloned()
    }

    fn find_by_slug(&self, taxonomy: TaxonomyKind, slug: &str) -> Option<Term> {
        self.table(taxonomy)?
            .terms
            .values()
            .find(|t| t.slug == slug)
            .cloned()
    }

    fn create(&mut self, taxonomy: TaxonomyKind, term: NewTerm) -> StoreResult<TermId> {
        if term.name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }

        let id = self.next_id();
        let table = self.table_mut(taxonomy);

        let slug = if term.slug.is_empty() {
            let base = sanitize::slug(&term.name);
            let base = if base.is_empty() { id.to_string() } else { base };
            table.unique_slug(&base)
        } else if table.slug_taken(&term.slug, None) {
            return Err(StoreError::DuplicateSlug(term.slug));
        } else {
            term.slug
        };

        if term.parent != 0 && !table.terms.contains_key(&term.parent) {
            return Err(StoreError::InvalidParent {
                term: id,
                parent: term.parent,
            });
        }

        match table.terms.entry(id) {
            Entry::Occupied(_) => return Err(StoreError::IdInUse(id)),
            Entry::Vacant(slot) => {
                debug!("Creating {} term {} ({})", taxonomy, id, slug);
                slot.insert(Term {
                    id,
                    name: term.name,
                    slug,
                    description: term.description,
                    parent: term.parent,
                    count: 0,
                });
            }
        }
        self.last_id = id;
        Ok(id)
    }

    fn update(&mut self, taxonomy: TaxonomyKind, id: TermId, changes: TermUpdate) -> StoreResult<()> {
        let table = self.table_mut(taxonomy);
        if !table.terms.contains_key(&id) {
            return Err(StoreError::TermNotFound(id));
        }

        if let Some(slug) = &changes.slug {
            if !slug.is_empty() && table.slug_taken(slug, Some(id)) {
                return Err(StoreError::DuplicateSlug(slug.clone()));
            }
        }
        if let Some(parent) = changes.parent {
            let invalid = parent != 0
                && (!table.terms.contains_key(&parent) || table.is_ancestor_or_self(id, parent));
            if invalid {
                return Err(StoreError::InvalidParent { term: id, parent });
            }
        }

        let term = table
            .terms
            .get_mut(&id)
            .ok_or(StoreError::TermNotFound(id))?;
        if let Some(slug) = changes.slug.filter(|s| !s.is_empty()) {
            term.slug = slug;
        }
        if let Some(description) = changes.description {
            term.description = description;
        }
        if let Some(parent) = changes.parent {
            term.parent = parent;
        }
        Ok(())
    }

    fn set_meta(&mut self, taxonomy: TaxonomyKind, id: TermId, key: &str, value: &str) -> StoreResult<()> {
        let table = self.table_mut(taxonomy);
        if !table.terms.contains_key(&id) {
            return Err(StoreError::TermNotFound(id));
        }
        table
            .meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_meta(&self, taxonomy: TaxonomyKind, id: TermId, key: &str) -> Option<String> {
        self.table(taxonomy)?.meta.get(&id)?.get(key).cloned()
    }

    fn terms(&self, taxonomy: TaxonomyKind) -> Vec<Term> {
        self.table(taxonomy)
            .map(|t| t.terms.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT: TaxonomyKind = TaxonomyKind::Category;

    #[test]
    fn create_assigns_ids_and_slugs() {
        let mut store = InMemoryStore::new();
        let a = store.create(CAT, NewTerm::new("Outdoor Trips")).unwrap();
        let b = store.create(TaxonomyKind::Tag, NewTerm::new("Outdoor Trips")).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.find_by_id(CAT, a).unwrap().slug, "outdoor-trips");
        assert!(store.find_by_id(CAT, b).is_none());
    }

    #[test]
    fn derived_slugs_are_made_unique() {
        let mut store = InMemoryStore::new();
        store.create(CAT, NewTerm::new("Music")).unwrap();
        let id = store.create(CAT, NewTerm::new("Music")).unwrap();
        assert_eq!(store.find_by_id(CAT, id).unwrap().slug, "music-2");
    }

    #[test]
    fn explicit_duplicate_slug_is_rejected() {
        let mut store = InMemoryStore::new();
        store.create(CAT, NewTerm::new("Music").with_slug("music")).unwrap();
        let err = store
            .create(CAT, NewTerm::new("Live music").with_slug("music"))
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateSlug("music".to_string()));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.create(CAT, NewTerm::new("  ")), Err(StoreError::EmptyName));
    }

    #[test]
    fn lookups() {
        let mut store = InMemoryStore::new();
        let id = store.create(CAT, NewTerm::new("Hiking").with_slug("walks")).unwrap();
        assert_eq!(store.find_by_name(CAT, "Hiking").unwrap().id, id);
        assert_eq!(store.find_by_slug(CAT, "walks").unwrap().id, id);
        assert!(store.find_by_name(CAT, "hiking").is_none());
        assert!(store.find_by_name(TaxonomyKind::Tag, "Hiking").is_none());
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut store = InMemoryStore::new();
        let id = store
            .create(CAT, NewTerm::new("Hiking").with_description("old"))
            .unwrap();
        store
            .update(
                CAT,
                id,
                TermUpdate {
                    description: Some("new".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let term = store.find_by_id(CAT, id).unwrap();
        assert_eq!(term.description, "new");
        assert_eq!(term.slug, "hiking");
        assert_eq!(term.name, "Hiking");
    }

    #[test]
    fn update_rejects_slug_conflicts() {
        let mut store = InMemoryStore::new();
        store.create(CAT, NewTerm::new("Music")).unwrap();
        let id = store.create(CAT, NewTerm::new("Film")).unwrap();
        let err = store
            .update(
                CAT,
                id,
                TermUpdate {
                    slug: Some("music".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let mut store = InMemoryStore::new();
        let a = store.create(CAT, NewTerm::new("A")).unwrap();
        let b = store.create(CAT, NewTerm::new("B").with_parent(a)).unwrap();
        let c = store.create(CAT, NewTerm::new("C").with_parent(b)).unwrap();

        assert!(store.update(CAT, a, TermUpdate::parent(c)).is_err());
        assert!(store.update(CAT, a, TermUpdate::parent(a)).is_err());
        assert!(store.update(CAT, a, TermUpdate::parent(99)).is_err());
        assert!(store.update(CAT, c, TermUpdate::parent(a)).is_ok());
        assert!(store.update(CAT, c, TermUpdate::parent(0)).is_ok());
    }

    #[test]
    fn meta_requires_existing_term() {
        let mut store = InMemoryStore::new();
        let id = store.create(CAT, NewTerm::new("A")).unwrap();
        store.set_meta(CAT, id, "color", "#fff").unwrap();
        assert_eq!(store.get_meta(CAT, id, "color"), Some("#fff".to_string()));
        assert_eq!(store.get_meta(CAT, id, "icon"), None);
        assert!(store.set_meta(CAT, 42, "color", "#000").is_err());
    }

    #[test]
    fn remove_reparents_children() {
        let mut store = InMemoryStore::new();
        let a = store.create(CAT, NewTerm::new("A")).unwrap();
        let b = store.create(CAT, NewTerm::new("B").with_parent(a)).unwrap();
        let c = store.create(CAT, NewTerm::new("C").with_parent(b)).unwrap();

        store.remove(CAT, b).unwrap();
        assert_eq!(store.find_by_id(CAT, c).unwrap().parent, a);
        assert_eq!(store.len(CAT), 2);
    }

    #[test]
    fn serde_snapshot_keeps_id_counter() {
        let mut store = InMemoryStore::new();
        store.create(CAT, NewTerm::new("A")).unwrap();
        let json = serde_json::to_string(&store).unwrap();
        let mut restored: InMemoryStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.create(CAT, NewTerm::new("B")).unwrap(), 2);
        assert_eq!(restored.terms(CAT).len(), 2);
    }

    #[test]
    fn snapshot_without_counter_does_not_reuse_ids() {
        let json = r#"{"taxonomies":{"etn_category":{"terms":{"1":{"id":1,"name":"Old","slug":"old"}}},
            "etn_tags":{"terms":{"7":{"id":7,"name":"Family","slug":"family"}}}}}"#;
        let mut restored: InMemoryStore = serde_json::from_str(json).unwrap();

        let id = restored.create(CAT, NewTerm::new("New")).unwrap();
        assert_eq!(id, 8);
        assert_eq!(restored.find_by_name(CAT, "Old").unwrap().id, 1);
        assert_eq!(restored.find_by_name(CAT, "New").unwrap().id, 8);
        assert_eq!(restored.len(CAT), 2);
        assert_eq!(restored.create(TaxonomyKind::Tag, NewTerm::new("Kids")).unwrap(), 9);
    }
}
