//! Errors reported by taxonomy stores

use thiserror::Error;

use crate::term::TermId;

/// Taxonomy store operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another term in the taxonomy already uses the slug
    #[error("Duplicate term slug: {0}")]
    DuplicateSlug(String),

    /// Term name is empty
    #[error("Term name cannot be empty")]
    EmptyName,

    /// Term does not exist in the taxonomy
    #[error("Term not found: {0}")]
    TermNotFound(TermId),

    /// Id already belongs to another term
    #[error("Term id already in use: {0}")]
    IdInUse(TermId),

    /// Parent link would point outside the taxonomy or create a cycle
    #[error("Invalid parent {parent} for term {term}")]
    InvalidParent { term: TermId, parent: TermId },

    /// Store backing file could not be read or written
    #[error("Store persistence failed: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Check if the store rejected the write because of existing data
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateSlug(_)
                | StoreError::IdInUse(_)
                | StoreError::InvalidParent { .. }
        )
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::DuplicateSlug(_) => "duplicate_term_slug",
            StoreError::EmptyName => "empty_term_name",
            StoreError::TermNotFound(_) => "term_not_found",
            StoreError::IdInUse(_) => "term_id_in_use",
            StoreError::InvalidParent { .. } => "invalid_parent",
            StoreError::Persistence(_) => "store_persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_slug() {
        let err = StoreError::DuplicateSlug("outdoor".to_string());
        assert_eq!(err.to_string(), "Duplicate term slug: outdoor");
        assert!(err.is_conflict());
        assert_eq!(err.error_code(), "duplicate_term_slug");
    }

    #[test]
    fn test_invalid_parent() {
        let err = StoreError::InvalidParent { term: 3, parent: 3 };
        assert_eq!(err.to_string(), "Invalid parent 3 for term 3");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_id_in_use() {
        let err = StoreError::IdInUse(4);
        assert_eq!(err.to_string(), "Term id already in use: 4");
        assert!(err.is_conflict());
        assert_eq!(err.error_code(), "term_id_in_use");
    }

    #[test]
    fn test_not_found_is_not_conflict() {
        assert!(!StoreError::TermNotFound(9).is_conflict());
        assert_eq!(StoreError::EmptyName.error_code(), "empty_term_name");
    }
}
