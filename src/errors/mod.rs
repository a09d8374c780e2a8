//! Domain-specific error types for the taxonomy transfer pipeline
//!
//! # Error Categories
//!
//! - **TransferError**: file-level failures while reading or writing transfer
//!   files (unknown format, malformed CSV/JSON, IO)
//! - **StoreError**: failures reported by a taxonomy store (slug conflicts,
//!   unknown terms, invalid parent links)
//!
//! Row-level problems during an import are not errors: they are collected in
//! the import report and the batch carries on.
//!
//! # Examples
//!
//! ```rust
//! use taxonomy::errors::{StoreError, TransferError};
//!
//! let err = TransferError::UnsupportedFormat("xml".to_string());
//! assert_eq!(err.error_code(), "unsupported_format");
//! assert_eq!(err.status(), 400);
//!
//! let err = StoreError::DuplicateSlug("hiking".to_string());
//! assert!(err.is_conflict());
//! ```

pub mod store;
pub mod transfer;

pub use store::StoreError;
pub use transfer::{ErrorInfo, TransferError};

/// Result type alias for file-level transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Result type alias for taxonomy store operations
pub type StoreResult<T> = Result<T, StoreError>;
