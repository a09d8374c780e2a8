//! Errors raised while reading or writing transfer files

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File-level transfer errors
#[derive(Error, Debug)]
pub enum TransferError {
    /// Format name not known to the reader/writer factory
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File contents do not have the expected shape
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransferError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransferError::UnsupportedFormat(_)
                | TransferError::InvalidFormat(_)
                | TransferError::Json(_)
                | TransferError::Csv(_)
                | TransferError::Config(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransferError::FileNotFound(_))
    }

    /// HTTP-like status code for callers that report errors over a request boundary
    pub fn status(&self) -> u16 {
        if self.is_not_found() {
            404
        } else if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            TransferError::UnsupportedFormat(_) => "unsupported_format",
            TransferError::InvalidFormat(_) => "invalid_format",
            TransferError::Json(_) => "json_error",
            TransferError::Csv(_) => "csv_error",
            TransferError::FileNotFound(_) => "file_not_found",
            TransferError::Io(_) => "io_error",
            TransferError::Config(_) => "config_error",
        }
    }
}

impl From<serde_yaml::Error> for TransferError {
    fn from(err: serde_yaml::Error) -> Self {
        TransferError::Config(err.to_string())
    }
}

/// Serializable error payload handed back to callers instead of a raw error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub status: u16,
    pub message: String,
}

impl From<&TransferError> for ErrorInfo {
    fn from(err: &TransferError) -> Self {
        Self {
            code: err.error_code().to_string(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}
