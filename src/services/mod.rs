pub mod export_service;
pub mod import_service;

pub use export_service::{ExportResult, ExportService};
pub use import_service::{IdMap, ImportReport, ImportService, IssueReason, RowIssue};
