//! Transfer file reading and writing
//!
//! Rows travel between the services and the files as ordered string maps
//! keyed by column key. Readers and writers are obtained from a factory keyed
//! on the format name so the services never branch on the format themselves.

pub mod csv_io;
pub mod detect;
pub mod json_io;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::errors::{TransferError, TransferResult};

/// One row of a transfer file, keyed by column key
pub type Row = IndexMap<String, String>;

/// A declared column: machine key plus human-readable label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Supported transfer formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Array of JSON objects
    Json,
}

impl TransferFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TransferFormat::Csv => "csv",
            TransferFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TransferFormat::Csv => "text/csv",
            TransferFormat::Json => "application/json",
        }
    }

    /// Detect format from a file extension
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> Option<TransferFormat> {
        let extension = file_path.as_ref().extension()?.to_str()?.to_lowercase();
        extension.parse().ok()
    }
}

impl fmt::Display for TransferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TransferFormat {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(TransferFormat::Csv),
            "json" => Ok(TransferFormat::Json),
            other => Err(TransferError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parses a transfer file into rows
pub trait RowReader {
    fn format(&self) -> TransferFormat;

    fn read_rows(&self, input: &mut dyn Read, columns: &[Column]) -> TransferResult<Vec<Row>>;
}

/// Serializes rows into the bytes of a transfer file
pub trait RowWriter {
    fn format(&self) -> TransferFormat;

    fn write_rows(&self, rows: &[Row], columns: &[Column]) -> TransferResult<Vec<u8>>;
}

/// A finished export, ready to be handed to the user as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Write the file into `dir` under its own name, returning the full path
    pub fn save_to<P: AsRef<Path>>(&self, dir: P) -> TransferResult<std::path::PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Reader for a format name
pub fn reader_for(format: &str) -> TransferResult<Box<dyn RowReader>> {
    let format: TransferFormat = format.parse()?;
    Ok(reader(format))
}

/// Writer for a format name
pub fn writer_for(format: &str) -> TransferResult<Box<dyn RowWriter>> {
    let format: TransferFormat = format.parse()?;
    Ok(writer(format))
}

pub fn reader(format: TransferFormat) -> Box<dyn RowReader> {
    match format {
        TransferFormat::Csv => Box::new(csv_io::CsvRows),
        TransferFormat::Json => Box::new(json_io::JsonRows),
    }
}

pub fn writer(format: TransferFormat) -> Box<dyn RowWriter> {
    match format {
        TransferFormat::Csv => Box::new(csv_io::CsvRows),
        TransferFormat::Json => Box::new(json_io::JsonRows),
    }
}

/// Serialize rows with `writer` and name the result `<base_name>.<ext>`
pub fn export_file(
    writer: &dyn RowWriter,
    rows: &[Row],
    columns: &[Column],
    base_name: &str,
) -> TransferResult<ExportFile> {
    let format = writer.format();
    debug!("Writing {} rows as {}", rows.len(), format);

    let bytes = writer.write_rows(rows, columns)?;
    Ok(ExportFile {
        file_name: format!("{}.{}", base_name, format.extension()),
        mime_type: format.mime_type(),
        bytes,
    })
}

/// Map a header cell or object key onto a declared column key.
///
/// Matches either the key or the label, case-insensitively. Unknown headers
/// are kept in lowercase so they still round-trip through the row map.
pub(crate) fn normalize_header(header: &str, columns: &[Column]) -> String {
    let header = header.trim().trim_start_matches('\u{feff}');
    columns
        .iter()
        .find(|c| c.key.eq_ignore_ascii_case(header) || c.label.eq_ignore_ascii_case(header))
        .map(|c| c.key.to_string())
        .unwrap_or_else(|| header.to_lowercase())
}

/// Ensure every declared column is present so lookups never miss
pub(crate) fn fill_missing(row: &mut Row, columns: &[Column]) {
    for column in columns {
        row.entry(column.key.to_string()).or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        Column::new("id", "ID"),
        Column::new("parent_name", "Parent Name"),
    ];

    #[test]
    fn format_parsing() {
        assert_eq!("csv".parse::<TransferFormat>().unwrap(), TransferFormat::Csv);
        assert_eq!(" JSON ".parse::<TransferFormat>().unwrap(), TransferFormat::Json);
        let err = "xml".parse::<TransferFormat>().unwrap_err();
        assert_eq!(err.error_code(), "unsupported_format");
    }

    #[test]
    fn format_from_path() {
        assert_eq!(TransferFormat::from_path("terms.CSV"), Some(TransferFormat::Csv));
        assert_eq!(TransferFormat::from_path("dir/terms.json"), Some(TransferFormat::Json));
        assert_eq!(TransferFormat::from_path("terms.xml"), None);
        assert_eq!(TransferFormat::from_path("terms"), None);
    }

    #[test]
    fn factory_rejects_unknown_format() {
        assert!(writer_for("yaml").is_err());
        assert!(reader_for("").is_err());
        assert_eq!(writer_for("json").unwrap().format(), TransferFormat::Json);
        assert_eq!(reader_for("csv").unwrap().format(), TransferFormat::Csv);
    }

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("ID", COLUMNS), "id");
        assert_eq!(normalize_header(" parent name ", COLUMNS), "parent_name");
        assert_eq!(normalize_header("PARENT_NAME", COLUMNS), "parent_name");
        assert_eq!(normalize_header("\u{feff}id", COLUMNS), "id");
        assert_eq!(normalize_header("Extra", COLUMNS), "extra");
    }

    #[test]
    fn export_file_naming() {
        let file = export_file(&json_io::JsonRows, &[], COLUMNS, "category-data").unwrap();
        assert_eq!(file.file_name, "category-data.json");
        assert_eq!(file.mime_type, "application/json");
        assert_eq!(file.bytes, b"[]");
    }
}
