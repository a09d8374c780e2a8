//! JSON import/export functionality

use serde_json::{Map, Value};
use std::io::Read;
use tracing::debug;

use super::{fill_missing, normalize_header, Column, Row, RowReader, RowWriter, TransferFormat};
use crate::errors::{TransferError, TransferResult};

/// JSON array of flat objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRows;

impl RowReader for JsonRows {
    fn format(&self) -> TransferFormat {
        TransferFormat::Json
    }

    fn read_rows(&self, input: &mut dyn Read, columns: &[Column]) -> TransferResult<Vec<Row>> {
        let value: Value = serde_json::from_reader(input)?;
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(TransferError::InvalidFormat(format!(
                    "expected an array of objects, found {}",
                    value_kind(&other)
                )))
            }
        };
        debug!("JSON rows: {}", items.len());

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(object) => object_to_row(object, columns, index),
                other => Err(TransferError::InvalidFormat(format!(
                    "row {}: expected an object, found {}",
                    index + 1,
                    value_kind(&other)
                ))),
            })
            .collect()
    }
}

impl RowWriter for JsonRows {
    fn format(&self) -> TransferFormat {
        TransferFormat::Json
    }

    fn write_rows(&self, rows: &[Row], columns: &[Column]) -> TransferResult<Vec<u8>> {
        let objects: Vec<Value> = rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = columns
                    .iter()
                    .map(|c| {
                        let value = row.get(c.key).cloned().unwrap_or_default();
                        (c.key.to_string(), Value::String(value))
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();

        Ok(serde_json::to_vec_pretty(&objects)?)
    }
}

fn object_to_row(object: Map<String, Value>, columns: &[Column], index: usize) -> TransferResult<Row> {
    let mut row = Row::new();
    for (key, value) in object {
        let cell = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            other => {
                return Err(TransferError::InvalidFormat(format!(
                    "row {}: field '{}' must be a scalar, found {}",
                    index + 1,
                    key,
                    value_kind(&other)
                )))
            }
        };
        row.insert(normalize_header(&key, columns), cell);
    }
    fill_missing(&mut row, columns);
    Ok(row)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        Column::new("id", "ID"),
        Column::new("name", "Name"),
        Column::new("parent", "Parent"),
    ];

    #[test]
    fn reads_scalars_as_strings() {
        let data = r#"[{"id": 4, "Name": "Outdoor", "parent": null}, {"id": "5", "name": "Hiking", "parent": 4}]"#;
        let rows = JsonRows.read_rows(&mut data.as_bytes(), COLUMNS).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "4");
        assert_eq!(rows[0]["name"], "Outdoor");
        assert_eq!(rows[0]["parent"], "");
        assert_eq!(rows[1]["parent"], "4");
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let data = r#"[{"name": "Outdoor"}]"#;
        let rows = JsonRows.read_rows(&mut data.as_bytes(), COLUMNS).unwrap();
        assert_eq!(rows[0]["id"], "");
        assert_eq!(rows[0]["parent"], "");
    }

    #[test]
    fn rejects_non_array_top_level() {
        let data = r#"{"name": "Outdoor"}"#;
        let err = JsonRows.read_rows(&mut data.as_bytes(), COLUMNS).unwrap_err();
        assert_eq!(err.error_code(), "invalid_format");
    }

    #[test]
    fn rejects_nested_values() {
        let data = r#"[{"name": ["Outdoor"]}]"#;
        let err = JsonRows.read_rows(&mut data.as_bytes(), COLUMNS).unwrap_err();
        assert!(err.to_string().contains("field 'name' must be a scalar"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = JsonRows
            .read_rows(&mut "[{".as_bytes(), COLUMNS)
            .unwrap_err();
        assert_eq!(err.error_code(), "json_error");
    }

    #[test]
    fn writes_objects_keyed_by_column() {
        let mut row = Row::new();
        row.insert("name".to_string(), "Outdoor".to_string());
        row.insert("id".to_string(), "1".to_string());
        let bytes = JsonRows.write_rows(&[row], COLUMNS).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"id": "1", "name": "Outdoor", "parent": ""}])
        );
    }
}
