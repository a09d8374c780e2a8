//! CSV import/export functionality

use csv::{ReaderBuilder, Writer};
use std::io::Read;
use tracing::debug;

use super::{fill_missing, normalize_header, Column, Row, RowReader, RowWriter, TransferFormat};
use crate::errors::TransferResult;

/// CSV rows with a single header line
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRows;

impl RowReader for CsvRows {
    fn format(&self) -> TransferFormat {
        TransferFormat::Csv
    }

    fn read_rows(&self, input: &mut dyn Read, columns: &[Column]) -> TransferResult<Vec<Row>> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| normalize_header(h, columns))
            .collect();
        debug!("CSV headers: {:?}", headers);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Row = headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect();
            fill_missing(&mut row, columns);
            rows.push(row);
        }

        Ok(rows)
    }
}

impl RowWriter for CsvRows {
    fn format(&self) -> TransferFormat {
        TransferFormat::Csv
    }

    fn write_rows(&self, rows: &[Row], columns: &[Column]) -> TransferResult<Vec<u8>> {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record(columns.iter().map(|c| c.label))?;

        for row in rows {
            wtr.write_record(
                columns
                    .iter()
                    .map(|c| row.get(c.key).map(String::as_str).unwrap_or("")),
            )?;
        }

        wtr.into_inner().map_err(|e| e.into_error().into())
    }
}
