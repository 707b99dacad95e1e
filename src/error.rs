//! Fatal ingestion failures.
//!
//! Row-level problems never show up here: a malformed row is dropped by the
//! record parser and only counted in the [`IngestReport`](crate::ingest::IngestReport).

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Required column not found: {column}")]
    Schema { column: String },
    #[error("CSV file is empty or has no data rows")]
    EmptyFile,
    #[error(
        "No valid records found in {rows} data row(s); check the date and entry-term formats"
    )]
    NoValidRecords { rows: usize },
    #[error("Unknown encoding '{0}'")]
    Encoding(String),
    #[error("Reading CSV input")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IngestError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        IngestError::Schema {
            column: column.into(),
        }
    }
}
