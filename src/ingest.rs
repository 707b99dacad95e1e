//! Ingestion pipeline: raw export bytes to an in-memory [`Dataset`].
//!
//! The whole file is decoded and split up front. A file without at least a
//! header and one data row fails with [`IngestError::EmptyFile`]; a header that
//! lacks a required column fails with [`IngestError::Schema`]; rows that fail
//! record parsing are dropped and counted, and if nothing survives the load
//! fails with [`IngestError::NoValidRecords`].

use std::path::Path;

use chrono::{Local, NaiveDate};
use encoding_rs::{Encoding, WINDOWS_1252};
use log::{debug, info};
use serde::Serialize;

use crate::{
    error::IngestError,
    io_utils,
    record::{DayStamp, parse_record},
    schema::{SchemaVersion, resolve_columns},
    student::Student,
};

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub encoding: &'static Encoding,
    /// Date treated as "now" for age and semester computations.
    pub today: NaiveDate,
    pub schema: SchemaVersion,
}

impl IngestOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            encoding: WINDOWS_1252,
            today,
            schema: SchemaVersion::Base,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub rows_read: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Accepted rows whose birth date has the right shape but is not a real
    /// calendar date (e.g. `31-02-2000`).
    pub calendar_invalid_birth_dates: usize,
}

/// The loaded student collection, in file order.
#[derive(Debug, Clone)]
pub struct Dataset {
    students: Vec<Student>,
    report: IngestReport,
}

impl Dataset {
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

pub fn ingest_path(path: &Path, options: &IngestOptions) -> Result<Dataset, IngestError> {
    let bytes = io_utils::read_input(path)?;
    ingest_bytes(&bytes, options)
}

pub fn ingest_bytes(bytes: &[u8], options: &IngestOptions) -> Result<Dataset, IngestError> {
    let mut reader = io_utils::open_export_reader(bytes, options.encoding);
    let records = reader
        .records()
        .collect::<Result<Vec<_>, csv::Error>>()?;
    let Some((header, rows)) = records.split_first() else {
        return Err(IngestError::EmptyFile);
    };
    if rows.is_empty() {
        return Err(IngestError::EmptyFile);
    }

    let headers = header.iter().map(str::to_string).collect::<Vec<_>>();
    let columns = resolve_columns(&headers, options.schema)?;

    let mut report = IngestReport {
        rows_read: rows.len(),
        ..IngestReport::default()
    };
    let mut students = Vec::with_capacity(rows.len());
    for (row_idx, record) in rows.iter().enumerate() {
        let fields = record.iter().collect::<Vec<_>>();
        match parse_record(&fields, &columns, options.today) {
            Some(student) => {
                if DayStamp::parse_birth_date(&student.birth_date)
                    .is_some_and(|birth| !birth.is_calendar_date())
                {
                    report.calendar_invalid_birth_dates += 1;
                }
                students.push(student);
            }
            None => {
                report.rejected += 1;
                let line = record
                    .position()
                    .map_or(row_idx as u64 + 2, |position| position.line());
                debug!("Skipping malformed row on line {line}");
            }
        }
    }
    report.accepted = students.len();

    if students.is_empty() {
        return Err(IngestError::NoValidRecords { rows: rows.len() });
    }
    info!(
        "Loaded {} student record(s) from {} row(s); {} rejected",
        report.accepted, report.rows_read, report.rejected
    );
    Ok(Dataset { students, report })
}
