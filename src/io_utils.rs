//! I/O utilities for reading enrollment exports.
//!
//! The producing system writes `;`-delimited text in a single-byte Latin
//! charset. Input is transcoded to UTF-8 on the fly with `encoding_rs_io`
//! before the `csv` reader sees it, so accented names survive intact. The
//! export never quotes fields, so quoting is disabled and a stray `"` stays
//! part of the cell.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use csv::Trim;
use encoding_rs::{Encoding, WINDOWS_1252};
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};

use crate::error::IngestError;

pub const EXPORT_DELIMITER: u8 = b';';
pub const DEFAULT_ENCODING_LABEL: &str = "latin1";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Resolves an encoding label. `latin1` and `iso-8859-1` map to windows-1252,
/// following the WHATWG encoding standard.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, IngestError> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| IngestError::Encoding(value.to_string())),
        None => Ok(WINDOWS_1252),
    }
}

pub fn read_input(path: &Path) -> Result<Vec<u8>, IngestError> {
    let mut reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(path)?))
    };
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

pub fn decoding_reader<R>(reader: R, encoding: &'static Encoding) -> DecodeReaderBytes<R, Vec<u8>>
where
    R: Read,
{
    DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(reader)
}

/// Opens a header-less reader over the export; the caller consumes the header
/// row itself so it can resolve columns before parsing records.
pub fn open_export_reader<R>(
    reader: R,
    encoding: &'static Encoding,
) -> csv::Reader<DecodeReaderBytes<R, Vec<u8>>>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(EXPORT_DELIMITER)
        .quoting(false)
        .trim(Trim::All)
        .flexible(true);
    builder.from_reader(decoding_reader(reader, encoding))
}
