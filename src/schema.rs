//! Header resolution for enrollment exports.
//!
//! The export does not guarantee column order, so every logical [`Column`] is
//! located by name in the header row. Matching is case-insensitive and exact:
//! `Situacao` never binds `SituacaoAnterior`.
//!
//! Two schema generations exist. The base export carries eleven columns; later
//! exports add entry category, marital status, nationality and the IAP index.
//! [`SchemaVersion::Base`] requires only the base set and binds the extended
//! columns opportunistically, while [`SchemaVersion::Extended`] requires all of
//! them.

use std::{collections::BTreeMap, fmt};

use log::debug;
use serde::Serialize;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Column {
    CourseName,
    Status,
    Gender,
    RaceColor,
    BirthDate,
    Origin,
    EntryForm,
    CumulativeIndex,
    CurrentMunicipality,
    CurrentState,
    EntryYearTerm,
    EntryCategory,
    MaritalStatus,
    Nationality,
    PassedCreditsIndex,
}

impl Column {
    pub const BASE: [Column; 11] = [
        Column::CourseName,
        Column::Status,
        Column::Gender,
        Column::RaceColor,
        Column::BirthDate,
        Column::Origin,
        Column::EntryForm,
        Column::CumulativeIndex,
        Column::CurrentMunicipality,
        Column::CurrentState,
        Column::EntryYearTerm,
    ];

    pub const EXTENDED: [Column; 4] = [
        Column::EntryCategory,
        Column::MaritalStatus,
        Column::Nationality,
        Column::PassedCreditsIndex,
    ];

    /// Header label used by the export.
    pub const fn header(self) -> &'static str {
        match self {
            Column::CourseName => "nomeCurso",
            Column::Status => "Situacao",
            Column::Gender => "Sexo",
            Column::RaceColor => "racaCor",
            Column::BirthDate => "dataNascimento",
            Column::Origin => "Naturalidade",
            Column::EntryForm => "formaIngresso",
            Column::CumulativeIndex => "IAA-indiceAproveitamentoAcumulado",
            Column::CurrentMunicipality => "MunicipioSG",
            Column::CurrentState => "UFSG",
            Column::EntryYearTerm => "anoSemestreIngresso",
            Column::EntryCategory => "categoriaIngresso",
            Column::MaritalStatus => "estadoCivil",
            Column::Nationality => "Nacionalidade",
            Column::PassedCreditsIndex => "IAP-indiceAproveitamentoAprovacoes",
        }
    }

    fn matches(self, header: &str) -> bool {
        header.trim().to_lowercase() == self.header().to_lowercase()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaVersion {
    #[default]
    Base,
    Extended,
}

impl SchemaVersion {
    pub fn required(self) -> Vec<Column> {
        match self {
            SchemaVersion::Base => Column::BASE.to_vec(),
            SchemaVersion::Extended => Column::BASE
                .iter()
                .chain(Column::EXTENDED.iter())
                .copied()
                .collect(),
        }
    }

    pub fn optional(self) -> &'static [Column] {
        match self {
            SchemaVersion::Base => &Column::EXTENDED,
            SchemaVersion::Extended => &[],
        }
    }
}

/// Physical positions of the logical columns within one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: BTreeMap<Column, usize>,
    width: usize,
}

impl ColumnMap {
    pub fn index(&self, column: Column) -> Option<usize> {
        self.indices.get(&column).copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.indices.contains_key(&column)
    }

    /// Number of columns in the header; rows shorter than this are rejected.
    pub fn width(&self) -> usize {
        self.width
    }
}

pub fn resolve_columns(
    headers: &[String],
    version: SchemaVersion,
) -> Result<ColumnMap, IngestError> {
    let mut indices = BTreeMap::new();
    for column in version.required() {
        let idx = find_column(headers, column)
            .ok_or_else(|| IngestError::missing_column(column.header()))?;
        indices.insert(column, idx);
    }
    for &column in version.optional() {
        match find_column(headers, column) {
            Some(idx) => {
                indices.insert(column, idx);
            }
            None => debug!("Optional column '{column}' not present; defaulting its values"),
        }
    }
    debug!("Resolved column indices: {indices:?}");
    Ok(ColumnMap {
        indices,
        width: headers.len(),
    })
}

fn find_column(headers: &[String], column: Column) -> Option<usize> {
    headers.iter().position(|header| column.matches(header))
}
