//! The typed student record and its categorical views.

use std::{borrow::Cow, fmt};

use clap::ValueEnum;
use serde::Serialize;

/// Placeholder for empty categorical cells.
pub const NOT_AVAILABLE: &str = "N/A";

pub const NATIONAL: &str = "Brasileiro(a)";
pub const FOREIGN: &str = "Estrangeiro(a)";

/// One valid row of the enrollment export. Built once by the record parser
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub course: String,
    pub status: String,
    pub gender: String,
    pub race_color: String,
    pub marital_status: String,
    pub nationality: String,
    pub entry_form: String,
    pub entry_category: String,
    pub birth_date: String,
    pub age: i32,
    pub entry_age: i32,
    pub origin: String,
    pub origin_state: String,
    pub origin_city: String,
    pub current_municipality: String,
    pub current_state: String,
    pub cumulative_index: f64,
    pub passed_credits_index: f64,
    pub entry_year: i32,
    pub entry_term: u8,
    pub entry_year_term: u32,
    pub semesters_enrolled: i32,
}

impl Student {
    pub fn category(&self, field: Category) -> Cow<'_, str> {
        match field {
            Category::Course => Cow::Borrowed(&self.course),
            Category::Status => Cow::Borrowed(&self.status),
            Category::Gender => Cow::Borrowed(&self.gender),
            Category::RaceColor => Cow::Borrowed(&self.race_color),
            Category::EntryForm => Cow::Borrowed(&self.entry_form),
            Category::EntryCategory => Cow::Borrowed(&self.entry_category),
            Category::MaritalStatus => Cow::Borrowed(&self.marital_status),
            Category::Nationality => Cow::Borrowed(&self.nationality),
            Category::EntryYearTerm => Cow::Owned(self.entry_year_term.to_string()),
            Category::OriginState => Cow::Borrowed(&self.origin_state),
            Category::OriginCity => Cow::Borrowed(&self.origin_city),
            Category::CurrentMunicipality => Cow::Borrowed(&self.current_municipality),
            Category::CurrentState => Cow::Borrowed(&self.current_state),
        }
    }

    /// Entry cohort as `(year, term)`, ordered chronologically.
    pub fn cohort(&self) -> (i32, u8) {
        (self.entry_year, self.entry_term)
    }
}

/// Categorical attributes that can be counted, ranked or filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Course,
    Status,
    Gender,
    #[value(alias = "race")]
    RaceColor,
    EntryForm,
    EntryCategory,
    MaritalStatus,
    Nationality,
    #[value(alias = "entry-term")]
    EntryYearTerm,
    OriginState,
    OriginCity,
    #[value(alias = "city")]
    CurrentMunicipality,
    #[value(alias = "state")]
    CurrentState,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Course => "Curso",
            Category::Status => "Situação",
            Category::Gender => "Gênero",
            Category::RaceColor => "Raça/Cor",
            Category::EntryForm => "Forma de Ingresso",
            Category::EntryCategory => "Categoria de Ingresso",
            Category::MaritalStatus => "Estado Civil",
            Category::Nationality => "Nacionalidade",
            Category::EntryYearTerm => "Semestre de Ingresso",
            Category::OriginState => "UF de Origem",
            Category::OriginCity => "Cidade de Origem",
            Category::CurrentMunicipality => "Município",
            Category::CurrentState => "UF",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
