//! Conversion of one raw export row into a [`Student`].
//!
//! Parsing is tolerant per row: any structural problem (short row, birth date
//! not shaped `DD-MM-YYYY`, entry key not shaped `YYYYT`) yields `None` and the
//! caller drops the row. Validation of the birth date is structural only, so a
//! date such as `31-02-2000` is accepted. Ages are computed after rolling the
//! overflow into the following month, so that date counts as 2 March 2000.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::{
    schema::{Column, ColumnMap},
    student::{FOREIGN, NATIONAL, NOT_AVAILABLE, Student},
};

const ORIGIN_SEPARATOR: &str = " - ";

fn birth_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{4}$").expect("valid birth date regex")
    })
}

fn entry_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{5}$").expect("valid entry key regex"))
}

fn bracket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[.*?\]").expect("valid bracket regex"))
}

/// A calendar position compared field by field; not required to be a real date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DayStamp {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Parses `DD-MM-YYYY`. Returns `None` unless the text matches the pattern.
    pub fn parse_birth_date(value: &str) -> Option<Self> {
        if !birth_date_pattern().is_match(value) {
            return None;
        }
        let day = value[0..2].parse().ok()?;
        let month = value[3..5].parse().ok()?;
        let year = value[6..10].parse().ok()?;
        Some(Self::new(year, month, day))
    }

    pub fn is_calendar_date(&self) -> bool {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).is_some()
    }

    /// The real date this stamp lands on once an out-of-range day or month
    /// carries into the next month or year. `None` past chrono's range.
    pub fn rolled_over(&self) -> Option<DayStamp> {
        let months = self.year * 12 + self.month as i32 - 1;
        let first = NaiveDate::from_ymd_opt(
            months.div_euclid(12),
            months.rem_euclid(12) as u32 + 1,
            1,
        )?;
        let date = first.checked_add_signed(chrono::Duration::days(i64::from(self.day) - 1))?;
        Some(DayStamp::from(date))
    }

    /// Whole years elapsed from `self` to `at`.
    pub fn years_until(&self, at: DayStamp) -> i32 {
        let mut years = at.year - self.year;
        if (at.month, at.day) < (self.month, self.day) {
            years -= 1;
        }
        years
    }
}

impl From<NaiveDate> for DayStamp {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month(), date.day())
    }
}

/// First day of the academic term: February for term 1, August for term 2.
pub fn entry_moment(entry_year: i32, entry_term: u8) -> DayStamp {
    let month = if entry_term == 1 { 2 } else { 8 };
    DayStamp::new(entry_year, month, 1)
}

/// Academic term a date falls in: January to June is term 1.
pub fn academic_term(date: NaiveDate) -> u8 {
    if date.month() <= 6 { 1 } else { 2 }
}

pub fn semesters_enrolled(entry_year: i32, entry_term: u8, today: NaiveDate) -> i32 {
    let elapsed = (today.year() - entry_year) * 2
        + (i32::from(academic_term(today)) - i32::from(entry_term))
        + 1;
    elapsed.max(1)
}

/// Parses an index with `,` accepted as the decimal separator. Anything that
/// does not yield a finite number becomes zero.
pub fn parse_index(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn clean_course_name(value: &str) -> String {
    let cleaned = bracket_pattern().replace_all(value, "");
    or_not_available(cleaned.trim())
}

/// Splits the combined `State - City` birthplace field.
pub fn split_origin(value: &str) -> (String, String) {
    if value.contains(ORIGIN_SEPARATOR) {
        let mut parts = value.split(ORIGIN_SEPARATOR).map(str::trim);
        let state = parts.next().unwrap_or_default().to_string();
        let city = parts.next().unwrap_or_default().to_string();
        (state, city)
    } else {
        (value.to_string(), NOT_AVAILABLE.to_string())
    }
}

pub fn normalize_nationality(value: &str) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else if value.eq_ignore_ascii_case("Brasil") {
        NATIONAL.to_string()
    } else {
        FOREIGN.to_string()
    }
}

fn or_not_available(value: &str) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

struct RowView<'a, S> {
    fields: &'a [S],
    columns: &'a ColumnMap,
}

impl<S: AsRef<str>> RowView<'_, S> {
    /// Trimmed cell for `column`; empty when the column is not in this export.
    fn get(&self, column: Column) -> &str {
        self.columns
            .index(column)
            .and_then(|idx| self.fields.get(idx))
            .map(|value| value.as_ref().trim())
            .unwrap_or("")
    }

    fn text(&self, column: Column) -> String {
        or_not_available(self.get(column))
    }
}

/// Builds a [`Student`] from one row, or `None` when the row must be dropped.
pub fn parse_record<S: AsRef<str>>(
    fields: &[S],
    columns: &ColumnMap,
    today: NaiveDate,
) -> Option<Student> {
    if fields.len() < columns.width() {
        return None;
    }
    let row = RowView { fields, columns };

    let birth_date = row.get(Column::BirthDate);
    let stamp = DayStamp::parse_birth_date(birth_date)?;
    let birth = stamp.rolled_over().unwrap_or(stamp);

    let entry_key = row.get(Column::EntryYearTerm);
    if !entry_key_pattern().is_match(entry_key) {
        return None;
    }
    let entry_year: i32 = entry_key[0..4].parse().ok()?;
    let entry_term: u8 = entry_key[4..5].parse().ok()?;
    if !(1..=2).contains(&entry_term) {
        return None;
    }
    let entry_year_term: u32 = entry_key.parse().ok()?;

    let origin = row.text(Column::Origin);
    let (origin_state, origin_city) = split_origin(&origin);

    Some(Student {
        course: clean_course_name(row.get(Column::CourseName)),
        status: row.text(Column::Status),
        gender: row.text(Column::Gender),
        race_color: row.text(Column::RaceColor),
        marital_status: row.text(Column::MaritalStatus),
        nationality: normalize_nationality(row.get(Column::Nationality)),
        entry_form: row.text(Column::EntryForm),
        entry_category: row.text(Column::EntryCategory),
        birth_date: birth_date.to_string(),
        age: birth.years_until(DayStamp::from(today)),
        entry_age: birth.years_until(entry_moment(entry_year, entry_term)),
        origin,
        origin_state,
        origin_city,
        current_municipality: row.text(Column::CurrentMunicipality),
        current_state: row.text(Column::CurrentState),
        cumulative_index: parse_index(row.get(Column::CumulativeIndex)),
        passed_credits_index: parse_index(row.get(Column::PassedCreditsIndex)),
        entry_year,
        entry_term,
        entry_year_term,
        semesters_enrolled: semesters_enrolled(entry_year, entry_term, today),
    })
}
