//! Category counts, top-N rankings and the geographic distributions.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    chart::{AnalysisMode, ChartDatum, normalize, percent},
    student::{Category, NOT_AVAILABLE, Student},
};

pub const DEFAULT_TOP: usize = 7;
pub const DEFAULT_HOME_STATE: &str = "SC";

/// Federative units of Brazil, as used by the current-address state column.
pub const BRAZILIAN_STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Group-counts `field`, most frequent first with ties broken by label.
pub fn count_by(students: &[&Student], field: Category) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for student in students {
        *counts.entry(student.category(field).into_owned()).or_insert(0) += 1;
    }
    let mut items = counts.into_iter().collect::<Vec<_>>();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items
}

/// Counts per label; relative mode reports each share of the whole collection.
pub fn category_counts(
    students: &[&Student],
    field: Category,
    mode: AnalysisMode,
) -> Vec<ChartDatum> {
    normalize(count_by(students, field), mode)
}

/// The `top` most frequent labels. In relative mode percentages are taken
/// against the sum of the labels shown, not the whole collection.
pub fn top_n(
    students: &[&Student],
    field: Category,
    top: usize,
    mode: AnalysisMode,
) -> Vec<ChartDatum> {
    let mut items = count_by(students, field);
    if top > 0 && items.len() > top {
        items.truncate(top);
    }
    normalize(items, mode)
}

/// Students per current state, restricted to valid federative units. Relative
/// mode divides by the whole collection, so students without a valid state
/// still weigh in the denominator.
pub fn state_distribution(students: &[&Student], mode: AnalysisMode) -> Vec<ChartDatum> {
    let total = students.len();
    count_by(students, Category::CurrentState)
        .into_iter()
        .filter(|(state, _)| BRAZILIAN_STATES.contains(&state.as_str()))
        .map(|(state, count)| match mode {
            AnalysisMode::Absolute => ChartDatum::new(state, count as f64),
            AnalysisMode::Relative => ChartDatum::new(state, percent(count, total)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityComparison {
    pub state: String,
    pub city: String,
    pub total: usize,
    pub selected_city: usize,
    pub others: usize,
}

/// Splits the students living in `home_state` between `city` and the rest.
/// State and city names compare case-insensitively.
pub fn compare_city(students: &[&Student], home_state: &str, city: &str) -> CityComparison {
    let city_lower = city.to_lowercase();
    let mut comparison = CityComparison {
        state: home_state.to_string(),
        city: city.to_string(),
        total: 0,
        selected_city: 0,
        others: 0,
    };
    for student in students
        .iter()
        .filter(|s| {
            s.current_state != NOT_AVAILABLE && s.current_state.eq_ignore_ascii_case(home_state)
        })
    {
        comparison.total += 1;
        if student.current_municipality.to_lowercase() == city_lower {
            comparison.selected_city += 1;
        } else {
            comparison.others += 1;
        }
    }
    comparison
}
