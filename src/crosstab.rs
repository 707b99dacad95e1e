//! Two-way tabulations feeding the stacked bar charts.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
    chart::{AnalysisMode, CrossTabRow, apportion},
    stats::Quartiles,
    student::{Category, Student},
};

/// Tabulates `(primary, secondary)` pairs. Every row carries a column for each
/// secondary label seen anywhere, zero-filled, and rows are sorted by primary
/// label. Relative mode turns each cell into its share of the row.
pub fn cross_tabulate<I>(pairs: I, mode: AnalysisMode) -> Vec<CrossTabRow>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut table: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut secondaries = BTreeSet::new();
    for (primary, secondary) in pairs {
        *table
            .entry(primary)
            .or_default()
            .entry(secondary.clone())
            .or_insert(0) += 1;
        secondaries.insert(secondary);
    }

    table
        .into_iter()
        .map(|(name, counts)| {
            let row_counts = secondaries
                .iter()
                .map(|key| counts.get(key).copied().unwrap_or(0))
                .collect::<Vec<_>>();
            let row_values: Vec<f64> = match mode {
                AnalysisMode::Absolute => row_counts.iter().map(|&count| count as f64).collect(),
                AnalysisMode::Relative => apportion(&row_counts),
            };
            let values = secondaries.iter().cloned().zip(row_values).collect();
            CrossTabRow { name, values }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuartileBreakdown {
    pub field: Category,
    pub quartiles: Option<Quartiles>,
    pub rows: Vec<CrossTabRow>,
}

/// IAA quartile × `secondary`. Students with a zero IAA are left out of both
/// the boundaries and the table.
pub fn quartile_crosstab(
    students: &[&Student],
    secondary: Category,
    mode: AnalysisMode,
) -> QuartileBreakdown {
    let quartiles = Quartiles::from_students(students);
    let rows = match &quartiles {
        Some(bounds) => cross_tabulate(
            students
                .iter()
                .filter(|s| s.cumulative_index != 0.0)
                .map(|s| {
                    (
                        bounds.label(s.cumulative_index).to_string(),
                        s.category(secondary).into_owned(),
                    )
                }),
            mode,
        ),
        None => Vec::new(),
    };
    QuartileBreakdown {
        field: secondary,
        quartiles,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        stats::{Q1_LABEL, Q4_LABEL},
        testing::StudentBuilder,
    };

    fn pair(primary: &str, secondary: &str) -> (String, String) {
        (primary.to_string(), secondary.to_string())
    }

    #[test]
    fn rows_are_sorted_and_zero_filled() {
        let rows = cross_tabulate(
            vec![pair("b", "x"), pair("a", "y"), pair("b", "x"), pair("b", "y")],
            AnalysisMode::Absolute,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "a");
        assert_eq!(rows[0].values["x"], 0.0);
        assert_eq!(rows[0].values["y"], 1.0);
        assert_eq!(rows[1].values["x"], 2.0);
        assert_eq!(rows[1].values["y"], 1.0);
    }

    #[test]
    fn relative_cells_are_shares_of_their_row() {
        let rows = cross_tabulate(
            vec![pair("b", "x"), pair("b", "x"), pair("b", "y"), pair("a", "y")],
            AnalysisMode::Relative,
        );
        assert_eq!(rows[0].values["y"], 100.0);
        assert_eq!(rows[1].values["x"], 66.67);
        assert_eq!(rows[1].values["y"], 33.33);
    }

    #[test]
    fn relative_row_with_many_columns_totals_one_hundred() {
        let pairs: Vec<_> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|secondary| pair("row", secondary))
            .collect();
        let rows = cross_tabulate(pairs, AnalysisMode::Relative);
        assert_eq!(rows[0].values["a"], 16.67);
        assert_eq!(rows[0].values["f"], 16.66);
        assert!((rows[0].total() - 100.0).abs() <= 0.01);
    }

    #[test]
    fn quartile_table_excludes_zero_iaa() {
        let students = vec![
            StudentBuilder::new().gender("F").iaa(1000.0).build(),
            StudentBuilder::new().gender("M").iaa(2000.0).build(),
            StudentBuilder::new().gender("F").iaa(3000.0).build(),
            StudentBuilder::new().gender("M").iaa(9000.0).build(),
            StudentBuilder::new().gender("X").iaa(0.0).build(),
        ];
        let refs: Vec<&Student> = students.iter().collect();
        let breakdown = quartile_crosstab(&refs, Category::Gender, AnalysisMode::Absolute);
        let bounds = breakdown.quartiles.unwrap();
        assert_eq!((bounds.q1, bounds.q2, bounds.q3), (2000.0, 3000.0, 9000.0));
        let total: f64 = breakdown.rows.iter().map(CrossTabRow::total).sum();
        assert_eq!(total, 4.0);
        assert!(breakdown.rows.iter().all(|row| !row.values.contains_key("X")));
        assert_eq!(breakdown.rows[0].name, Q1_LABEL);
        assert_eq!(breakdown.rows[0].values["F"], 1.0);
        assert_eq!(breakdown.rows[0].values["M"], 1.0);
        assert!(breakdown.rows.iter().all(|row| row.name != Q4_LABEL));
    }

    #[test]
    fn quartile_table_empty_without_scores() {
        let students = vec![StudentBuilder::new().iaa(0.0).build()];
        let refs: Vec<&Student> = students.iter().collect();
        let breakdown = quartile_crosstab(&refs, Category::RaceColor, AnalysisMode::Relative);
        assert!(breakdown.quartiles.is_none());
        assert!(breakdown.rows.is_empty());
    }
}
