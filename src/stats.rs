//! Numeric summaries: IAA quartiles, headline averages and cohort trends.
//!
//! Quartile boundaries are plain order statistics of the ascending non-zero
//! IAA values, taken at positions `n/4`, `n/2` and `3n/4` (integer division)
//! with no interpolation. Chart labels are derived from these exact values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{chart::ChartDatum, student::Student};

pub const Q1_LABEL: &str = "Q1 (Inferior)";
pub const Q2_LABEL: &str = "Q2";
pub const Q3_LABEL: &str = "Q3";
pub const Q4_LABEL: &str = "Q4 (Superior)";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Boundaries over the non-zero IAA values; `None` when every value is zero.
    pub fn from_students(students: &[&Student]) -> Option<Self> {
        let mut values = students
            .iter()
            .map(|s| s.cumulative_index)
            .filter(|v| *v != 0.0)
            .collect::<Vec<_>>();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let n = values.len();
        Some(Self {
            q1: values[n / 4],
            q2: values[n / 2],
            q3: values[n * 3 / 4],
        })
    }

    pub fn label(&self, value: f64) -> &'static str {
        if value <= self.q1 {
            Q1_LABEL
        } else if value <= self.q2 {
            Q2_LABEL
        } else if value <= self.q3 {
            Q3_LABEL
        } else {
            Q4_LABEL
        }
    }

    /// Caption for quartile charts, IAA shown on the 0–10 scale.
    pub fn describe(&self) -> String {
        format!(
            "Q1: ≤ {:.2}, Q2: ≤ {:.2}, Q3: ≤ {:.2}",
            self.q1 / 1000.0,
            self.q2 / 1000.0,
            self.q3 / 1000.0
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub mean_age: f64,
    pub mean_entry_age: f64,
    pub mean_cumulative_index: f64,
    pub mean_semesters_enrolled: f64,
}

impl Summary {
    pub fn from_students(students: &[&Student]) -> Self {
        if students.is_empty() {
            return Self::default();
        }
        let n = students.len() as f64;
        let mean =
            |metric: fn(&Student) -> f64| students.iter().map(|s| metric(s)).sum::<f64>() / n;
        Self {
            total: students.len(),
            mean_age: mean(|s| f64::from(s.age)),
            mean_entry_age: mean(|s| f64::from(s.entry_age)),
            mean_cumulative_index: mean(|s| s.cumulative_index),
            mean_semesters_enrolled: mean(|s| f64::from(s.semesters_enrolled)),
        }
    }
}

/// Mean of `IAA − IAP` per entry cohort, oldest cohort first. Labels read
/// `YYYY.T`.
pub fn performance_trend(students: &[&Student]) -> Vec<ChartDatum> {
    let mut cohorts: BTreeMap<(i32, u8), (f64, usize)> = BTreeMap::new();
    for student in students {
        let entry = cohorts.entry(student.cohort()).or_insert((0.0, 0));
        entry.0 += student.cumulative_index - student.passed_credits_index;
        entry.1 += 1;
    }
    cohorts
        .into_iter()
        .map(|((year, term), (sum, count))| {
            ChartDatum::new(format!("{year}.{term}"), sum / count as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StudentBuilder;

    fn with_iaa(values: &[f64]) -> Vec<Student> {
        values
            .iter()
            .map(|v| StudentBuilder::new().iaa(*v).build())
            .collect()
    }

    #[test]
    fn quartiles_use_order_statistics_over_non_zero_values() {
        let students = with_iaa(&[
            0.0, 8000.0, 1000.0, 2000.0, 7000.0, 3000.0, 4000.0, 5000.0, 6000.0,
        ]);
        let refs: Vec<&Student> = students.iter().collect();
        let quartiles = Quartiles::from_students(&refs).unwrap();
        assert_eq!(
            quartiles,
            Quartiles {
                q1: 3000.0,
                q2: 5000.0,
                q3: 7000.0
            }
        );
        assert_eq!(quartiles.label(3000.0), Q1_LABEL);
        assert_eq!(quartiles.label(3000.5), Q2_LABEL);
        assert_eq!(quartiles.label(7000.0), Q3_LABEL);
        assert_eq!(quartiles.label(7001.0), Q4_LABEL);
        assert_eq!(quartiles.describe(), "Q1: ≤ 3.00, Q2: ≤ 5.00, Q3: ≤ 7.00");
    }

    #[test]
    fn quartiles_absent_without_non_zero_values() {
        let students = with_iaa(&[0.0, 0.0]);
        let refs: Vec<&Student> = students.iter().collect();
        assert!(Quartiles::from_students(&refs).is_none());
        assert!(Quartiles::from_students(&[]).is_none());
    }

    #[test]
    fn single_value_is_every_boundary() {
        let students = with_iaa(&[4200.0]);
        let refs: Vec<&Student> = students.iter().collect();
        let quartiles = Quartiles::from_students(&refs).unwrap();
        assert_eq!((quartiles.q1, quartiles.q2, quartiles.q3), (4200.0, 4200.0, 4200.0));
    }

    #[test]
    fn summary_averages_each_metric() {
        let students = vec![
            StudentBuilder::new().age(20).entry_age(18).iaa(6000.0).semesters(4).build(),
            StudentBuilder::new().age(30).entry_age(21).iaa(8000.0).semesters(1).build(),
        ];
        let refs: Vec<&Student> = students.iter().collect();
        let summary = Summary::from_students(&refs);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.mean_age, 25.0);
        assert_eq!(summary.mean_entry_age, 19.5);
        assert_eq!(summary.mean_cumulative_index, 7000.0);
        assert_eq!(summary.mean_semesters_enrolled, 2.5);
        assert_eq!(Summary::from_students(&[]), Summary::default());
    }

    #[test]
    fn trend_groups_by_year_and_term_chronologically() {
        let students = vec![
            StudentBuilder::new().entry(2022, 2).iaa(7000.0).iap(6000.0).build(),
            StudentBuilder::new().entry(2021, 1).iaa(5000.0).iap(5000.0).build(),
            StudentBuilder::new().entry(2022, 1).iaa(8000.0).iap(7500.0).build(),
            StudentBuilder::new().entry(2022, 2).iaa(6000.0).iap(6000.0).build(),
        ];
        let refs: Vec<&Student> = students.iter().collect();
        assert_eq!(
            performance_trend(&refs),
            vec![
                ChartDatum::new("2021.1", 0.0),
                ChartDatum::new("2022.1", 500.0),
                ChartDatum::new("2022.2", 500.0),
            ]
        );
    }
}
