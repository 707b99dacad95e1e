//! Data contract shared by every aggregation.
//!
//! Charts consume flat `{ name, value }` lists or cross-tab rows whose
//! secondary labels become extra keys next to `name` once serialized.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "camelCase")]
pub enum AnalysisMode {
    /// Raw counts.
    #[default]
    Absolute,
    /// Percentages with two decimals.
    Relative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatum {
    pub name: String,
    pub value: f64,
}

impl ChartDatum {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One stacked bar: `name` is the primary label, `values` holds one entry per
/// secondary label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabRow {
    pub name: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl CrossTabRow {
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part` as a percentage of `whole`, rounded to two decimals. Zero when the
/// whole is empty.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

/// Percentages of `counts` against their own sum, two decimals each, summing
/// to exactly 100. Shares are floored to the hundredth and the leftover
/// hundredths go to the largest remainders, earlier entries first on ties.
pub fn apportion(counts: &[usize]) -> Vec<f64> {
    const SCALE: usize = 100 * 100;
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    let mut units = counts
        .iter()
        .map(|count| count * SCALE / total)
        .collect::<Vec<_>>();
    let leftover = SCALE - units.iter().sum::<usize>();
    let mut by_remainder = (0..counts.len()).collect::<Vec<_>>();
    by_remainder.sort_by_key(|&idx| std::cmp::Reverse(counts[idx] * SCALE % total));
    for &idx in by_remainder.iter().take(leftover) {
        units[idx] += 1;
    }
    units.into_iter().map(|unit| unit as f64 / 100.0).collect()
}

/// Expresses counts in the requested mode, normalizing against their own sum.
pub fn normalize(counts: Vec<(String, usize)>, mode: AnalysisMode) -> Vec<ChartDatum> {
    let values: Vec<f64> = match mode {
        AnalysisMode::Absolute => counts.iter().map(|(_, count)| *count as f64).collect(),
        AnalysisMode::Relative => {
            apportion(&counts.iter().map(|(_, count)| *count).collect::<Vec<_>>())
        }
    };
    counts
        .into_iter()
        .zip(values)
        .map(|((name, _), value)| ChartDatum::new(name, value))
        .collect()
}
