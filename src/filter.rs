//! Filter engine.
//!
//! A [`FilterSpec`] combines three closed range constraints with one set
//! constraint per filterable category. A student passes when every constraint
//! accepts it; an empty set accepts everything. Selection is stable: the
//! output keeps the input order.

use std::{collections::BTreeMap, collections::BTreeSet, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::student::{Category, Student};

/// Categories exposed as filters, in panel order.
pub const FILTERABLE: [Category; 9] = [
    Category::Course,
    Category::Status,
    Category::Gender,
    Category::RaceColor,
    Category::EntryForm,
    Category::EntryCategory,
    Category::MaritalStatus,
    Category::Nationality,
    Category::EntryYearTerm,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeConstraint<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> RangeConstraint<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// True when this range excludes part of `initial`.
    pub fn narrows(&self, initial: &RangeConstraint<T>) -> bool {
        self.min > initial.min || self.max < initial.max
    }
}

/// Inclusion set for one categorical field. Empty means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetConstraint {
    selected: BTreeSet<String>,
}

impl SetConstraint {
    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(value)
    }

    pub fn is_active(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn select(&mut self, value: impl Into<String>) {
        self.selected.insert(value.into());
    }

    pub fn deselect(&mut self, value: &str) {
        self.selected.remove(value);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub cumulative_index: RangeConstraint<f64>,
    pub age: RangeConstraint<i32>,
    pub entry_year: RangeConstraint<i32>,
    pub course: SetConstraint,
    pub status: SetConstraint,
    pub gender: SetConstraint,
    pub race_color: SetConstraint,
    pub entry_form: SetConstraint,
    pub entry_category: SetConstraint,
    pub marital_status: SetConstraint,
    pub nationality: SetConstraint,
    pub entry_year_term: SetConstraint,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            cumulative_index: RangeConstraint::new(f64::NEG_INFINITY, f64::INFINITY),
            age: RangeConstraint::new(i32::MIN, i32::MAX),
            entry_year: RangeConstraint::new(i32::MIN, i32::MAX),
            course: SetConstraint::default(),
            status: SetConstraint::default(),
            gender: SetConstraint::default(),
            race_color: SetConstraint::default(),
            entry_form: SetConstraint::default(),
            entry_category: SetConstraint::default(),
            marital_status: SetConstraint::default(),
            nationality: SetConstraint::default(),
            entry_year_term: SetConstraint::default(),
        }
    }
}

impl FilterSpec {
    pub fn set(&self, field: Category) -> Option<&SetConstraint> {
        match field {
            Category::Course => Some(&self.course),
            Category::Status => Some(&self.status),
            Category::Gender => Some(&self.gender),
            Category::RaceColor => Some(&self.race_color),
            Category::EntryForm => Some(&self.entry_form),
            Category::EntryCategory => Some(&self.entry_category),
            Category::MaritalStatus => Some(&self.marital_status),
            Category::Nationality => Some(&self.nationality),
            Category::EntryYearTerm => Some(&self.entry_year_term),
            Category::OriginState
            | Category::OriginCity
            | Category::CurrentMunicipality
            | Category::CurrentState => None,
        }
    }

    pub fn set_mut(&mut self, field: Category) -> Option<&mut SetConstraint> {
        match field {
            Category::Course => Some(&mut self.course),
            Category::Status => Some(&mut self.status),
            Category::Gender => Some(&mut self.gender),
            Category::RaceColor => Some(&mut self.race_color),
            Category::EntryForm => Some(&mut self.entry_form),
            Category::EntryCategory => Some(&mut self.entry_category),
            Category::MaritalStatus => Some(&mut self.marital_status),
            Category::Nationality => Some(&mut self.nationality),
            Category::EntryYearTerm => Some(&mut self.entry_year_term),
            Category::OriginState
            | Category::OriginCity
            | Category::CurrentMunicipality
            | Category::CurrentState => None,
        }
    }

    pub fn matches(&self, student: &Student) -> bool {
        self.cumulative_index.contains(student.cumulative_index)
            && self.age.contains(student.age)
            && self.entry_year.contains(student.entry_year)
            && FILTERABLE.iter().all(|&field| {
                self.set(field)
                    .is_none_or(|set| set.matches(&student.category(field)))
            })
    }

    /// Resets every constraint to the unconstrained state for `options`.
    pub fn clear(&mut self, options: &FilterOptions) {
        *self = options.initial_spec();
    }

    pub fn remove(&mut self, filter: &ActiveFilter, options: &FilterOptions) {
        match filter {
            ActiveFilter::Range { field, .. } => match field {
                RangeField::CumulativeIndex => self.cumulative_index = options.cumulative_index,
                RangeField::Age => self.age = options.age,
                RangeField::EntryYear => self.entry_year = options.entry_year,
            },
            ActiveFilter::Value { field, value } => {
                if let Some(set) = self.set_mut(*field) {
                    set.deselect(value);
                }
            }
        }
    }
}

/// Students passing `spec`, in their original order.
pub fn apply_filters<'a>(students: &'a [Student], spec: &FilterSpec) -> Vec<&'a Student> {
    students.iter().filter(|s| spec.matches(s)).collect()
}

/// Slider bounds and picker values derived from a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub cumulative_index: RangeConstraint<f64>,
    pub age: RangeConstraint<i32>,
    pub entry_year: RangeConstraint<i32>,
    pub values: BTreeMap<Category, Vec<String>>,
}

impl FilterOptions {
    pub fn from_students(students: &[Student]) -> Self {
        let defaults = FilterSpec::default();
        let cumulative_index = min_max(students.iter().map(|s| s.cumulative_index))
            .map(|(min, max)| RangeConstraint::new(min.floor(), max.ceil()))
            .unwrap_or(defaults.cumulative_index);
        let age = min_max(students.iter().map(|s| s.age))
            .map(|(min, max)| RangeConstraint::new(min, max))
            .unwrap_or(defaults.age);
        let entry_year = min_max(students.iter().map(|s| s.entry_year))
            .map(|(min, max)| RangeConstraint::new(min, max))
            .unwrap_or(defaults.entry_year);
        let values = FILTERABLE
            .iter()
            .map(|&field| {
                let distinct = students
                    .iter()
                    .map(|s| s.category(field).into_owned())
                    .collect::<BTreeSet<_>>();
                (field, distinct.into_iter().collect())
            })
            .collect();
        Self {
            cumulative_index,
            age,
            entry_year,
            values,
        }
    }

    /// The spec that lets every student of the dataset through.
    pub fn initial_spec(&self) -> FilterSpec {
        FilterSpec {
            cumulative_index: self.cumulative_index,
            age: self.age,
            entry_year: self.entry_year,
            ..FilterSpec::default()
        }
    }
}

fn min_max<T, I>(values: I) -> Option<(T, T)>
where
    T: PartialOrd + Copy,
    I: IntoIterator<Item = T>,
{
    values.into_iter().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((
            if value < min { value } else { min },
            if value > max { value } else { max },
        )),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RangeField {
    CumulativeIndex,
    Age,
    EntryYear,
}

impl fmt::Display for RangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RangeField::CumulativeIndex => "IAA",
            RangeField::Age => "Idade",
            RangeField::EntryYear => "Ano Ingresso",
        })
    }
}

/// One constraint that currently narrows the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActiveFilter {
    Range { field: RangeField, min: f64, max: f64 },
    Value { field: Category, value: String },
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveFilter::Range { field, min, max } => write!(f, "{field}: {min} - {max}"),
            ActiveFilter::Value { field, value } => write!(f, "{field}: {value}"),
        }
    }
}

pub fn active_filters(spec: &FilterSpec, options: &FilterOptions) -> Vec<ActiveFilter> {
    let mut active = Vec::new();
    if spec.cumulative_index.narrows(&options.cumulative_index) {
        active.push(ActiveFilter::Range {
            field: RangeField::CumulativeIndex,
            min: spec.cumulative_index.min,
            max: spec.cumulative_index.max,
        });
    }
    if spec.entry_year.narrows(&options.entry_year) {
        active.push(ActiveFilter::Range {
            field: RangeField::EntryYear,
            min: f64::from(spec.entry_year.min),
            max: f64::from(spec.entry_year.max),
        });
    }
    if spec.age.narrows(&options.age) {
        active.push(ActiveFilter::Range {
            field: RangeField::Age,
            min: f64::from(spec.age.min),
            max: f64::from(spec.age.max),
        });
    }
    for field in FILTERABLE {
        if let Some(set) = spec.set(field) {
            active.extend(set.iter().map(|value| ActiveFilter::Value {
                field,
                value: value.to_string(),
            }));
        }
    }
    active
}

/// Range bounds as typed on the command line: `MIN:MAX`, `MIN:` or `:MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> RangeBounds<T> {
    pub fn resolve(&self, initial: RangeConstraint<T>) -> RangeConstraint<T> {
        RangeConstraint::new(
            self.min.unwrap_or(initial.min),
            self.max.unwrap_or(initial.max),
        )
    }
}

impl<T> FromStr for RangeBounds<T>
where
    T: FromStr + PartialOrd + Copy,
{
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let (left, right) = trimmed
            .split_once(':')
            .ok_or_else(|| anyhow!("Range '{trimmed}' must look like MIN:MAX"))?;
        let bound = |part: &str| -> Result<Option<T>> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            part.replacen(',', ".", 1)
                .parse::<T>()
                .map(Some)
                .map_err(|_| anyhow!("Invalid range bound '{part}' in '{trimmed}'"))
        };
        let bounds = RangeBounds {
            min: bound(left)?,
            max: bound(right)?,
        };
        if let (Some(min), Some(max)) = (bounds.min, bounds.max)
            && min > max
        {
            return Err(anyhow!("Range '{trimmed}' has its minimum above its maximum"));
        }
        Ok(bounds)
    }
}
