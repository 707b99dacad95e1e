use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::{
    chart::AnalysisMode,
    filter::{FilterOptions, FilterSpec, RangeBounds},
    frequency::{DEFAULT_HOME_STATE, DEFAULT_TOP},
    io_utils::DEFAULT_ENCODING_LABEL,
    student::Category,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Explore university enrollment exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load an export and report how many rows were accepted
    Load(InputArgs),
    /// List slider bounds and the selectable values of every filter
    Options(InputArgs),
    /// Headline averages for the filtered students
    Summary(QueryArgs),
    /// Counts per value of a categorical field
    Counts(CountsArgs),
    /// Most frequent values of a categorical field
    Top(TopArgs),
    /// IAA quartiles crossed with a categorical field
    Quartiles(QuartilesArgs),
    /// Mean IAA minus IAP per entry cohort
    Trend(QueryArgs),
    /// Students per current state, with an optional city comparison
    States(StatesArgs),
    /// Paginated listing of the filtered students
    Students(StudentsArgs),
    /// Every dashboard chart for the filtered students
    Dashboard(DashboardArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Enrollment export to read (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Character encoding of the export
    #[arg(long = "input-encoding", default_value = DEFAULT_ENCODING_LABEL)]
    pub input_encoding: String,
    /// Date used as "now" for ages and semesters (YYYY-MM-DD or DD-MM-YYYY)
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,
    /// Require the later export columns (category, marital status, nationality, IAP)
    #[arg(long = "strict-schema")]
    pub strict_schema: bool,
    /// Output rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// IAA range as MIN:MAX (either side may be omitted)
    #[arg(long)]
    pub iaa: Option<RangeBounds<f64>>,
    /// Age range as MIN:MAX
    #[arg(long)]
    pub age: Option<RangeBounds<i32>>,
    /// Entry year range as MIN:MAX
    #[arg(long)]
    pub year: Option<RangeBounds<i32>>,
    /// Keep only these courses (repeatable)
    #[arg(long, action = ArgAction::Append)]
    pub course: Vec<String>,
    /// Keep only these enrollment statuses
    #[arg(long, action = ArgAction::Append)]
    pub status: Vec<String>,
    #[arg(long, action = ArgAction::Append)]
    pub gender: Vec<String>,
    #[arg(long, action = ArgAction::Append)]
    pub race: Vec<String>,
    #[arg(long = "entry-form", action = ArgAction::Append)]
    pub entry_form: Vec<String>,
    #[arg(long = "entry-category", action = ArgAction::Append)]
    pub entry_category: Vec<String>,
    #[arg(long = "marital-status", action = ArgAction::Append)]
    pub marital_status: Vec<String>,
    #[arg(long, action = ArgAction::Append)]
    pub nationality: Vec<String>,
    /// Entry year-term keys such as 20231
    #[arg(long = "entry-term", action = ArgAction::Append)]
    pub entry_term: Vec<String>,
}

impl FilterArgs {
    /// Builds the spec on top of the dataset's initial ranges.
    pub fn to_spec(&self, options: &FilterOptions) -> FilterSpec {
        let mut spec = options.initial_spec();
        if let Some(bounds) = &self.iaa {
            spec.cumulative_index = bounds.resolve(options.cumulative_index);
        }
        if let Some(bounds) = &self.age {
            spec.age = bounds.resolve(options.age);
        }
        if let Some(bounds) = &self.year {
            spec.entry_year = bounds.resolve(options.entry_year);
        }
        let selections = [
            (Category::Course, &self.course),
            (Category::Status, &self.status),
            (Category::Gender, &self.gender),
            (Category::RaceColor, &self.race),
            (Category::EntryForm, &self.entry_form),
            (Category::EntryCategory, &self.entry_category),
            (Category::MaritalStatus, &self.marital_status),
            (Category::Nationality, &self.nationality),
            (Category::EntryYearTerm, &self.entry_term),
        ];
        for (field, values) in selections {
            if let Some(set) = spec.set_mut(field) {
                for value in values {
                    set.select(value.trim());
                }
            }
        }
        spec
    }
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Report raw counts or percentages
    #[arg(long, value_enum, default_value_t = AnalysisMode::Absolute)]
    pub mode: AnalysisMode,
}

#[derive(Debug, Args)]
pub struct CountsArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Field to group by
    #[arg(long, value_enum)]
    pub field: Category,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Field to rank
    #[arg(long, value_enum, default_value_t = Category::CurrentMunicipality)]
    pub field: Category,
    /// Number of entries to keep (0 keeps all)
    #[arg(long, default_value_t = DEFAULT_TOP)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct QuartilesArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Field crossed with the IAA quartile
    #[arg(long, value_enum, default_value_t = Category::Gender)]
    pub by: Category,
}

#[derive(Debug, Args)]
pub struct StatesArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// City compared against the rest of the home state
    #[arg(long)]
    pub city: Option<String>,
    /// State whose municipalities the comparison covers
    #[arg(long = "home-state", default_value = DEFAULT_HOME_STATE)]
    pub home_state: String,
}

#[derive(Debug, Args)]
pub struct StudentsArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// City compared against the rest of the home state
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long = "home-state", default_value = DEFAULT_HOME_STATE)]
    pub home_state: String,
    /// Number of cities in the ranking
    #[arg(long, default_value_t = DEFAULT_TOP)]
    pub top: usize,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| anyhow!("Failed to parse '{trimmed}' as date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn input_encoding_defaults_to_latin1() {
        let cli = Cli::try_parse_from(["enrollment-insight", "load", "-i", "export.csv"])
            .expect("parse");
        let Commands::Load(args) = cli.command else {
            panic!("expected load command");
        };
        assert_eq!(args.input_encoding, DEFAULT_ENCODING_LABEL);
        assert_eq!(
            crate::io_utils::resolve_encoding(Some(&args.input_encoding)).unwrap(),
            encoding_rs::WINDOWS_1252
        );
    }

    #[test]
    fn parse_date_accepts_iso_and_brazilian_order() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(parse_date("2025-03-10").unwrap(), expected);
        assert_eq!(parse_date("10-03-2025").unwrap(), expected);
        assert_eq!(parse_date("10/03/2025").unwrap(), expected);
        assert!(parse_date("March 10").is_err());
    }

    #[test]
    fn filter_args_parse_into_spec() {
        let cli = Cli::try_parse_from([
            "enrollment-insight",
            "summary",
            "-i",
            "export.csv",
            "--age",
            "18:",
            "--gender",
            "F",
            "--gender",
            "M",
            "--entry-term",
            "20231",
        ])
        .expect("parse args");
        let Commands::Summary(args) = cli.command else {
            panic!("expected summary command");
        };
        let options = FilterOptions::from_students(&[]);
        let spec = args.filters.to_spec(&options);
        assert_eq!(spec.age.min, 18);
        assert_eq!(spec.age.max, i32::MAX);
        assert_eq!(spec.gender.iter().collect::<Vec<_>>(), vec!["F", "M"]);
        assert!(spec.entry_year_term.matches("20231"));
        assert!(!spec.course.is_active());
    }
}
