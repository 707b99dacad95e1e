pub mod chart;
pub mod cli;
pub mod crosstab;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod frequency;
pub mod ingest;
pub mod io_utils;
pub mod palette;
pub mod record;
pub mod schema;
pub mod session;
pub mod stats;
pub mod student;
pub mod table;

#[cfg(test)]
mod testing;

use std::{env, sync::OnceLock, time::Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    chart::{AnalysisMode, ChartDatum, CrossTabRow},
    cli::{Cli, Commands, InputArgs, OutputFormat, QueryArgs},
    crosstab::{QuartileBreakdown, quartile_crosstab},
    debounce::Debouncer,
    filter::{ActiveFilter, FilterOptions, FilterSpec, active_filters, apply_filters},
    frequency::{CityComparison, category_counts, compare_city, state_distribution, top_n},
    ingest::{Dataset, IngestOptions, ingest_path},
    schema::SchemaVersion,
    session::{DashboardView, LoadOutcome, Session, ViewSettings, page},
    stats::{Summary, performance_trend},
    student::{Category, Student},
    table::{format_number, print_table},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("enrollment_insight", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Load(args) => handle_load(&args),
        Commands::Options(args) => handle_options(&args),
        Commands::Summary(args) => handle_summary(&args),
        Commands::Counts(args) => {
            let (dataset, _, spec) = load_selection(&args.query)?;
            let selection = apply_filters(dataset.students(), &spec);
            let data = category_counts(&selection, args.field, args.query.mode);
            emit_chart(&args.query, args.field.label(), &data)
        }
        Commands::Top(args) => {
            let (dataset, _, spec) = load_selection(&args.query)?;
            let selection = apply_filters(dataset.students(), &spec);
            let data = top_n(&selection, args.field, args.top, args.query.mode);
            emit_chart(&args.query, args.field.label(), &data)
        }
        Commands::Quartiles(args) => {
            let (dataset, _, spec) = load_selection(&args.query)?;
            let selection = apply_filters(dataset.students(), &spec);
            let breakdown = quartile_crosstab(&selection, args.by, args.query.mode);
            match args.query.input.format {
                OutputFormat::Json => print_json(&breakdown),
                OutputFormat::Table => {
                    print_breakdown(&breakdown);
                    Ok(())
                }
            }
        }
        Commands::Trend(args) => {
            let (dataset, _, spec) = load_selection(&args)?;
            let selection = apply_filters(dataset.students(), &spec);
            let data = performance_trend(&selection);
            match args.input.format {
                OutputFormat::Json => print_json(&data),
                OutputFormat::Table => {
                    print_table(
                        &headers(&["Entry term", "Mean IAA - IAP"]),
                        &chart_rows(&data),
                    );
                    Ok(())
                }
            }
        }
        Commands::States(args) => handle_states(&args),
        Commands::Students(args) => handle_students(&args),
        Commands::Dashboard(args) => handle_dashboard(&args),
    }
}

fn load_dataset(input: &InputArgs) -> Result<Dataset> {
    info!("Loading '{}'", input.input.display());
    load_raw(input).with_context(|| format!("Loading enrollment export {:?}", input.input))
}

fn load_selection(query: &QueryArgs) -> Result<(Dataset, FilterOptions, FilterSpec)> {
    let dataset = load_dataset(&query.input)?;
    let options = FilterOptions::from_students(dataset.students());
    let spec = query.filters.to_spec(&options);
    debug!("Filter spec: {spec:?}");
    Ok((dataset, options, spec))
}

fn handle_load(args: &InputArgs) -> Result<()> {
    let dataset = load_dataset(args)?;
    let report = dataset.report();
    match args.format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let rows = [
                ("Rows read", report.rows_read),
                ("Accepted", report.accepted),
                ("Rejected", report.rejected),
                (
                    "Birth dates outside the calendar",
                    report.calendar_invalid_birth_dates,
                ),
            ]
            .into_iter()
            .map(|(label, value)| vec![label.to_string(), value.to_string()])
            .collect::<Vec<_>>();
            print_table(&headers(&["Metric", "Value"]), &rows);
            Ok(())
        }
    }
}

fn handle_options(args: &InputArgs) -> Result<()> {
    let dataset = load_dataset(args)?;
    let options = FilterOptions::from_students(dataset.students());
    match args.format {
        OutputFormat::Json => print_json(&options),
        OutputFormat::Table => {
            let mut rows = vec![
                vec![
                    "IAA".to_string(),
                    format!(
                        "{}..{}",
                        format_number(options.cumulative_index.min),
                        format_number(options.cumulative_index.max)
                    ),
                ],
                vec![
                    "Idade".to_string(),
                    format!("{}..{}", options.age.min, options.age.max),
                ],
                vec![
                    "Ano Ingresso".to_string(),
                    format!("{}..{}", options.entry_year.min, options.entry_year.max),
                ],
            ];
            rows.extend(
                options
                    .values
                    .iter()
                    .map(|(field, values)| vec![field.to_string(), values.iter().join(", ")]),
            );
            print_table(&headers(&["Filter", "Values"]), &rows);
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOutput {
    summary: Summary,
    active_filters: Vec<ActiveFilter>,
}

fn handle_summary(args: &QueryArgs) -> Result<()> {
    let (dataset, options, spec) = load_selection(args)?;
    let selection = apply_filters(dataset.students(), &spec);
    let output = SummaryOutput {
        summary: Summary::from_students(&selection),
        active_filters: active_filters(&spec, &options),
    };
    match args.input.format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Table => {
            print_summary(&output.summary, &output.active_filters);
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatesOutput {
    states: Vec<ChartDatum>,
    city_comparison: Option<CityComparison>,
}

fn handle_states(args: &cli::StatesArgs) -> Result<()> {
    let (dataset, _, spec) = load_selection(&args.query)?;
    let selection = apply_filters(dataset.students(), &spec);
    let output = StatesOutput {
        states: state_distribution(&selection, args.query.mode),
        city_comparison: args
            .city
            .as_deref()
            .map(|city| compare_city(&selection, &args.home_state, city)),
    };
    match args.query.input.format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Table => {
            print_chart(Category::CurrentState.label(), args.query.mode, &output.states);
            if let Some(comparison) = &output.city_comparison {
                println!();
                print_comparison(comparison);
            }
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentPage<'a> {
    page: usize,
    total_pages: usize,
    total: usize,
    students: &'a [&'a Student],
}

fn handle_students(args: &cli::StudentsArgs) -> Result<()> {
    let (dataset, _, spec) = load_selection(&args.query)?;
    let selection = apply_filters(dataset.students(), &spec);
    let (current, total_pages, rows) = page(&selection, args.page);
    match args.query.input.format {
        OutputFormat::Json => print_json(&StudentPage {
            page: current,
            total_pages,
            total: selection.len(),
            students: rows,
        }),
        OutputFormat::Table => {
            let table_rows = rows
                .iter()
                .map(|s| {
                    vec![
                        s.course.clone(),
                        s.status.clone(),
                        s.gender.clone(),
                        s.age.to_string(),
                        format_number(s.cumulative_index / 1000.0),
                        s.entry_year_term.to_string(),
                        s.current_municipality.clone(),
                        s.current_state.clone(),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(
                &headers(&[
                    "Curso",
                    "Situação",
                    "Sexo",
                    "Idade",
                    "IAA",
                    "Ingresso",
                    "Município",
                    "UF",
                ]),
                &table_rows,
            );
            println!(
                "Page {current} of {total_pages} ({} student(s))",
                selection.len()
            );
            Ok(())
        }
    }
}

fn handle_dashboard(args: &cli::DashboardArgs) -> Result<()> {
    let settings = ViewSettings {
        top: args.top,
        home_state: args.home_state.clone(),
        comparison_city: args.city.clone(),
    };
    let mut session = Session::new(settings, Debouncer::default());
    let ticket = session.begin_load();
    let loaded = match session.complete_load(ticket, load_raw(&args.query.input)) {
        LoadOutcome::Applied { students } => students,
        LoadOutcome::Failed(err) => {
            return Err(err)
                .with_context(|| format!("Loading enrollment export {:?}", args.query.input.input));
        }
        LoadOutcome::Superseded => anyhow::bail!("Load superseded before it completed"),
    };
    debug!("Dashboard over {loaded} student(s)");
    if let Some(options) = session.options() {
        let spec = args.query.filters.to_spec(options);
        session.update_filters(spec, Instant::now());
        session.apply_pending();
    }
    session.set_mode(args.query.mode);
    let Some(view) = session.view() else {
        anyhow::bail!("No dataset loaded");
    };
    match args.query.input.format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Table => {
            print_dashboard(&view);
            Ok(())
        }
    }
}

fn load_raw(input: &InputArgs) -> std::result::Result<Dataset, error::IngestError> {
    let encoding = io_utils::resolve_encoding(Some(&input.input_encoding))?;
    let today = input.today.unwrap_or_else(|| Local::now().date_naive());
    let schema = if input.strict_schema {
        SchemaVersion::Extended
    } else {
        SchemaVersion::Base
    };
    debug!("Decoding as {} with today = {today}", encoding.name());
    let options = IngestOptions::new(today)
        .with_encoding(encoding)
        .with_schema(schema);
    ingest_path(&input.input, &options)
}

fn print_dashboard(view: &DashboardView) {
    print_summary(&view.summary, &view.active_filters);
    let charts = [
        (Category::Gender.label(), &view.gender),
        (Category::RaceColor.label(), &view.race_color),
        (Category::Status.label(), &view.status),
        (Category::CurrentMunicipality.label(), &view.top_cities),
        (Category::CurrentState.label(), &view.states),
    ];
    for (label, data) in charts {
        println!();
        print_chart(label, view.mode, data);
    }
    for breakdown in [&view.iaa_by_gender, &view.iaa_by_race] {
        println!();
        print_breakdown(breakdown);
    }
    println!();
    print_table(
        &headers(&["Entry term", "Mean IAA - IAP"]),
        &chart_rows(&view.performance_trend),
    );
    if let Some(comparison) = &view.city_comparison {
        println!();
        print_comparison(comparison);
    }
}

fn print_summary(summary: &Summary, active: &[ActiveFilter]) {
    let rows = vec![
        vec!["Total de Alunos".to_string(), summary.total.to_string()],
        vec!["Idade Média".to_string(), format_number(summary.mean_age)],
        vec![
            "Idade Média de Ingresso".to_string(),
            format_number(summary.mean_entry_age),
        ],
        vec![
            "IAA Médio".to_string(),
            format_number(summary.mean_cumulative_index / 1000.0),
        ],
        vec![
            "Semestres Cursados".to_string(),
            format_number(summary.mean_semesters_enrolled),
        ],
    ];
    print_table(&headers(&["Metric", "Value"]), &rows);
    if !active.is_empty() {
        println!("Active filters: {}", active.iter().join("; "));
    }
}

fn print_chart(label: &str, mode: AnalysisMode, data: &[ChartDatum]) {
    print_table(&headers(&[label, value_header(mode)]), &chart_rows(data));
}

fn print_breakdown(breakdown: &QuartileBreakdown) {
    let columns = breakdown
        .rows
        .iter()
        .flat_map(|row| row.values.keys())
        .unique()
        .cloned()
        .collect::<Vec<_>>();
    let mut header = vec![format!("IAA x {}", breakdown.field)];
    header.extend(columns.iter().cloned());
    let rows = breakdown
        .rows
        .iter()
        .map(|row: &CrossTabRow| {
            let mut cells = vec![row.name.clone()];
            cells.extend(
                columns
                    .iter()
                    .map(|key| format_number(row.values.get(key).copied().unwrap_or(0.0))),
            );
            cells
        })
        .collect::<Vec<_>>();
    print_table(&header, &rows);
    if let Some(quartiles) = &breakdown.quartiles {
        println!("{}", quartiles.describe());
    }
}

fn print_comparison(comparison: &CityComparison) {
    let rows = vec![
        vec![comparison.city.clone(), comparison.selected_city.to_string()],
        vec![
            format!("Outras cidades de {}", comparison.state),
            comparison.others.to_string(),
        ],
        vec![format!("Total {}", comparison.state), comparison.total.to_string()],
    ];
    print_table(&headers(&["Cidade", "Alunos"]), &rows);
}

fn emit_chart(query: &QueryArgs, label: &str, data: &[ChartDatum]) -> Result<()> {
    match query.input.format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table => {
            print_chart(label, query.mode, data);
            Ok(())
        }
    }
}

fn chart_rows(data: &[ChartDatum]) -> Vec<Vec<String>> {
    data.iter()
        .map(|d| vec![d.name.clone(), format_number(d.value)])
        .collect()
}

fn value_header(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Absolute => "Count",
        AnalysisMode::Relative => "%",
    }
}

fn headers(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing output")?;
    println!("{rendered}");
    Ok(())
}
