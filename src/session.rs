//! Dashboard session: the one in-memory dataset plus everything derived from
//! it.
//!
//! Loads are tracked by generation. [`Session::begin_load`] hands out a ticket
//! and any ticket older than the latest one is ignored on completion, so a
//! slow read that resolves after a newer selection never replaces it. Filter
//! edits pass through a [`Debouncer`] and only the last spec of a burst is
//! applied. A new dataset replaces the old one wholesale, together with its
//! filter options and color assignments.

use std::{collections::BTreeMap, time::Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    chart::{AnalysisMode, ChartDatum},
    crosstab::{QuartileBreakdown, quartile_crosstab},
    debounce::Debouncer,
    error::IngestError,
    filter::{ActiveFilter, FilterOptions, FilterSpec, active_filters, apply_filters},
    frequency::{
        CityComparison, DEFAULT_HOME_STATE, DEFAULT_TOP, category_counts, compare_city,
        state_distribution, top_n,
    },
    ingest::Dataset,
    palette::ColorAssigner,
    stats::{Summary, performance_trend},
    student::{Category, Student},
};

pub const ROWS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    pub top: usize,
    pub home_state: String,
    pub comparison_city: Option<String>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP,
            home_state: DEFAULT_HOME_STATE.to_string(),
            comparison_city: None,
        }
    }
}

/// Everything the presentation layer renders for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub mode: AnalysisMode,
    pub summary: Summary,
    pub active_filters: Vec<ActiveFilter>,
    pub gender: Vec<ChartDatum>,
    pub race_color: Vec<ChartDatum>,
    pub status: Vec<ChartDatum>,
    pub top_cities: Vec<ChartDatum>,
    pub iaa_by_gender: QuartileBreakdown,
    pub iaa_by_race: QuartileBreakdown,
    pub performance_trend: Vec<ChartDatum>,
    pub states: Vec<ChartDatum>,
    pub city_comparison: Option<CityComparison>,
    pub colors: BTreeMap<String, String>,
}

/// Computes every chart for an already filtered selection.
pub fn build_view(
    students: &[&Student],
    active: Vec<ActiveFilter>,
    mode: AnalysisMode,
    settings: &ViewSettings,
    colors: &mut ColorAssigner,
) -> DashboardView {
    let gender = category_counts(students, Category::Gender, mode);
    let race_color = category_counts(students, Category::RaceColor, mode);
    let status = category_counts(students, Category::Status, mode);
    let top_cities = top_n(students, Category::CurrentMunicipality, settings.top, mode);
    let iaa_by_gender = quartile_crosstab(students, Category::Gender, mode);
    let iaa_by_race = quartile_crosstab(students, Category::RaceColor, mode);
    let states = state_distribution(students, mode);
    let city_comparison = settings
        .comparison_city
        .as_deref()
        .map(|city| compare_city(students, &settings.home_state, city));

    let flat_labels = [&gender, &race_color, &status, &top_cities, &states]
        .into_iter()
        .flat_map(|data| data.iter().map(|d| d.name.as_str()));
    let breakdown_labels = [&iaa_by_gender, &iaa_by_race]
        .into_iter()
        .flat_map(|breakdown| breakdown.rows.iter())
        .flat_map(|row| row.values.keys().map(String::as_str));
    let colors = colors.legend(flat_labels.chain(breakdown_labels));

    DashboardView {
        mode,
        summary: Summary::from_students(students),
        active_filters: active,
        gender,
        race_color,
        status,
        top_cities,
        iaa_by_gender,
        iaa_by_race,
        performance_trend: performance_trend(students),
        states,
        city_comparison,
        colors,
    }
}

/// One page of a selection; pages are 1-based and clamped to the valid range.
pub fn page<T>(items: &[T], requested: usize) -> (usize, usize, &[T]) {
    let total_pages = items.len().div_ceil(ROWS_PER_PAGE).max(1);
    let current = requested.clamp(1, total_pages);
    let start = ((current - 1) * ROWS_PER_PAGE).min(items.len());
    let end = (start + ROWS_PER_PAGE).min(items.len());
    (current, total_pages, &items[start..end])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applied { students: usize },
    /// A newer load or a reset happened after this ticket was issued.
    Superseded,
    /// The load failed; the previous dataset, if any, is kept.
    Failed(IngestError),
}

#[derive(Debug)]
struct Loaded {
    dataset: Dataset,
    options: FilterOptions,
    filters: FilterSpec,
    colors: ColorAssigner,
}

#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    loaded: Option<Loaded>,
    mode: AnalysisMode,
    settings: ViewSettings,
    pending: Debouncer<FilterSpec>,
}

impl Session {
    pub fn new(settings: ViewSettings, debouncer: Debouncer<FilterSpec>) -> Self {
        Self {
            settings,
            pending: debouncer,
            ..Self::default()
        }
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Dataset, IngestError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            debug!(
                "Ignoring load {} superseded by {}",
                ticket.generation, self.generation
            );
            return LoadOutcome::Superseded;
        }
        match result {
            Ok(dataset) => {
                let options = FilterOptions::from_students(dataset.students());
                let filters = options.initial_spec();
                let students = dataset.len();
                self.pending.cancel();
                self.loaded = Some(Loaded {
                    dataset,
                    options,
                    filters,
                    colors: ColorAssigner::default(),
                });
                info!("Session now holds {students} student record(s)");
                LoadOutcome::Applied { students }
            }
            Err(err) => {
                warn!("Load failed: {err}");
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Drops the dataset; loads still in flight become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.loaded = None;
        self.pending.cancel();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.loaded.as_ref().map(|l| &l.dataset)
    }

    pub fn options(&self) -> Option<&FilterOptions> {
        self.loaded.as_ref().map(|l| &l.options)
    }

    pub fn filters(&self) -> Option<&FilterSpec> {
        self.loaded.as_ref().map(|l| &l.filters)
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AnalysisMode) {
        self.mode = mode;
    }

    pub fn settings_mut(&mut self) -> &mut ViewSettings {
        &mut self.settings
    }

    /// Queues a filter change; it takes effect on a later [`Session::tick`].
    pub fn update_filters(&mut self, spec: FilterSpec, now: Instant) {
        if self.loaded.is_some() {
            self.pending.schedule(spec, now);
        }
    }

    /// Applies the pending filter spec if its quiet period is over. Returns
    /// whether the active filters changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match (self.pending.poll(now), self.loaded.as_mut()) {
            (Some(spec), Some(loaded)) => {
                let changed = loaded.filters != spec;
                loaded.filters = spec;
                changed
            }
            _ => false,
        }
    }

    /// Applies any pending filter spec right away.
    pub fn apply_pending(&mut self) -> bool {
        match (self.pending.flush(), self.loaded.as_mut()) {
            (Some(spec), Some(loaded)) => {
                let changed = loaded.filters != spec;
                loaded.filters = spec;
                changed
            }
            _ => false,
        }
    }

    pub fn filtered(&self) -> Vec<&Student> {
        match &self.loaded {
            Some(loaded) => apply_filters(loaded.dataset.students(), &loaded.filters),
            None => Vec::new(),
        }
    }

    pub fn view(&mut self) -> Option<DashboardView> {
        let loaded = self.loaded.as_mut()?;
        let selection = apply_filters(loaded.dataset.students(), &loaded.filters);
        let active = active_filters(&loaded.filters, &loaded.options);
        Some(build_view(
            &selection,
            active,
            self.mode,
            &self.settings,
            &mut loaded.colors,
        ))
    }
}
