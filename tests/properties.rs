mod common;

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use common::{ExportRow, latin1};
use enrollment_insight::{
    chart::AnalysisMode,
    debounce::Debouncer,
    filter::{FilterSpec, RangeConstraint, apply_filters},
    frequency::{category_counts, top_n},
    ingest::{IngestOptions, ingest_bytes},
    palette::ColorAssigner,
    schema::Column,
    student::{Category, NOT_AVAILABLE, Student},
};
use proptest::prelude::*;

fn student(gender: &str, race: &str, age: i32, iaa: f64, year: i32) -> Student {
    Student {
        course: "Direito".to_string(),
        status: "Regular".to_string(),
        gender: gender.to_string(),
        race_color: race.to_string(),
        marital_status: NOT_AVAILABLE.to_string(),
        nationality: NOT_AVAILABLE.to_string(),
        entry_form: "Sisu".to_string(),
        entry_category: NOT_AVAILABLE.to_string(),
        birth_date: "01-01-2000".to_string(),
        age,
        entry_age: 18,
        origin: "SC - Lages".to_string(),
        origin_state: "SC".to_string(),
        origin_city: "Lages".to_string(),
        current_municipality: "Lages".to_string(),
        current_state: "SC".to_string(),
        cumulative_index: iaa,
        passed_credits_index: 0.0,
        entry_year: year,
        entry_term: 1,
        entry_year_term: (year as u32) * 10 + 1,
        semesters_enrolled: 1,
    }
}

fn students_strategy() -> impl Strategy<Value = Vec<Student>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["F", "M", NOT_AVAILABLE]),
            prop::sample::select(vec!["Branca", "Parda", "Preta", "Indígena", "Amarela"]),
            17..70i32,
            0.0..10_000.0f64,
            2010..2025i32,
        )
            .prop_map(|(gender, race, age, iaa, year)| student(gender, race, age, iaa, year)),
        0..60,
    )
}

fn spec_strategy() -> impl Strategy<Value = FilterSpec> {
    (
        17..70i32,
        0..30i32,
        prop::option::of(prop::sample::select(vec!["F", "M"])),
    )
        .prop_map(|(min_age, span, gender)| {
            let mut spec = FilterSpec {
                age: RangeConstraint::new(min_age, min_age + span),
                ..FilterSpec::default()
            };
            if let Some(gender) = gender {
                spec.gender.select(gender);
            }
            spec
        })
}

fn cloned(selection: Vec<&Student>) -> Vec<Student> {
    selection.into_iter().cloned().collect()
}

proptest! {
    #[test]
    fn header_order_and_extra_columns_do_not_change_records(
        order in Just((0..Column::BASE.len() + 2).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let row = ExportRow::default();
        let mut headers: Vec<String> = Column::BASE.iter().map(|c| c.header().to_string()).collect();
        headers.push("observacao".to_string());
        headers.push("codigoAluno".to_string());
        let mut values: Vec<String> = row.line().split(';').map(str::to_string).collect();
        values.push("sem observacao".to_string());
        values.push("12345".to_string());

        let header_line = order.iter().map(|&i| headers[i].as_str()).collect::<Vec<_>>().join(";");
        let value_line = order.iter().map(|&i| values[i].as_str()).collect::<Vec<_>>().join(";");
        let shuffled = format!("{header_line}\n{value_line}\n");
        let canonical = format!("{}\n{}\n", common::BASE_HEADER, row.line());

        let options = IngestOptions::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let left = ingest_bytes(&latin1(&shuffled), &options).unwrap();
        let right = ingest_bytes(&latin1(&canonical), &options).unwrap();
        prop_assert_eq!(left.students(), right.students());
    }

    #[test]
    fn filtering_is_idempotent(students in students_strategy(), spec in spec_strategy()) {
        let once = cloned(apply_filters(&students, &spec));
        let twice = cloned(apply_filters(&once, &spec));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn narrowing_a_range_never_grows_the_selection(
        students in students_strategy(),
        spec in spec_strategy(),
        shrink in 0..10i32,
    ) {
        let mut narrower = spec.clone();
        narrower.age = RangeConstraint::new(spec.age.min + shrink, spec.age.max);
        let wide = apply_filters(&students, &spec);
        let narrow = apply_filters(&students, &narrower);
        prop_assert!(narrow.len() <= wide.len());
        prop_assert!(narrow.iter().all(|s| wide.iter().any(|w| std::ptr::eq(*w, *s))));
    }

    #[test]
    fn widening_a_selection_never_shrinks_it(students in students_strategy()) {
        let mut spec = FilterSpec::default();
        spec.race_color.select("Parda");
        let before = apply_filters(&students, &spec).len();
        spec.race_color.select("Preta");
        let after = apply_filters(&students, &spec).len();
        prop_assert!(after >= before);
    }

    #[test]
    fn relative_counts_sum_to_one_hundred(students in students_strategy()) {
        prop_assume!(!students.is_empty());
        let all: Vec<&Student> = students.iter().collect();
        for field in [Category::Gender, Category::RaceColor] {
            let data = category_counts(&all, field, AnalysisMode::Relative);
            let total: f64 = data.iter().map(|d| d.value).sum();
            prop_assert!((total - 100.0).abs() <= 0.01);
        }
        let top = top_n(&all, Category::RaceColor, 2, AnalysisMode::Relative);
        let total: f64 = top.iter().map(|d| d.value).sum();
        prop_assert!((total - 100.0).abs() <= 0.01);
    }

    #[test]
    fn absolute_counts_cover_every_student(students in students_strategy()) {
        let all: Vec<&Student> = students.iter().collect();
        let data = category_counts(&all, Category::Gender, AnalysisMode::Absolute);
        let total: f64 = data.iter().map(|d| d.value).sum();
        prop_assert_eq!(total as usize, students.len());
    }

    #[test]
    fn label_colors_never_change(labels in prop::collection::vec("[A-Z][a-z]{0,6}", 1..40)) {
        let mut colors = ColorAssigner::default();
        let first: Vec<String> = labels.iter().map(|l| colors.color_for(l).to_string()).collect();
        let second: Vec<String> = labels.iter().map(|l| colors.color_for(l).to_string()).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn debounce_delivers_only_the_last_value(gaps in prop::collection::vec(0..400u64, 1..20)) {
        let delay = Duration::from_millis(500);
        let start = Instant::now();
        let mut debouncer = Debouncer::new(delay);
        let mut now = start;
        for (idx, gap) in gaps.iter().enumerate() {
            now += Duration::from_millis(*gap);
            debouncer.schedule(idx, now);
            prop_assert_eq!(debouncer.poll(now + Duration::from_millis(*gap / 2)), None);
        }
        prop_assert_eq!(debouncer.poll(now + delay), Some(gaps.len() - 1));
        prop_assert_eq!(debouncer.poll(now + delay * 2), None);
    }
}
