// End-to-end tests for the load → classify → filter pipeline.
//
// These read real fixture files from disk and run them through the same
// calls the viewer makes, with the default category column list.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tabsift::cache::DatasetCache;
use tabsift::config::ViewerConfig;
use tabsift::data::classify::classify;
use tabsift::data::filter::{apply_filter, filter_dataset, BoolChoice, ColumnFilter, FilterSpec};
use tabsift::data::loader::{load_file, FileFormat};
use tabsift::data::model::{CellValue, ColumnKind, Dataset};
use tabsift::data::widget::{widget_for, FilterWidget};
use tabsift::error::{ClassifyError, LoadError};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The annotated task export, classified with the default category columns.
fn tasks() -> Dataset {
    let ds = load_file(&fixture("annotated_tasks.csv")).unwrap();
    let config = ViewerConfig::default();
    classify(&ds, &config.category_columns).unwrap()
}

fn text(v: &str) -> CellValue {
    CellValue::String(v.to_string())
}

fn column_values(ds: &Dataset, name: &str) -> Vec<CellValue> {
    ds.column(name).unwrap().values.clone()
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn e2e_index_column_from_export_is_dropped() {
    let ds = load_file(&fixture("annotated_tasks.csv")).unwrap();
    let names: Vec<&str> = ds.column_names().collect();

    assert_eq!(names.len(), 12, "unexpected columns: {names:?}");
    assert_eq!(names.first(), Some(&"Req Quality"));
    assert!(names.iter().all(|n| !n.starts_with("Unnamed")));
    assert_eq!(ds.len(), 10);
}

#[test]
fn e2e_loader_infers_kinds_before_classification() {
    let ds = load_file(&fixture("annotated_tasks.csv")).unwrap();
    assert_eq!(ds.column("Status").unwrap().kind, ColumnKind::Text);
    assert_eq!(ds.column("Score").unwrap().kind, ColumnKind::Numeric);
    assert_eq!(ds.column("Automated").unwrap().kind, ColumnKind::Boolean);
    assert_eq!(
        ds.column("Title").unwrap().values[3],
        text("Submit claim with, comma")
    );
}

#[test]
fn e2e_unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.txt");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    assert!(matches!(
        load_file(&path),
        Err(LoadError::UnsupportedFormat(ext)) if ext == "txt"
    ));
}

#[test]
fn e2e_missing_file_is_an_io_error() {
    assert!(matches!(
        load_file(&fixture("does_not_exist.csv")),
        Err(LoadError::Io { .. })
    ));
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn e2e_default_categories_are_forced() {
    let ds = tasks();
    for name in ViewerConfig::default().category_columns {
        assert_eq!(
            ds.column(&name).unwrap().kind,
            ColumnKind::Categorical,
            "{name} should be categorical"
        );
    }

    let status = ds.column("Status").unwrap();
    let expected: BTreeSet<CellValue> = [text("Closed"), text("Open")].into();
    assert_eq!(status.categories.as_ref(), Some(&expected));
}

#[test]
fn e2e_file_without_category_columns_fails_classification() {
    let ds = load_file(&fixture("scores_only.csv")).unwrap();
    let err = classify(&ds, &ViewerConfig::default().category_columns).unwrap_err();
    assert!(matches!(err, ClassifyError::ColumnNotFound(name) if name == "Req Quality"));
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn e2e_status_membership_keeps_six_open_rows() {
    let ds = tasks();
    let open: BTreeSet<CellValue> = [text("Open")].into();
    let out = apply_filter(&ds, "Status", &ColumnFilter::Membership(open)).unwrap();

    assert_eq!(out.len(), 6);
    assert!(column_values(&out, "Status").iter().all(|v| *v == text("Open")));
}

#[test]
fn e2e_score_range_keeps_three_to_seven() {
    let ds = tasks();
    let out = apply_filter(&ds, "Score", &ColumnFilter::Range { low: 3.0, high: 7.0 }).unwrap();
    assert_eq!(
        column_values(&out, "Score"),
        (3..=7).map(CellValue::Integer).collect::<Vec<_>>()
    );
}

#[test]
fn e2e_boolean_and_text_filters() {
    let ds = tasks();

    let automated = apply_filter(&ds, "Automated", &ColumnFilter::Boolean(BoolChoice::True)).unwrap();
    assert_eq!(automated.len(), 6);

    let login = apply_filter(&ds, "Title", &ColumnFilter::Pattern("Login".into())).unwrap();
    assert_eq!(login.len(), 2);

    let regex = apply_filter(
        &ds,
        "Title",
        &ColumnFilter::Pattern("^Login with (valid|locked)".into()),
    )
    .unwrap();
    assert_eq!(regex, login);
}

#[test]
fn e2e_default_widgets_keep_every_row() {
    let ds = tasks();
    let specs: Vec<FilterSpec> = ds
        .columns()
        .iter()
        .map(|c| FilterSpec::new(c.name.clone(), widget_for(c).default_filter()))
        .collect();

    assert_eq!(filter_dataset(&ds, &specs).unwrap(), ds);
}

#[test]
fn e2e_score_slider_spans_observed_values() {
    let ds = tasks();
    match widget_for(ds.column("Score").unwrap()) {
        FilterWidget::RangeSlider { min, max, step } => {
            assert_eq!((min, max), (1.0, 10.0));
            assert!((step - 0.09).abs() < 1e-12, "step was {step}");
        }
        other => panic!("expected a range slider, got {other:?}"),
    }
}

#[test]
fn e2e_chained_filters_narrow_the_view() {
    let ds = tasks();
    let specs = [
        FilterSpec::new("Status", ColumnFilter::Membership([text("Open")].into())),
        FilterSpec::new("Domain", ColumnFilter::Membership([text("Banking")].into())),
        FilterSpec::new("Score", ColumnFilter::Range { low: 1.0, high: 6.0 }),
        FilterSpec::new("Automated", ColumnFilter::Boolean(BoolChoice::Both)),
    ];
    let out = filter_dataset(&ds, &specs).unwrap();

    assert_eq!(
        column_values(&out, "Score"),
        [1, 3, 6].map(CellValue::Integer)
    );
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn e2e_cache_shares_identical_uploads() {
    let bytes = std::fs::read(fixture("annotated_tasks.csv")).unwrap();
    let mut cache = DatasetCache::new(ViewerConfig::default().cache_capacity());

    let (_, first) = cache.get_or_load(&bytes, FileFormat::Csv).unwrap();
    let (_, second) = cache.get_or_load(&bytes, FileFormat::Csv).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}
