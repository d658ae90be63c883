use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use tabsift::cache::{CacheKey, DatasetCache};
use tabsift::config::ViewerConfig;
use tabsift::data::classify::{classify, present_columns};
use tabsift::data::filter::ColumnFilter;
use tabsift::data::loader::FileFormat;
use tabsift::data::model::{CellValue, ColumnKind, Dataset};
use tabsift::data::widget::{narrow_controls, FilterControl, FilterWidget};

use crate::color::ColorMap;

/// A cell being edited in the grid.
#[derive(Debug, Clone)]
pub struct CellEdit {
    pub row: usize,
    pub col: usize,
    pub text: String,
    /// True until the editor has grabbed keyboard focus once.
    pub fresh: bool,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Parsed uploads keyed by content; shared read-only.
    pub cache: DatasetCache,

    /// File name of the current upload.
    pub source_name: Option<String>,

    /// Cache key of the current upload.
    pub current_key: Option<CacheKey>,

    /// The current upload as parsed, before classification.
    pub raw_dataset: Option<Arc<Dataset>>,

    /// Loaded and classified dataset (None until user opens a file).
    pub dataset: Option<Arc<Dataset>>,

    /// One control per column, in column order.
    pub controls: Vec<FilterControl>,

    /// Rows passing the current filters. Edits land here and are
    /// discarded on the next recomputation.
    pub view: Dataset,

    pub editing: Option<CellEdit>,

    /// Which categorical column is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Load / settings error shown in the top bar.
    pub status_message: Option<String>,

    /// Error from the last filter recomputation.
    pub filter_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            cache: DatasetCache::new(config.cache_capacity()),
            config,
            source_name: None,
            current_key: None,
            raw_dataset: None,
            dataset: None,
            controls: Vec::new(),
            view: Dataset::default(),
            editing: None,
            color_column: None,
            color_map: None,
            status_message: None,
            filter_error: None,
        }
    }

    /// Read, parse and classify a file chosen by the user.
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.open_bytes(&name, &bytes, format)
    }

    /// Parse (or fetch from the cache) an upload and make it current.
    /// The previous upload's cache entry is dropped once the new one is
    /// usable.
    pub fn open_bytes(&mut self, name: &str, bytes: &[u8], format: FileFormat) -> Result<()> {
        let (key, loaded) = self
            .cache
            .get_or_load(bytes, format)
            .with_context(|| format!("loading {name}"))?;

        let classified = match classify_with(&self.config, name, &loaded) {
            Ok(ds) => ds,
            Err(e) => {
                // Nothing usable was produced from this content.
                if self.current_key != Some(key) {
                    self.cache.invalidate(&key);
                }
                return Err(e);
            }
        };

        if let Some(previous) = self.current_key.replace(key) {
            if previous != key && self.cache.invalidate(&previous) {
                log::debug!("Dropped previous upload {previous:?} from the cache");
            }
        }

        log::info!(
            "Loaded {name}: {} rows, columns {:?}",
            classified.len(),
            classified.column_names().collect::<Vec<_>>()
        );
        self.raw_dataset = Some(loaded);
        self.set_dataset(name, Arc::new(classified));
        Ok(())
    }

    /// Ingest a newly loaded dataset, initialise filters and colour.
    pub fn set_dataset(&mut self, name: &str, dataset: Arc<Dataset>) {
        self.controls = dataset.columns().iter().map(FilterControl::new).collect();

        // Default colour column: first categorical column (if any).
        self.color_column = dataset
            .columns()
            .iter()
            .find(|c| c.kind == ColumnKind::Categorical)
            .map(|c| c.name.clone());
        self.view = (*dataset).clone();
        self.editing = None;
        self.source_name = Some(name.to_string());
        self.dataset = Some(dataset);
        self.rebuild_color_map();
        self.status_message = None;
        self.filter_error = None;
    }

    /// Recompute the filtered view from scratch after a filter change,
    /// narrowing each widget to the rows the filters above it leave.
    /// On error the previous view and widgets stay on screen.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let mut controls = self.controls.clone();

        match narrow_controls(ds, &mut controls) {
            Ok(rows) => {
                log::debug!("Filters keep {} of {} rows", rows.len(), ds.len());
                self.view = ds.take_rows(&rows);
                self.controls = controls;
                self.editing = None;
                self.filter_error = None;
            }
            Err(e) => {
                log::warn!("Filtering failed: {e}");
                self.filter_error = Some(e.to_string());
            }
        }
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self) {
        self.color_map = match (&self.dataset, &self.color_column) {
            (Some(ds), Some(col)) => ds
                .column(col)
                .and_then(|c| c.categories.as_ref())
                .map(|cats| ColorMap::new(col, cats)),
            _ => None,
        };
    }

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        self.rebuild_color_map();
    }

    /// Select every category of a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(control) = self.controls.iter_mut().find(|c| c.column == column) {
            if let FilterWidget::MultiSelect { options } = &control.widget {
                control.filter = ColumnFilter::Membership(options.iter().cloned().collect());
            }
        }
        self.refilter();
    }

    /// Deselect every category of a column.
    pub fn select_none(&mut self, column: &str) {
        if let Some(control) = self.controls.iter_mut().find(|c| c.column == column) {
            if matches!(control.widget, FilterWidget::MultiSelect { .. }) {
                control.filter = ColumnFilter::Membership(BTreeSet::new());
            }
        }
        self.refilter();
    }

    /// Put all filters back to their no-op defaults.
    pub fn reset_filters(&mut self) {
        for control in &mut self.controls {
            control.filter = control.widget.default_filter();
        }
        self.refilter();
    }

    pub fn begin_edit(&mut self, row: usize, col: usize) {
        let text = match self.view.cell(row, col) {
            Some(CellValue::Null) | None => String::new(),
            Some(value) => value.to_string(),
        };
        self.editing = Some(CellEdit {
            row,
            col,
            text,
            fresh: true,
        });
    }

    /// Write the pending edit into the view, parsed for the column's kind.
    pub fn commit_edit(&mut self) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        let Some(column) = self.view.columns().get(edit.col) else {
            return;
        };
        let (name, kind) = (column.name.clone(), column.kind);

        match column.parse_edit(&edit.text) {
            Some(value) => {
                log::debug!("Edited row {} of '{name}' to {value}", edit.row);
                self.view.set_cell(edit.row, edit.col, value);
                self.status_message = None;
            }
            None => {
                self.status_message = Some(format!(
                    "'{}' is not a valid {kind} value for column '{name}'",
                    edit.text
                ));
            }
        }
    }

    pub fn clear_cache(&mut self) {
        let n = self.cache.len();
        self.cache.clear();
        log::info!("Cleared {n} cached uploads");
    }

    /// Replace the settings and reclassify the open upload under them.
    /// Nothing changes if the open upload does not fit the new settings.
    pub fn load_config(&mut self, path: &Path) -> Result<()> {
        let config = ViewerConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?;
        let reclassified = match (&self.raw_dataset, &self.source_name) {
            (Some(raw), Some(name)) => Some((name.clone(), classify_with(&config, name, raw)?)),
            _ => None,
        };

        log::info!("Loaded settings from {}", path.display());
        self.cache.resize(config.cache_capacity());
        self.config = config;
        if let Some((name, dataset)) = reclassified {
            self.set_dataset(&name, Arc::new(dataset));
        }
        Ok(())
    }
}

/// Classify `loaded` with the category columns `config` names. Outside
/// strict mode, names that are not columns of `loaded` are skipped.
fn classify_with(config: &ViewerConfig, name: &str, loaded: &Dataset) -> Result<Dataset> {
    let categories: Vec<&str> = if config.strict_categories {
        config.category_columns.iter().map(String::as_str).collect()
    } else {
        let present = present_columns(loaded, &config.category_columns);
        if present.len() < config.category_columns.len() {
            log::warn!(
                "{name}: {} of {} category columns are missing, skipping them",
                config.category_columns.len() - present.len(),
                config.category_columns.len()
            );
        }
        present
    };
    classify(loaded, &categories).with_context(|| format!("classifying columns of {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &[u8] = b",Status,Score,Done,Note\n\
0,Open,1,true,alpha\n\
1,Closed,2,false,beta\n\
2,Open,3,true,gamma\n";

    fn state(categories: &[&str], strict: bool) -> AppState {
        AppState::new(ViewerConfig {
            category_columns: categories.iter().map(|c| c.to_string()).collect(),
            strict_categories: strict,
            ..ViewerConfig::default()
        })
    }

    fn loaded() -> AppState {
        let mut st = state(&["Status"], true);
        st.open_bytes("tasks.csv", CSV, FileFormat::Csv).unwrap();
        st
    }

    #[test]
    fn open_builds_one_control_per_column() {
        let st = loaded();
        let kinds: Vec<_> = st
            .controls
            .iter()
            .map(|c| (c.column.as_str(), c.filter.column_kind()))
            .collect();
        assert_eq!(
            kinds,
            [
                ("Status", ColumnKind::Categorical),
                ("Score", ColumnKind::Numeric),
                ("Done", ColumnKind::Boolean),
                ("Note", ColumnKind::Text),
            ]
        );
        assert_eq!(st.view.len(), 3);
        assert_eq!(st.color_column.as_deref(), Some("Status"));
        assert!(st.color_map.is_some());
    }

    #[test]
    fn strict_missing_category_is_an_error() {
        let mut st = state(&["Status", "Domain"], true);
        let err = st.open_bytes("tasks.csv", CSV, FileFormat::Csv).unwrap_err();
        assert!(format!("{err:#}").contains("Domain"));
        assert!(st.dataset.is_none());
        assert!(st.cache.is_empty());
    }

    #[test]
    fn lenient_mode_skips_missing_categories() {
        let mut st = state(&["Status", "Domain"], false);
        st.open_bytes("tasks.csv", CSV, FileFormat::Csv).unwrap();
        let ds = st.dataset.as_ref().unwrap();
        assert_eq!(ds.column("Status").unwrap().kind, ColumnKind::Categorical);
    }

    #[test]
    fn select_none_then_all() {
        let mut st = loaded();
        st.select_none("Status");
        assert!(st.view.is_empty());
        st.select_all("Status");
        assert_eq!(st.view.len(), 3);
    }

    #[test]
    fn bad_pattern_keeps_previous_view() {
        let mut st = loaded();
        st.controls[3].filter = ColumnFilter::Pattern("a".into());
        st.refilter();
        assert_eq!(st.view.len(), 3);

        st.controls[3].filter = ColumnFilter::Pattern("(".into());
        st.refilter();
        assert!(st.filter_error.is_some());
        assert_eq!(st.view.len(), 3);

        st.reset_filters();
        assert!(st.filter_error.is_none());
    }

    #[test]
    fn edits_apply_to_view_only_and_are_type_checked() {
        let mut st = loaded();
        st.begin_edit(0, 1);
        st.editing.as_mut().unwrap().text = "42".into();
        st.commit_edit();
        assert_eq!(st.view.cell(0, 1), Some(&CellValue::Integer(42)));
        let source = st.dataset.as_ref().unwrap();
        assert_eq!(source.cell(0, 1), Some(&CellValue::Integer(1)));

        st.begin_edit(1, 1);
        st.editing.as_mut().unwrap().text = "many".into();
        st.commit_edit();
        assert!(st.status_message.is_some());
        assert_eq!(st.view.cell(1, 1), Some(&CellValue::Integer(2)));

        // Recomputing the view discards edits.
        st.refilter();
        assert_eq!(st.view.cell(0, 1), Some(&CellValue::Integer(1)));
    }

    #[test]
    fn reopening_same_content_hits_the_cache() {
        let mut st = loaded();
        st.open_bytes("copy.csv", CSV, FileFormat::Csv).unwrap();
        assert_eq!(st.cache.stats(), (1, 1));
        assert_eq!(st.source_name.as_deref(), Some("copy.csv"));
    }

    #[test]
    fn new_upload_evicts_the_previous_one() {
        let mut st = loaded();
        let first = CacheKey::new(CSV, FileFormat::Csv);
        assert!(st.cache.contains(&first));

        let other: &[u8] = b"Status,Score\nOpen,9\n";
        st.open_bytes("other.csv", other, FileFormat::Csv).unwrap();
        assert!(!st.cache.contains(&first));
        assert!(st.cache.contains(&CacheKey::new(other, FileFormat::Csv)));
        assert_eq!(st.cache.len(), 1);
        assert_eq!(st.current_key, Some(CacheKey::new(other, FileFormat::Csv)));
    }

    #[test]
    fn failed_upload_keeps_the_current_one() {
        let mut st = loaded();
        let bad: &[u8] = b"Name\nx\n";
        assert!(st.open_bytes("bad.csv", bad, FileFormat::Csv).is_err());

        assert!(st.cache.contains(&CacheKey::new(CSV, FileFormat::Csv)));
        assert!(!st.cache.contains(&CacheKey::new(bad, FileFormat::Csv)));
        assert_eq!(st.source_name.as_deref(), Some("tasks.csv"));
        assert_eq!(st.view.len(), 3);
    }

    #[test]
    fn widgets_narrow_to_rows_left_by_earlier_filters() {
        let mut st = loaded();
        st.controls[0].filter = ColumnFilter::Membership([CellValue::String("Closed".into())].into());
        st.refilter();

        assert_eq!(st.view.len(), 1);
        assert_eq!(
            st.controls[1].widget,
            FilterWidget::RangeSlider {
                min: 2.0,
                max: 2.0,
                step: 0.0
            }
        );
        assert_eq!(st.controls[1].filter, ColumnFilter::Range { low: 2.0, high: 2.0 });

        st.select_all("Status");
        assert_eq!(st.view.len(), 3);
        assert_eq!(st.controls[1].filter, ColumnFilter::Range { low: 1.0, high: 3.0 });
    }

    #[test]
    fn categorical_edit_keeps_text_values() {
        let mut st = loaded();
        st.begin_edit(0, 0);
        st.editing.as_mut().unwrap().text = "7".into();
        st.commit_edit();
        assert_eq!(st.view.cell(0, 0), Some(&CellValue::String("7".into())));

        st.begin_edit(1, 0);
        st.editing.as_mut().unwrap().text = "Open".into();
        st.commit_edit();
        assert_eq!(st.view.cell(1, 0), Some(&CellValue::String("Open".into())));
    }

    #[test]
    fn new_settings_reclassify_the_open_upload() {
        let mut st = loaded();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");

        std::fs::write(&path, "category_columns = [\"Status\", \"Note\"]\ncache_capacity = 2\n")
            .unwrap();
        st.load_config(&path).unwrap();
        let ds = st.dataset.as_ref().unwrap();
        assert_eq!(ds.column("Note").unwrap().kind, ColumnKind::Categorical);
        assert!(matches!(st.controls[3].widget, FilterWidget::MultiSelect { .. }));
        assert_eq!(st.config.cache_capacity, 2);
        // The upload itself stays cached.
        assert_eq!(st.cache.len(), 1);

        std::fs::write(&path, "category_columns = [\"Domain\"]\n").unwrap();
        let err = st.load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Domain"));
        assert_eq!(st.config.category_columns, ["Status", "Note"]);
        assert_eq!(
            st.dataset.as_ref().unwrap().column("Note").unwrap().kind,
            ColumnKind::Categorical
        );
    }
}
