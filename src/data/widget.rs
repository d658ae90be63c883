use super::filter::{retain_matching, BoolChoice, ColumnFilter};
use super::model::{CellValue, Column, ColumnKind, Dataset};
use crate::error::FilterError;

/// Number of slider steps across a numeric column's observed range.
pub const RANGE_STEPS: f64 = 100.0;

/// The input control a column's filter needs, with everything required to
/// draw it.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterWidget {
    /// Pick any subset of the column's categories; all selected by default.
    MultiSelect { options: Vec<CellValue> },
    /// `Both | True | False`; `Both` by default.
    TriState,
    /// Two-ended slider over `[min, max]`, full range by default.
    RangeSlider { min: f64, max: f64, step: f64 },
    /// Substring or regex, empty by default.
    TextInput,
}

impl FilterWidget {
    /// The filter value the widget starts with. Always a no-op.
    pub fn default_filter(&self) -> ColumnFilter {
        match self {
            FilterWidget::MultiSelect { options } => {
                ColumnFilter::Membership(options.iter().cloned().collect())
            }
            FilterWidget::TriState => ColumnFilter::Boolean(BoolChoice::Both),
            FilterWidget::RangeSlider { min, max, .. } => ColumnFilter::Range {
                low: *min,
                high: *max,
            },
            FilterWidget::TextInput => ColumnFilter::Pattern(String::new()),
        }
    }
}

/// Describe the filter widget for `column`, based on its kind.
pub fn widget_for(column: &Column) -> FilterWidget {
    match column.kind {
        ColumnKind::Categorical => {
            let options = match &column.categories {
                Some(categories) => categories.iter().cloned().collect(),
                None => column.distinct_values().into_iter().collect(),
            };
            FilterWidget::MultiSelect { options }
        }
        ColumnKind::Boolean => FilterWidget::TriState,
        ColumnKind::Numeric => {
            let (min, max) = column.numeric_bounds().unwrap_or((0.0, 0.0));
            FilterWidget::RangeSlider {
                min,
                max,
                step: range_step(min, max),
            }
        }
        ColumnKind::Text => FilterWidget::TextInput,
    }
}

/// Describe the widget for `column` restricted to `rows`. Category options
/// are the values still present among those rows, and slider bounds are the
/// observed range over them.
pub fn widget_for_rows(column: &Column, rows: &[usize]) -> FilterWidget {
    let subset = column.take_rows(rows);
    match column.kind {
        ColumnKind::Categorical => FilterWidget::MultiSelect {
            options: subset.distinct_values().into_iter().collect(),
        },
        _ => widget_for(&subset),
    }
}

// ---------------------------------------------------------------------------
// Filter controls
// ---------------------------------------------------------------------------

/// One column's widget description plus the user's current input for it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub column: String,
    pub widget: FilterWidget,
    pub filter: ColumnFilter,
}

impl FilterControl {
    /// Control for `column` over the whole dataset, holding the no-op filter.
    pub fn new(column: &Column) -> Self {
        let widget = widget_for(column);
        FilterControl {
            column: column.name.clone(),
            filter: widget.default_filter(),
            widget,
        }
    }

    fn is_default(&self) -> bool {
        self.filter == self.widget.default_filter()
    }
}

/// Apply `controls` in order, rebuilding each widget from the rows that
/// survive the controls before it, and return the rows that pass them all.
///
/// A control still holding its widget's no-op filter follows the rebuilt
/// widget, so untouched columns keep every remaining row. Any other input is
/// left as the user set it. On error some controls may already be updated.
pub fn narrow_controls(
    dataset: &Dataset,
    controls: &mut [FilterControl],
) -> Result<Vec<usize>, FilterError> {
    let mut rows: Vec<usize> = (0..dataset.len()).collect();
    for control in controls.iter_mut() {
        let column = dataset
            .column(&control.column)
            .ok_or_else(|| FilterError::InvalidColumn(control.column.clone()))?;
        let widget = widget_for_rows(column, &rows);
        if widget != control.widget {
            if control.is_default() {
                control.filter = widget.default_filter();
            }
            control.widget = widget;
        }
        retain_matching(dataset, &control.column, &control.filter, &mut rows)?;
    }
    Ok(rows)
}

/// Slider step for `[min, max]`; zero when the range is empty.
pub fn range_step(min: f64, max: f64) -> f64 {
    if max > min {
        (max - min) / RANGE_STEPS
    } else {
        0.0
    }
}
