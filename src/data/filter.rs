use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

use super::model::{CellValue, Column, ColumnKind, Dataset};
use crate::error::FilterError;

// ---------------------------------------------------------------------------
// Filter values: what the user selected for one column
// ---------------------------------------------------------------------------

/// Three-way choice offered for boolean columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoolChoice {
    /// No constraint.
    #[default]
    Both,
    True,
    False,
}

impl fmt::Display for BoolChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoolChoice::Both => "Both",
            BoolChoice::True => "True",
            BoolChoice::False => "False",
        })
    }
}

/// The user's input for one column. Each variant fits exactly one
/// [`ColumnKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Categorical: keep rows whose value is one of the selected categories.
    /// An empty selection keeps nothing.
    Membership(BTreeSet<CellValue>),
    /// Boolean: `Both` keeps everything, otherwise keep equal rows.
    Boolean(BoolChoice),
    /// Numeric: keep rows with `low <= value <= high`.
    Range { low: f64, high: f64 },
    /// Text: keep rows containing the pattern, literally or as a regex.
    /// An empty pattern keeps everything.
    Pattern(String),
}

impl ColumnFilter {
    /// The column kind this filter applies to.
    pub fn column_kind(&self) -> ColumnKind {
        match self {
            ColumnFilter::Membership(_) => ColumnKind::Categorical,
            ColumnFilter::Boolean(_) => ColumnKind::Boolean,
            ColumnFilter::Range { .. } => ColumnKind::Numeric,
            ColumnFilter::Pattern(_) => ColumnKind::Text,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ColumnFilter::Membership(_) => "membership",
            ColumnFilter::Boolean(_) => "boolean",
            ColumnFilter::Range { .. } => "range",
            ColumnFilter::Pattern(_) => "pattern",
        }
    }
}

/// One column's filter, built fresh on every interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub filter: ColumnFilter,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, filter: ColumnFilter) -> Self {
        FilterSpec {
            column: column.into(),
            filter,
        }
    }
}

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// A filter validated against its column and ready to test cells.
enum Predicate<'a> {
    /// Designed no-op (`Both`, empty pattern).
    KeepAll,
    In(&'a BTreeSet<CellValue>),
    Equals(bool),
    Between(f64, f64),
    Matches { literal: &'a str, regex: Regex },
}

impl Predicate<'_> {
    fn test(&self, value: &CellValue) -> bool {
        match self {
            Predicate::KeepAll => true,
            Predicate::In(selected) => selected.contains(value),
            Predicate::Equals(wanted) => matches!(value, CellValue::Bool(b) if b == wanted),
            Predicate::Between(low, high) => value
                .as_f64()
                .is_some_and(|v| *low <= v && v <= *high),
            Predicate::Matches { literal, regex } => match value {
                CellValue::Null => false,
                CellValue::String(s) | CellValue::Date(s) => {
                    s.contains(literal) || regex.is_match(s)
                }
                other => {
                    let s = other.to_string();
                    s.contains(literal) || regex.is_match(&s)
                }
            },
        }
    }
}

/// Check that `filter` fits `column` and turn it into a predicate.
fn compile<'a>(column: &Column, filter: &'a ColumnFilter) -> Result<Predicate<'a>, FilterError> {
    if filter.column_kind() != column.kind {
        return Err(FilterError::TypeMismatch {
            column: column.name.clone(),
            kind: column.kind,
            filter: filter.name(),
        });
    }

    let predicate = match filter {
        ColumnFilter::Membership(selected) => Predicate::In(selected),
        ColumnFilter::Boolean(BoolChoice::Both) => Predicate::KeepAll,
        ColumnFilter::Boolean(BoolChoice::True) => Predicate::Equals(true),
        ColumnFilter::Boolean(BoolChoice::False) => Predicate::Equals(false),
        ColumnFilter::Range { low, high } => Predicate::Between(*low, *high),
        ColumnFilter::Pattern(pattern) if pattern.is_empty() => Predicate::KeepAll,
        ColumnFilter::Pattern(pattern) => {
            let regex = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                column: column.name.clone(),
                pattern: pattern.clone(),
                source,
            })?;
            Predicate::Matches {
                literal: pattern,
                regex,
            }
        }
    };
    Ok(predicate)
}

// ---------------------------------------------------------------------------
// Applying filters
// ---------------------------------------------------------------------------

/// Indices of the rows of `dataset` that satisfy `filter` on `column`.
pub fn matching_rows(
    dataset: &Dataset,
    column: &str,
    filter: &ColumnFilter,
) -> Result<Vec<usize>, FilterError> {
    let mut rows: Vec<usize> = (0..dataset.len()).collect();
    retain_matching(dataset, column, filter, &mut rows)?;
    Ok(rows)
}

/// Keep only the entries of `rows` whose value in `column` passes `filter`.
pub(crate) fn retain_matching(
    dataset: &Dataset,
    column: &str,
    filter: &ColumnFilter,
    rows: &mut Vec<usize>,
) -> Result<(), FilterError> {
    let column = dataset
        .column(column)
        .ok_or_else(|| FilterError::InvalidColumn(column.to_string()))?;

    match compile(column, filter)? {
        Predicate::KeepAll => {}
        predicate => rows.retain(|&r| predicate.test(&column.values[r])),
    }
    Ok(())
}

/// Return the rows of `dataset` that satisfy `filter` on `column`.
///
/// Pure: the input is never modified. Fails if the column does not exist,
/// if the filter does not fit the column's kind, or if a text pattern is not
/// a valid regex.
pub fn apply_filter(
    dataset: &Dataset,
    column: &str,
    filter: &ColumnFilter,
) -> Result<Dataset, FilterError> {
    let rows = matching_rows(dataset, column, filter)?;
    Ok(dataset.take_rows(&rows))
}

/// Return indices of rows that pass all filters (AND-combined, applied in
/// order). Each filter only looks at the rows that survived the ones
/// before it.
pub fn filtered_indices(dataset: &Dataset, specs: &[FilterSpec]) -> Result<Vec<usize>, FilterError> {
    let mut rows: Vec<usize> = (0..dataset.len()).collect();

    for spec in specs {
        retain_matching(dataset, &spec.column, &spec.filter, &mut rows)?;
    }

    Ok(rows)
}

/// Apply every filter in turn, producing the filtered view.
pub fn filter_dataset(dataset: &Dataset, specs: &[FilterSpec]) -> Result<Dataset, FilterError> {
    let rows = filtered_indices(dataset, specs)?;
    log::debug!(
        "{} filters kept {} of {} rows",
        specs.len(),
        rows.len(),
        dataset.len()
    );
    Ok(dataset.take_rows(&rows))
}
