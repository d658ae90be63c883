use super::model::{ColumnKind, Dataset};
use crate::error::ClassifyError;

/// Headers forced to categorical by default.
pub const DEFAULT_CATEGORY_COLUMNS: &[&str] = &[
    "Req Quality",
    "Req Complexity",
    "Gherkin Quality",
    "Gherkin Complexity",
    "Status",
    "Scenario_Type",
    "Domain",
    "Execution_Type",
    "Token Size Category",
];

/// Return a copy of `dataset` with every named column re-typed as
/// categorical, whatever kind the loader inferred for it.
///
/// The category set of each column is its sorted distinct values (a null is
/// kept as a category when present). A name that is not a column of the
/// dataset is an error; nothing is skipped.
pub fn classify<S: AsRef<str>>(dataset: &Dataset, names: &[S]) -> Result<Dataset, ClassifyError> {
    let mut out = dataset.clone();
    for name in names {
        let name = name.as_ref();
        let column = out
            .column_mut(name)
            .ok_or_else(|| ClassifyError::ColumnNotFound(name.to_string()))?;
        column.categories = Some(column.distinct_values());
        column.kind = ColumnKind::Categorical;
    }
    Ok(out)
}

/// The subset of `names` that are columns of `dataset`, in the given order.
pub fn present_columns<'a, S: AsRef<str>>(dataset: &Dataset, names: &'a [S]) -> Vec<&'a str> {
    names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name: &&str| dataset.column(name).is_some())
        .collect()
}
