use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common spreadsheet types.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date/time kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the value, used by range filters and slider bounds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Best-effort typing of a raw text cell.
    pub fn guess(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if let Some(b) = parse_bool(s) {
            return CellValue::Bool(b);
        }
        CellValue::String(s.to_string())
    }

    /// Parse edited text back into a value that fits a column of `kind`.
    /// Returns `None` when the text cannot be represented in that column.
    pub fn parse_for(kind: ColumnKind, s: &str) -> Option<CellValue> {
        let s = s.trim();
        match kind {
            ColumnKind::Numeric => {
                if s.is_empty() {
                    Some(CellValue::Null)
                } else if let Ok(i) = s.parse::<i64>() {
                    Some(CellValue::Integer(i))
                } else {
                    s.parse::<f64>().ok().map(CellValue::Float)
                }
            }
            ColumnKind::Boolean => parse_bool(s).map(CellValue::Bool),
            ColumnKind::Categorical => Some(CellValue::guess(s)),
            ColumnKind::Text => Some(if s.is_empty() {
                CellValue::Null
            } else {
                CellValue::String(s.to_string())
            }),
        }
    }
}

/// The spellings accepted as booleans in text input.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – semantic type attached to each column
// ---------------------------------------------------------------------------

/// Semantic column type. Decides which filter applies to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Enumerated, low-cardinality values.
    Categorical,
    Boolean,
    Numeric,
    /// Free text, dates and anything else.
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Categorical => "categorical",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
    /// Sorted distinct values; only set for categorical columns.
    pub categories: Option<BTreeSet<CellValue>>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            kind,
            values,
            categories: None,
        }
    }

    /// Sorted set of distinct values in this column (nulls included).
    pub fn distinct_values(&self) -> BTreeSet<CellValue> {
        self.values.iter().cloned().collect()
    }

    /// Observed `(min, max)` of the numeric values, ignoring nulls and NaN.
    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter_map(CellValue::as_f64)
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Parse edited text for this column. Categorical cells reuse the
    /// existing category spelled the same way, and stay text when the
    /// categories are text, so an edit never changes the value's variant
    /// behind the category set's back.
    pub fn parse_edit(&self, text: &str) -> Option<CellValue> {
        if self.kind != ColumnKind::Categorical {
            return CellValue::parse_for(self.kind, text);
        }
        let text = text.trim();
        if text.is_empty() {
            return Some(CellValue::Null);
        }
        let Some(categories) = &self.categories else {
            return Some(CellValue::guess(text));
        };
        if let Some(existing) = categories
            .iter()
            .find(|c| !c.is_null() && c.to_string() == text)
        {
            return Some(existing.clone());
        }
        let textual = categories
            .iter()
            .any(|c| matches!(c, CellValue::String(_) | CellValue::Date(_)));
        Some(if textual {
            CellValue::String(text.to_string())
        } else {
            CellValue::guess(text)
        })
    }

    /// Copy of this column holding only the given rows, in order.
    pub fn take_rows(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            kind: self.kind,
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
            categories: self.categories.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An ordered set of equally long, uniquely named columns.
///
/// Loaded datasets are never mutated in place by the filter pipeline: every
/// transformation builds a new `Dataset`, so a loaded one can be shared
/// through `Arc` between the cache and any number of views.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].len() == w[1].len()),
            "all columns must have the same row count"
        );
        debug_assert!(
            {
                let names: BTreeSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
                names.len() == columns.len()
            },
            "column names must be unique"
        );
        Dataset { columns }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.columns.get(col)?.values.get(row)
    }

    /// Overwrite one cell. Returns `false` if the position is out of range.
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        match self.columns.get_mut(col).and_then(|c| c.values.get_mut(row)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Build a new dataset containing only the given rows, in order.
    /// Column kinds and category sets are carried over unchanged.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        let columns = self.columns.iter().map(|c| c.take_rows(rows)).collect();
        Dataset { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorical(categories: &[CellValue]) -> Column {
        let mut column = Column::new("Level", ColumnKind::Categorical, categories.to_vec());
        column.categories = Some(column.distinct_values());
        column
    }

    #[test]
    fn edit_of_text_category_stays_text() {
        let column = categorical(&[
            CellValue::String("1".into()),
            CellValue::String("High".into()),
        ]);
        assert_eq!(column.parse_edit("1"), Some(CellValue::String("1".into())));
        assert_eq!(column.parse_edit("42"), Some(CellValue::String("42".into())));
        assert_eq!(column.parse_edit("  "), Some(CellValue::Null));
    }

    #[test]
    fn edit_of_numeric_category_reuses_existing_value() {
        let column = categorical(&[CellValue::Integer(1), CellValue::Integer(3)]);
        assert_eq!(column.parse_edit("3"), Some(CellValue::Integer(3)));
        assert_eq!(column.parse_edit("5"), Some(CellValue::Integer(5)));
    }

    #[test]
    fn edit_of_other_kinds_is_type_checked() {
        let numeric = Column::new("n", ColumnKind::Numeric, vec![CellValue::Integer(1)]);
        assert_eq!(numeric.parse_edit("2.5"), Some(CellValue::Float(2.5)));
        assert_eq!(numeric.parse_edit("many"), None);

        let flag = Column::new("b", ColumnKind::Boolean, vec![CellValue::Bool(true)]);
        assert_eq!(flag.parse_edit("False"), Some(CellValue::Bool(false)));
        assert_eq!(flag.parse_edit("maybe"), None);
    }

    #[test]
    fn take_rows_keeps_kind_and_categories() {
        let column = categorical(&[
            CellValue::String("a".into()),
            CellValue::String("b".into()),
            CellValue::String("c".into()),
        ]);
        let subset = column.take_rows(&[2, 0]);
        assert_eq!(
            subset.values,
            [CellValue::String("c".into()), CellValue::String("a".into())]
        );
        assert_eq!(subset.kind, ColumnKind::Categorical);
        assert_eq!(subset.categories, column.categories);
    }
}
