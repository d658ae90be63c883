use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use super::model::{CellValue, Column, ColumnKind, Dataset};
use crate::error::LoadError;

/// Header prefix given to nameless columns (typically a leftover index
/// column from an earlier unindexed export). Such columns are dropped.
pub const UNNAMED_PREFIX: &str = "Unnamed";

/// CSV cell spellings read as missing values.
const NA_MARKERS: &[&str] = &["", "NA", "N/A", "#N/A", "NaN", "nan", "null", "NULL"];

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// The two tabular formats the viewer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    /// Office Open XML workbook (`.xlsx`).
    Spreadsheet,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Result<Self, LoadError> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Spreadsheet),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn label(self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Spreadsheet => "XLSX",
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – comma-separated, header row
/// * `.xlsx` – first worksheet, first row as header
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let format = FileFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bytes(&bytes, format)
}

/// Parse an in-memory upload in the declared format.
///
/// Every column is unified to a single [`ColumnKind`] and columns whose
/// header starts with [`UNNAMED_PREFIX`] are removed.
pub fn load_bytes(bytes: &[u8], format: FileFormat) -> Result<Dataset, LoadError> {
    let raw = match format {
        FileFormat::Csv => read_csv(bytes)?,
        FileFormat::Spreadsheet => read_spreadsheet(bytes)?,
    };
    Ok(build_dataset(raw))
}

// ---------------------------------------------------------------------------
// Raw grid shared by both readers
// ---------------------------------------------------------------------------

/// A cell as read from the file: its best-guess typed value plus the text it
/// came from, so text columns keep the exact original spelling.
#[derive(Debug, Clone)]
struct RawCell {
    typed: CellValue,
    text: String,
}

struct RawTable {
    headers: Vec<String>,
    /// Column-major cells, one `Vec` per header.
    columns: Vec<Vec<RawCell>>,
}

fn build_dataset(raw: RawTable) -> Dataset {
    let headers = normalise_headers(raw.headers);

    let mut columns = Vec::with_capacity(headers.len());
    for (name, cells) in headers.into_iter().zip(raw.columns) {
        if name.starts_with(UNNAMED_PREFIX) {
            log::debug!("Dropping unnamed column '{name}'");
            continue;
        }
        columns.push(unify_column(name, cells));
    }
    Dataset::new(columns)
}

/// Give blank headers a positional `Unnamed: <idx>` name and make duplicate
/// names unique by appending `.1`, `.2`, ...
fn normalise_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = if header.trim().is_empty() {
                format!("{UNNAMED_PREFIX}: {idx}")
            } else {
                header
            };
            let mut name = base.clone();
            let mut n = 0;
            while used.contains(&name) {
                n += 1;
                name = format!("{base}.{n}");
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Pick one kind for the whole column and convert its cells to match.
///
/// * every non-null cell numeric → `Numeric` (integers widen to float if the
///   column mixes both)
/// * every cell boolean and none missing → `Boolean`
/// * otherwise → `Text`, keeping the original cell text
fn unify_column(name: String, cells: Vec<RawCell>) -> Column {
    let mut non_null = cells.iter().filter(|c| !c.typed.is_null()).peekable();
    if non_null.peek().is_none() {
        let values = vec![CellValue::Null; cells.len()];
        return Column::new(name, ColumnKind::Text, values);
    }

    let all_numeric = cells
        .iter()
        .all(|c| matches!(c.typed, CellValue::Null | CellValue::Integer(_) | CellValue::Float(_)));
    if all_numeric {
        let any_float = cells.iter().any(|c| matches!(c.typed, CellValue::Float(_)));
        let values = cells
            .into_iter()
            .map(|c| match c.typed {
                CellValue::Integer(i) if any_float => CellValue::Float(i as f64),
                other => other,
            })
            .collect();
        return Column::new(name, ColumnKind::Numeric, values);
    }

    if cells.iter().all(|c| matches!(c.typed, CellValue::Bool(_))) {
        let values = cells.into_iter().map(|c| c.typed).collect();
        return Column::new(name, ColumnKind::Boolean, values);
    }

    let values = cells
        .into_iter()
        .map(|c| match c.typed {
            CellValue::Null => CellValue::Null,
            CellValue::Date(d) => CellValue::Date(d),
            _ => CellValue::String(c.text),
        })
        .collect();
    Column::new(name, ColumnKind::Text, values)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, comma-delimited, standard
/// double-quote escaping. Every record must have as many fields as the header.
fn read_csv(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::parse("CSV", e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<Vec<RawCell>> = vec![Vec::new(); headers.len()];

    for result in reader.records() {
        let record = result.map_err(|e| LoadError::parse("CSV", e))?;
        for (col_idx, value) in record.iter().enumerate() {
            columns[col_idx].push(csv_cell(value));
        }
    }

    Ok(RawTable { headers, columns })
}

fn csv_cell(s: &str) -> RawCell {
    let typed = if NA_MARKERS.contains(&s) {
        CellValue::Null
    } else {
        CellValue::guess(s)
    };
    RawCell {
        typed,
        text: s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// XLSX reader
// ---------------------------------------------------------------------------

/// Read the first worksheet; its first row holds the column names.
fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| LoadError::parse("XLSX", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::parse("XLSX", "workbook contains no worksheets"))?
        .map_err(|e| LoadError::parse("XLSX", e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => Vec::new(),
    };

    let mut columns: Vec<Vec<RawCell>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col_idx, cell) in row.iter().enumerate().take(headers.len()) {
            columns[col_idx].push(xlsx_cell(cell));
        }
    }

    Ok(RawTable { headers, columns })
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn xlsx_cell(cell: &Data) -> RawCell {
    let typed = match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        // Excel stores every number as a double; whole values read back as ints.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Integer(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => CellValue::Date(ts.to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
    };
    let text = match &typed {
        CellValue::Null => String::new(),
        CellValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    RawCell { typed, text }
}
