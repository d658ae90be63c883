use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::ColumnKind;

// ---------------------------------------------------------------------------
// Loader errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    /// The file extension / declared format is neither CSV nor XLSX.
    #[error("Unsupported file format: '{0}' (expected .csv or .xlsx)")]
    UnsupportedFormat(String),

    /// The byte stream is not valid for the declared format.
    #[error("Could not parse {format} data: {reason}")]
    Parse {
        format: &'static str,
        reason: String,
    },

    #[error("Could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn parse(format: &'static str, reason: impl ToString) -> Self {
        LoadError::Parse {
            format,
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A configured category column is absent from the loaded file.
    #[error("Category column '{0}' not found in dataset")]
    ColumnNotFound(String),
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Column '{0}' does not exist")]
    InvalidColumn(String),

    /// The filter does not fit the column's kind (e.g. a range on text).
    #[error("Cannot apply a {filter} filter to {kind} column '{column}'")]
    TypeMismatch {
        column: String,
        kind: ColumnKind,
        filter: &'static str,
    },

    #[error("Invalid pattern '{pattern}' for column '{column}': {source}")]
    InvalidPattern {
        column: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read settings file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Validation(String),
}
