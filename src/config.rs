use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;

use crate::data::classify::DEFAULT_CATEGORY_COLUMNS;
use crate::error::ConfigError;

/// Viewer settings, optionally read from a TOML file.
///
/// ```toml
/// category_columns = ["Status", "Domain"]
/// strict_categories = false
/// cache_capacity = 4
/// table_height = 600.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Columns forced to categorical after every load.
    pub category_columns: Vec<String>,
    /// When true a listed column missing from the file is a load error;
    /// when false only the present ones are classified.
    pub strict_categories: bool,
    /// Number of parsed files kept in the load cache.
    pub cache_capacity: usize,
    /// Height of the data grid in points.
    pub table_height: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            category_columns: DEFAULT_CATEGORY_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            strict_categories: true,
            cache_capacity: 8,
            table_height: 540.0,
        }
    }
}

impl ViewerConfig {
    /// Read and validate a settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse settings; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.table_height.is_nan() || self.table_height <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "table_height must be positive, got {}",
                self.table_height
            )));
        }
        if let Some(blank) = self.category_columns.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "category column names must not be blank, got '{blank}'"
            )));
        }
        Ok(())
    }

    pub fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
