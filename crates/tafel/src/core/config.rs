//! Configuration loading and validation.
//!
//! [`TableConfig`] holds every tunable of the reconstruction pipeline. It can be
//! loaded from TOML, YAML or JSON, discovered as `tafel.toml` in the directory
//! hierarchy, overridden from `TAFEL_*` environment variables, or built
//! programmatically. Invalid values are rejected by [`TableConfig::validate`];
//! they are never clamped.

use crate::{Result, TafelError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name searched by [`TableConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "tafel.toml";

/// Table reconstruction configuration.
///
/// # Example
///
/// ```rust
/// use tafel::core::config::TableConfig;
///
/// let config = TableConfig {
///     max_columns: 8,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
///
/// // Load from TOML file
/// // let config = TableConfig::from_toml_file("tafel.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Row band half-width as a multiple of the median fragment height
    #[serde(default = "default_row_tolerance")]
    pub row_tolerance: f64,

    /// Column gap threshold as a multiple of the median horizontal gap
    #[serde(default = "default_column_gap_factor")]
    pub column_gap_factor: f64,

    /// Lower bound of the column gap threshold, in median fragment heights
    #[serde(default = "default_min_column_gap_ratio")]
    pub min_column_gap_ratio: f64,

    /// Upper bound of the column gap threshold, in median fragment heights
    #[serde(default = "default_max_column_gap_ratio")]
    pub max_column_gap_ratio: f64,

    /// Maximum number of columns; extra clusters are merged smallest-first
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,

    /// Cells below this confidence are counted as low-confidence (0.0-1.0)
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f64,

    /// Tables scoring below this are flagged for manual review (0.0-1.0)
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,

    /// Weight of the structural consistency penalty in the score (0.0-1.0)
    #[serde(default = "default_structure_weight")]
    pub structure_weight: f64,

    /// Drop fragments below this OCR confidence before clustering (0.0 = keep all)
    #[serde(default)]
    pub min_confidence: f64,

    /// Collapse whitespace runs inside fragment text
    #[serde(default = "default_true")]
    pub normalize_whitespace: bool,

    /// Split fragment text at column separators before clustering. Useful for
    /// engines that report a whole table line as one fragment.
    #[serde(default)]
    pub split_on_separators: bool,

    /// Separators honored by `split_on_separators`. A tab or a double space
    /// also matches longer whitespace runs; other separators match repeats.
    #[serde(default = "default_column_separators")]
    pub column_separators: Vec<String>,

    /// Pieces shorter than this many characters are dropped after a split
    #[serde(default = "default_min_column_width")]
    pub min_column_width: usize,
}

fn default_row_tolerance() -> f64 {
    0.5
}
fn default_column_gap_factor() -> f64 {
    2.0
}
fn default_min_column_gap_ratio() -> f64 {
    0.5
}
fn default_max_column_gap_ratio() -> f64 {
    3.0
}
fn default_max_columns() -> usize {
    20
}
fn default_low_confidence_threshold() -> f64 {
    0.5
}
fn default_review_threshold() -> f64 {
    0.7
}
fn default_structure_weight() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_column_separators() -> Vec<String> {
    ["\t", "  ", "|", ";", ","].into_iter().map(String::from).collect()
}
fn default_min_column_width() -> usize {
    1
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            row_tolerance: default_row_tolerance(),
            column_gap_factor: default_column_gap_factor(),
            min_column_gap_ratio: default_min_column_gap_ratio(),
            max_column_gap_ratio: default_max_column_gap_ratio(),
            max_columns: default_max_columns(),
            low_confidence_threshold: default_low_confidence_threshold(),
            review_threshold: default_review_threshold(),
            structure_weight: default_structure_weight(),
            min_confidence: 0.0,
            normalize_whitespace: true,
            split_on_separators: false,
            column_separators: default_column_separators(),
            min_column_width: default_min_column_width(),
        }
    }
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(TafelError::validation(format!(
            "{} must be a finite number, got {}",
            name, value
        )));
    }
    Ok(())
}

fn require_unit_interval(name: &str, value: f64) -> Result<()> {
    require_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(TafelError::validation(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        )));
    }
    Ok(())
}

impl TableConfig {
    /// Check every field, returning a `Validation` error for the first invalid one.
    pub fn validate(&self) -> Result<()> {
        require_finite("row_tolerance", self.row_tolerance)?;
        if self.row_tolerance < 0.0 {
            return Err(TafelError::validation(format!(
                "row_tolerance must not be negative, got {}",
                self.row_tolerance
            )));
        }

        require_finite("column_gap_factor", self.column_gap_factor)?;
        if self.column_gap_factor <= 0.0 {
            return Err(TafelError::validation(format!(
                "column_gap_factor must be greater than 0, got {}",
                self.column_gap_factor
            )));
        }

        require_finite("min_column_gap_ratio", self.min_column_gap_ratio)?;
        require_finite("max_column_gap_ratio", self.max_column_gap_ratio)?;
        if self.min_column_gap_ratio < 0.0 {
            return Err(TafelError::validation(format!(
                "min_column_gap_ratio must not be negative, got {}",
                self.min_column_gap_ratio
            )));
        }
        if self.max_column_gap_ratio <= 0.0 {
            return Err(TafelError::validation(format!(
                "max_column_gap_ratio must be greater than 0, got {}",
                self.max_column_gap_ratio
            )));
        }
        if self.min_column_gap_ratio > self.max_column_gap_ratio {
            return Err(TafelError::validation(format!(
                "min_column_gap_ratio ({}) must not exceed max_column_gap_ratio ({})",
                self.min_column_gap_ratio, self.max_column_gap_ratio
            )));
        }

        if self.max_columns == 0 {
            return Err(TafelError::validation("max_columns must be at least 1"));
        }

        require_unit_interval("low_confidence_threshold", self.low_confidence_threshold)?;
        require_unit_interval("review_threshold", self.review_threshold)?;
        require_unit_interval("structure_weight", self.structure_weight)?;
        require_unit_interval("min_confidence", self.min_confidence)?;

        if self.min_column_width == 0 {
            return Err(TafelError::validation("min_column_width must be at least 1"));
        }
        if self.column_separators.iter().any(String::is_empty) {
            return Err(TafelError::validation("column_separators must not contain an empty separator"));
        }
        if self.split_on_separators && self.column_separators.is_empty() {
            return Err(TafelError::validation(
                "split_on_separators is enabled but column_separators is empty",
            ));
        }

        Ok(())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `TafelError::Validation` if the file cannot be read, is invalid
    /// TOML, or holds invalid values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TafelError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| TafelError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TafelError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    /// (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(TafelError::validation(format!(
                "Unsupported config file extension: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `tafel.toml` in current directory and parent directories.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(TafelError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Apply `TAFEL_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TAFEL_*` overrides from an arbitrary lookup.
    ///
    /// Recognized keys: `TAFEL_ROW_TOLERANCE`, `TAFEL_COLUMN_GAP_FACTOR`,
    /// `TAFEL_MAX_COLUMNS`, `TAFEL_MIN_CONFIDENCE`, `TAFEL_REVIEW_THRESHOLD`,
    /// `TAFEL_SPLIT_ON_SEPARATORS`.
    /// A value that does not parse is a `Validation` error; the result is
    /// validated before it is returned.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_override::<f64, _>(&lookup, "TAFEL_ROW_TOLERANCE")? {
            self.row_tolerance = value;
        }
        if let Some(value) = parse_override::<f64, _>(&lookup, "TAFEL_COLUMN_GAP_FACTOR")? {
            self.column_gap_factor = value;
        }
        if let Some(value) = parse_override::<usize, _>(&lookup, "TAFEL_MAX_COLUMNS")? {
            self.max_columns = value;
        }
        if let Some(value) = parse_override::<f64, _>(&lookup, "TAFEL_MIN_CONFIDENCE")? {
            self.min_confidence = value;
        }
        if let Some(value) = parse_override::<f64, _>(&lookup, "TAFEL_REVIEW_THRESHOLD")? {
            self.review_threshold = value;
        }
        if let Some(value) = parse_override::<bool, _>(&lookup, "TAFEL_SPLIT_ON_SEPARATORS")? {
            self.split_on_separators = value;
        }

        self.validate()?;
        Ok(self)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| TafelError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TafelError::validation(format!("Invalid value for {}: '{}' ({})", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TableConfig::default();
        assert_eq!(config.row_tolerance, 0.5);
        assert_eq!(config.column_gap_factor, 2.0);
        assert_eq!(config.max_columns, 20);
        assert_eq!(config.min_confidence, 0.0);
        assert!(config.normalize_whitespace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_tolerance() {
        let config = TableConfig {
            row_tolerance: -0.1,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, TafelError::Validation { .. }));
        assert!(err.to_string().contains("row_tolerance"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let config = TableConfig {
            column_gap_factor: f64::NAN,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("column_gap_factor must be a finite number"));
    }

    #[test]
    fn test_validate_rejects_inverted_gap_ratios() {
        let config = TableConfig {
            min_column_gap_ratio: 4.0,
            max_column_gap_ratio: 1.0,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not exceed max_column_gap_ratio"));
    }

    #[test]
    fn test_validate_rejects_zero_max_columns() {
        let config = TableConfig {
            max_columns: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_thresholds_out_of_range() {
        let configs = [
            TableConfig {
                low_confidence_threshold: 1.5,
                ..Default::default()
            },
            TableConfig {
                review_threshold: -0.2,
                ..Default::default()
            },
            TableConfig {
                structure_weight: 2.0,
                ..Default::default()
            },
            TableConfig {
                min_confidence: 1.01,
                ..Default::default()
            },
        ];

        for config in configs {
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("between 0.0 and 1.0"), "{}", err);
        }
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tafel.toml");

        fs::write(
            &config_path,
            r#"
row_tolerance = 0.8
max_columns = 6
        "#,
        )
        .unwrap();

        let config = TableConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.row_tolerance, 0.8);
        assert_eq!(config.max_columns, 6);
        assert_eq!(config.column_gap_factor, 2.0);
    }

    #[test]
    fn test_from_toml_file_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tafel.toml");
        fs::write(&config_path, "row_tolerance = -1.0\n").unwrap();

        let err = TableConfig::from_toml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("row_tolerance must not be negative"));
    }

    #[test]
    fn test_from_toml_file_invalid_syntax() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tafel.toml");
        fs::write(&config_path, "row_tolerance = = 1\n").unwrap();

        let err = TableConfig::from_toml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tafel.yaml");
        fs::write(&config_path, "review_threshold: 0.9\nnormalize_whitespace: false\n").unwrap();

        let config = TableConfig::from_yaml_file(&config_path).unwrap();
        assert_eq!(config.review_threshold, 0.9);
        assert!(!config.normalize_whitespace);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tafel.json");
        fs::write(&config_path, r#"{"max_columns": 3, "min_confidence": 0.4}"#).unwrap();

        let config = TableConfig::from_json_file(&config_path).unwrap();
        assert_eq!(config.max_columns, 3);
        assert_eq!(config.min_confidence, 0.4);
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempdir().unwrap();
        let yml_path = dir.path().join("settings.yml");
        fs::write(&yml_path, "max_columns: 4\n").unwrap();
        let txt_path = dir.path().join("settings.txt");
        fs::write(&txt_path, "max_columns = 4\n").unwrap();

        assert_eq!(TableConfig::from_file(&yml_path).unwrap().max_columns, 4);
        assert!(TableConfig::from_file(&txt_path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = TableConfig::from_toml_file("/nonexistent/tafel.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    #[serial]
    fn test_discover_tafel_toml() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("scans").join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("tafel.toml"), "max_columns = 7\n").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();

        let result = std::panic::catch_unwind(|| {
            let config = TableConfig::discover().unwrap();
            assert!(config.is_some());
            assert_eq!(config.unwrap().max_columns, 7);
        });

        std::env::set_current_dir(&original_dir).unwrap();

        if let Err(e) = result {
            std::panic::resume_unwind(e);
        }
    }

    #[test]
    fn test_overrides_applied() {
        let env: HashMap<&str, &str> = [("TAFEL_MAX_COLUMNS", "5"), ("TAFEL_MIN_CONFIDENCE", " 0.3 ")]
            .into_iter()
            .collect();

        let config = TableConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.max_columns, 5);
        assert_eq!(config.min_confidence, 0.3);
        assert_eq!(config.row_tolerance, 0.5);
    }

    #[test]
    fn test_overrides_reject_garbage() {
        let err = TableConfig::default()
            .with_overrides(|key| (key == "TAFEL_ROW_TOLERANCE").then(|| "wide".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("TAFEL_ROW_TOLERANCE"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let err = TableConfig::default()
            .with_overrides(|key| (key == "TAFEL_REVIEW_THRESHOLD").then(|| "7".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("review_threshold"));
    }

    #[test]
    fn test_separator_settings() {
        let config = TableConfig::default();
        assert!(!config.split_on_separators);
        assert_eq!(config.column_separators, vec!["\t", "  ", "|", ";", ","]);
        assert_eq!(config.min_column_width, 1);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tafel.toml");
        fs::write(
            &config_path,
            "split_on_separators = true\ncolumn_separators = [\"|\", \"\\t\"]\nmin_column_width = 2\n",
        )
        .unwrap();

        let config = TableConfig::from_toml_file(&config_path).unwrap();
        assert!(config.split_on_separators);
        assert_eq!(config.column_separators, vec!["|", "\t"]);
        assert_eq!(config.min_column_width, 2);
    }

    #[test]
    fn test_validate_rejects_bad_separator_settings() {
        let configs = [
            TableConfig {
                min_column_width: 0,
                ..Default::default()
            },
            TableConfig {
                column_separators: vec!["|".to_string(), String::new()],
                ..Default::default()
            },
            TableConfig {
                split_on_separators: true,
                column_separators: Vec::new(),
                ..Default::default()
            },
        ];

        for config in configs {
            assert!(matches!(config.validate(), Err(TafelError::Validation { .. })));
        }
    }

    #[test]
    fn test_split_override() {
        let config = TableConfig::default()
            .with_overrides(|key| (key == "TAFEL_SPLIT_ON_SEPARATORS").then(|| "true".to_string()))
            .unwrap();

        assert!(config.split_on_separators);
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let rendered = TableConfig::default().to_toml_string().unwrap();
        assert!(rendered.contains("row_tolerance = 0.5"));

        let parsed: TableConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, TableConfig::default());
    }
}
