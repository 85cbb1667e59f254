//! Configuration for the issue log.
//!
//! Sources (first hit wins):
//! 1. An explicit path (`--config`)
//! 2. User config (`<config dir>/issuelog/config.yaml`)
//! 3. Defaults
//!
//! Every field is optional in the file; missing ones take their default.

use crate::clock::{self, DEFAULT_TIMESTAMP_FORMAT, SystemClock};
use crate::models::{Category, Severity};
use crate::xlsx::ExportLayout;
use chrono::format::{Item, StrftimeItems};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR_NAME: &str = "issuelog";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Offset from UTC for found/resolved stamps (7 = WIB)
    pub utc_offset_hours: i32,
    /// chrono strftime layout for stamps
    pub timestamp_format: String,
    /// Workbook the CLI loads from and commits to
    pub working_file: PathBuf,
    /// Directory for `UAT_Log_<stamp>.xlsx` exports
    pub export_dir: PathBuf,
    pub sheet_name: String,
    pub column_width: f64,
    pub default_category: Category,
    pub default_severity: Severity,
}

impl Default for Config {
    fn default() -> Self {
        let layout = ExportLayout::default();
        Self {
            utc_offset_hours: 7,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            working_file: PathBuf::from("uat_log.xlsx"),
            export_dir: PathBuf::from("."),
            sheet_name: layout.sheet_name,
            column_width: layout.column_width,
            default_category: Category::default(),
            default_severity: Severity::default(),
        }
    }
}

impl Config {
    /// Load from `path` if given, else the user config file if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::user_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&contents).with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty file deserializes to null rather than an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/issuelog/config.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        clock::offset_from_hours(self.utc_offset_hours)?;

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(eyre!("Invalid timestamp_format: {:?}", self.timestamp_format));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(eyre!("sheet_name cannot be empty"));
        }
        if !(self.column_width > 0.0 && self.column_width <= 255.0) {
            return Err(eyre!("column_width must be greater than 0 and at most 255, got {}", self.column_width));
        }
        Ok(())
    }

    pub fn clock(&self) -> Result<SystemClock> {
        SystemClock::from_offset_hours(self.utc_offset_hours, self.timestamp_format.clone())
    }

    pub fn layout(&self) -> ExportLayout {
        ExportLayout {
            sheet_name: self.sheet_name.clone(),
            column_width: self.column_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.utc_offset_hours, 7);
        assert_eq!(config.timestamp_format, "%Y-%m-%d %H:%M");
        assert_eq!(config.sheet_name, "Logs");
        assert_eq!(config.column_width, 20.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml("utc_offset_hours: 8\ndefault_severity: High\n").unwrap();
        assert_eq!(config.utc_offset_hours, 8);
        assert_eq!(config.default_severity, Severity::High);
        assert_eq!(config.default_category, Category::FunctionalBug);
        assert_eq!(config.working_file, PathBuf::from("uat_log.xlsx"));
    }

    #[test]
    fn test_category_uses_display_name() {
        let config = Config::from_yaml("default_category: UI/UX Defect\n").unwrap();
        assert_eq!(config.default_category, Category::UiUxDefect);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_yaml("utc_offset_hours: 30\n").is_err());
        assert!(Config::from_yaml("timestamp_format: \"%Y-%\"\n").is_err());
        assert!(Config::from_yaml("sheet_name: \"  \"\n").is_err());
        assert!(Config::from_yaml("column_width: 0\n").is_err());
        assert!(Config::from_yaml("default_severity: Urgent\n").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "sheet_name: Regression\nexport_dir: reports\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.sheet_name, "Regression");
        assert_eq!(config.export_dir, PathBuf::from("reports"));
        assert_eq!(config.layout().sheet_name, "Regression");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(temp.path().join("nope.yaml").as_path())).is_err());
    }
}
