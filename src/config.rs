//! Runtime configuration.
//!
//! Loaded from a TOML file when one is given (or `fuel_report.toml` exists in
//! the working directory); every field falls back to the defaults below,
//! which match the Turkish-labelled sheets the tool was built for.

use crate::error::ConfigError;
use crate::types::HighlightToken;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "fuel_report.toml";
pub const DEFAULT_DATA_FILE: &str = "varsayilan_veri.xlsx";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Sheet used when the user does not pick a file.
    pub default_file: PathBuf,
    /// Directory that receives exported CSV tables and the JSON summary.
    pub output_dir: PathBuf,
    /// Field delimiter for `.csv` sources.
    pub csv_delimiter: char,
    pub columns: ColumnMapping,
    /// Ordered brand highlight rules; the first matching pattern wins.
    pub highlights: Vec<HighlightRuleCfg>,
    /// Brand patterns offered in the all-cities matrix view.
    pub matrix_brands: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_file: PathBuf::from(DEFAULT_DATA_FILE),
            output_dir: PathBuf::from("."),
            csv_delimiter: ',',
            columns: ColumnMapping::default(),
            highlights: vec![
                HighlightRuleCfg {
                    pattern: "MOİL".to_string(),
                    token: HighlightToken::Primary,
                },
                HighlightRuleCfg {
                    pattern: "TOTAL".to_string(),
                    token: HighlightToken::Secondary,
                },
            ],
            matrix_brands: vec!["MOİL".to_string(), "TOTAL".to_string()],
        }
    }
}

/// Source sheet header for each required field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub date: String,
    pub price: String,
    pub fuel_type: String,
    pub city: String,
    pub brand: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date: "Tarih".to_string(),
            price: "Fiyat".to_string(),
            fuel_type: "Yakıt Tipi".to_string(),
            city: "İl".to_string(),
            brand: "Marka".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HighlightRuleCfg {
    pub pattern: String,
    pub token: HighlightToken,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// An explicit path must load; otherwise `fuel_report.toml` is used if
    /// present, then the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let implicit = Path::new(CONFIG_FILE_NAME);
        if implicit.is_file() {
            log::info!("Using config file {}", implicit.display());
            return Self::from_path(implicit);
        }
        Ok(Self::default())
    }
}
