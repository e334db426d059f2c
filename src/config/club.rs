//! Club configuration loading from config.toml
//!
//! The configuration file declares the membership categories, the named rate presets
//! used when initializing a dues year, and the scalar annual membership amount. These
//! values seed the database on `setup`; afterwards the ledger reads them from storage.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Payment settings
    #[serde(default)]
    pub payments: PaymentsConfig,
    /// Membership categories to seed
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Month-range rate presets to seed
    #[serde(default)]
    pub rate_presets: Vec<RatePresetConfig>,
}

/// Scalar payment settings
#[derive(Debug, Default, Deserialize)]
pub struct PaymentsConfig {
    /// Amount charged for a full annual payment
    pub annual_amount: Option<f64>,
}

/// Configuration for a single category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// Whether members are assigned to it automatically by age
    #[serde(default)]
    pub is_age_based: bool,
    /// Lower age bound, inclusive
    pub min_age: Option<i32>,
    /// Upper age bound, inclusive
    pub max_age: Option<i32>,
}

/// Configuration for a rate preset
#[derive(Debug, Deserialize, Clone)]
pub struct RatePresetConfig {
    /// Preset name
    pub name: String,
    /// First month covered (1-12)
    pub start_month: i32,
    /// Last month covered (1-12)
    pub end_month: i32,
    /// Monthly rate for the covered months
    pub rate: f64,
}

/// Loads club configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses club configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads club configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_club_config() {
        let toml_str = r#"
            [payments]
            annual_amount = 24000.0

            [[categories]]
            name = "Junior"
            is_age_based = true
            min_age = 0
            max_age = 17

            [[categories]]
            name = "Honorary"

            [[rate_presets]]
            name = "season"
            start_month = 1
            end_month = 12
            rate = 2500.0
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.payments.annual_amount, Some(24000.0));
        assert_eq!(config.categories.len(), 2);
        assert!(config.categories[0].is_age_based);
        assert_eq!(config.categories[0].max_age, Some(17));
        assert!(!config.categories[1].is_age_based);
        assert_eq!(config.categories[1].min_age, None);
        assert_eq!(config.rate_presets[0].rate, 2500.0);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.categories.is_empty());
        assert!(config.rate_presets.is_empty());
        assert!(config.payments.annual_amount.is_none());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = parse_config("[[categories]]\nname = 5");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
