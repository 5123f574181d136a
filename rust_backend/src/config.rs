//! Analytics configuration file support.
//!
//! This module reads report and trend settings from TOML configuration
//! files. Every setting has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithms::Period;
use crate::error::{AnalyticsError, AnalyticsResult};

/// Analytics configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub trend: TrendSettings,
}

/// Ranking settings for the per-branch questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Rank cut-off used by "best per branch" questions.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Year-over-year revenue comparison settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSettings {
    #[serde(default = "default_base_year")]
    pub base_year: i32,
    #[serde(default = "default_comparison_year")]
    pub comparison_year: i32,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_top_k() -> usize {
    1
}

fn default_base_year() -> i32 {
    2022
}

fn default_comparison_year() -> i32 {
    2023
}

fn default_limit() -> usize {
    5
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            base_year: default_base_year(),
            comparison_year: default_comparison_year(),
            limit: default_limit(),
        }
    }
}

impl TrendSettings {
    pub fn base_period(&self) -> Period {
        Period::Year(self.base_year)
    }

    pub fn comparison_period(&self) -> Period {
        Period::Year(self.comparison_year)
    }
}

impl AnalyticsConfig {
    /// Load analytics configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(AnalyticsConfig)` if successful
    /// * `Err(AnalyticsError::Configuration)` if the file cannot be read,
    ///   parsed, or holds invalid values
    pub fn from_file<P: AsRef<Path>>(path: P) -> AnalyticsResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> AnalyticsResult<Self> {
        let config: AnalyticsConfig = toml::from_str(content).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load analytics configuration from the default location.
    ///
    /// Searches for `analytics.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> AnalyticsResult<Self> {
        let search_paths = [
            PathBuf::from("analytics.toml"),
            PathBuf::from("rust_backend/analytics.toml"),
            PathBuf::from("../analytics.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(AnalyticsError::Configuration(
            "No analytics.toml found in standard locations".to_string(),
        ))
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.report.top_k == 0 {
            return Err(AnalyticsError::Configuration(
                "report.top_k must be at least 1".to_string(),
            ));
        }
        if self.trend.base_year == self.trend.comparison_year {
            return Err(AnalyticsError::Configuration(format!(
                "trend.base_year and trend.comparison_year must differ (both {})",
                self.trend.base_year
            )));
        }
        Ok(())
    }
}
