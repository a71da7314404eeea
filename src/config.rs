use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::compare::Metric;
use crate::eventlog::fields::DEFAULT_EXECUTION_ID_PROPERTY;

/// Top-level configuration. Every field has a default, so the file is
/// optional and may be partial.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Logging verbosity (trace, debug, info, warn, error). Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Event log analysis settings.
    #[serde(default)]
    pub analyze: AnalyzeConfig,

    /// CSV comparison settings.
    #[serde(default)]
    pub compare: CompareConfig,
}

/// Event log analysis settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeConfig {
    /// Job property holding the SQL execution id. Default: "spark.sql.execution.id".
    #[serde(default = "default_execution_id_property")]
    pub execution_id_property: String,
}

/// Settings for comparing two configurations' analysis CSVs.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareConfig {
    /// Only rows whose description contains this are compared. Default: "benchmark q".
    #[serde(default = "default_description_prefix")]
    pub description_prefix: String,

    /// Stripped from the start of a description to form the query label.
    /// Default: "benchmark ".
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: String,

    /// Stripped from the end of a description to form the query label.
    /// Default: "-v2.4".
    #[serde(default = "default_strip_suffix")]
    pub strip_suffix: String,

    /// Keep only queries whose target total time exceeds this many seconds.
    /// Default: 0.
    #[serde(default)]
    pub longer_than: f64,

    /// Metric used for the relative speedup table. Default: total_time.
    #[serde(default)]
    pub metric: Metric,
}

// --- Default value functions ---

fn default_log_level() -> String {
    "info".to_string()
}

fn default_execution_id_property() -> String {
    DEFAULT_EXECUTION_ID_PROPERTY.to_string()
}

fn default_description_prefix() -> String {
    "benchmark q".to_string()
}

fn default_strip_prefix() -> String {
    "benchmark ".to_string()
}

fn default_strip_suffix() -> String {
    "-v2.4".to_string()
}

// --- Default trait impls ---

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            analyze: AnalyzeConfig::default(),
            compare: CompareConfig::default(),
        }
    }
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            execution_id_property: default_execution_id_property(),
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            description_prefix: default_description_prefix(),
            strip_prefix: default_strip_prefix(),
            strip_suffix: default_strip_suffix(),
            longer_than: 0.0,
            metric: Metric::default(),
        }
    }
}

// --- Validation and loading ---

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            bail!("log_level must not be empty");
        }

        if self.analyze.execution_id_property.trim().is_empty() {
            bail!("analyze.execution_id_property must not be empty");
        }

        self.compare.validate()
    }
}

impl CompareConfig {
    /// Validate comparison settings; also used after CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if self.description_prefix.is_empty() {
            bail!("compare.description_prefix must not be empty");
        }

        if !self.longer_than.is_finite() || self.longer_than < 0.0 {
            bail!(
                "compare.longer_than must be a non-negative number of seconds, got {}",
                self.longer_than
            );
        }

        Ok(())
    }
}
