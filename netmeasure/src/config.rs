//! Configuration shared by the measurement tools.
//!
//! Values come from an optional `netmeasure` file (any format the `config`
//! crate understands, typically `netmeasure.toml`) in the working directory.
//! Positional command-line arguments take precedence over the file.

use crate::aggregator::RateMeanPolicy;
use serde::{Deserialize, Serialize};

/// Base name of the optional configuration file
pub const CONFIG_FILE_NAME: &str = "netmeasure";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub intervals: IntervalConfig,
    #[serde(default)]
    pub rtt: RttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalConfig {
    /// Bucket length in seconds when none is given on the command line
    #[serde(default = "default_block_duration")]
    pub block_duration_secs: f64,

    /// Number of buckets printed by the fixed-interval tool
    #[serde(default = "default_fixed_count")]
    pub fixed_count: usize,

    /// Rate mean of the per-interval tool: `over_samples`, `over_duration`
    /// or `sample_sum_over_duration`
    #[serde(default = "default_per_interval_rate_mean")]
    pub per_interval_rate_mean: RateMeanPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RttConfig {
    /// Percentiles reported by `rtt-stats`
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<u8>,

    /// Output path used by `sort-rtt` when none is given
    #[serde(default = "default_sorted_output")]
    pub sorted_output: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_block_duration() -> f64 {
    150.0
}

fn default_fixed_count() -> usize {
    4
}

fn default_per_interval_rate_mean() -> RateMeanPolicy {
    RateMeanPolicy::OverSamples
}

fn default_percentiles() -> Vec<u8> {
    vec![50, 90, 95, 99]
}

fn default_sorted_output() -> String {
    "sorted_rtt.txt".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            block_duration_secs: default_block_duration(),
            fixed_count: default_fixed_count(),
            per_interval_rate_mean: default_per_interval_rate_mean(),
        }
    }
}

impl Default for RttConfig {
    fn default() -> Self {
        Self {
            percentiles: default_percentiles(),
            sorted_output: default_sorted_output(),
        }
    }
}

impl ToolConfig {
    /// Load from the default `netmeasure` file in the working directory
    pub fn load() -> crate::Result<Self> {
        Self::load_from(CONFIG_FILE_NAME)
    }

    /// Load from a file base name (extension optional); a missing file yields defaults
    pub fn load_from(name: &str) -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}. Using defaults.", e);
            Self::default()
        })
    }
}
