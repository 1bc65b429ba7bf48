//! Daemon configuration -- sampling cadence, retention, scoring and forecast knobs.

use crate::detect::ScoringConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub scoring: ScoringConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Seconds between sampling ticks.
    pub interval_secs: u64,
    /// Maximum samples retained per process id (ring buffer).
    pub retention: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            // One hour of history at the 5s cadence.
            retention: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Minimum history points before a forecast is attempted.
    pub min_points: usize,
    /// Number of future points to predict.
    pub horizon: usize,
    /// Seconds between predicted points. Matches the sampling cadence.
    pub step_secs: u64,
    /// Uncertainty interval width, e.g. 0.8 for an 80% interval.
    pub interval_width: f64,
    /// Upper bound on model fitting time before the request resolves to Error.
    pub timeout_ms: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            horizon: 12,
            step_secs: 5,
            interval_width: 0.8,
            timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: Config = toml::from_str(&content)
                    .with_context(|| format!("failed to parse config at {}", path.display()))?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(_) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Config::default())
            }
        }
    }
}
