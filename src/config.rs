//! Configuration module for the ad analytics engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ADLENS_` and use double
//! underscores to separate nested levels:
//! - `ADLENS_SIMULATOR__INTERVAL_MS=250` sets `simulator.interval_ms`
//! - `ADLENS_MATCHING__NEIGHBORS=5` sets `matching.neighbors`
//! - `ADLENS_LOGGING__LEVEL=debug` sets `logging.level`

use crate::error::{EngineError, EngineResult};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the project settings file
pub const CONFIG_DIR: &str = ".adlens";

const ENV_PREFIX: &str = "ADLENS_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Traffic simulator settings
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Audience matching and ad selection settings
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Milliseconds between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound of impressions generated per ad per tick
    #[serde(default = "default_max_impressions")]
    pub max_impressions_per_tick: u32,

    /// Probability that a viewable impression is clicked
    #[serde(default = "default_click_through_rate")]
    pub click_through_rate: f64,

    /// Probability that an impression is viewable
    #[serde(default = "default_viewability_rate")]
    pub viewability_rate: f64,

    /// Centre of the dwell time distribution, in seconds
    #[serde(default = "default_dwell_mean_secs")]
    pub dwell_mean_secs: f64,

    /// Fixed RNG seed for reproducible traffic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Vector index holding physician profile embeddings
    #[serde(default = "default_physician_index")]
    pub physician_index: String,

    /// Vector index holding ad category label embeddings
    #[serde(default = "default_ad_category_index")]
    pub ad_category_index: String,

    /// Nearest physicians returned per match
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,

    /// Minimum question similarity before an ad is shown
    #[serde(default = "default_question_threshold")]
    pub question_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded model files are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_max_impressions() -> u32 {
    10
}
fn default_click_through_rate() -> f64 {
    0.03
}
fn default_viewability_rate() -> f64 {
    0.55
}
fn default_dwell_mean_secs() -> f64 {
    2.0
}
fn default_physician_index() -> String {
    "mock_physician_profiles".to_string()
}
fn default_ad_category_index() -> String {
    "mock_ad_cat_data".to_string()
}
fn default_neighbors() -> usize {
    3
}
fn default_question_threshold() -> f32 {
    0.1
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            simulator: SimulatorConfig::default(),
            matching: MatchingConfig::default(),
            embedding: EmbeddingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_impressions_per_tick: default_max_impressions(),
            click_through_rate: default_click_through_rate(),
            viewability_rate: default_viewability_rate(),
            dwell_mean_secs: default_dwell_mean_secs(),
            seed: None,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            physician_index: default_physician_index(),
            ad_category_index: default_ad_category_index(),
            neighbors: default_neighbors(),
            question_threshold: default_question_threshold(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SimulatorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Reject values the simulator cannot sample from
    pub fn validate(&self) -> EngineResult<()> {
        if self.interval_ms == 0 {
            return Err(EngineError::validation(
                "simulator.interval_ms",
                "must be greater than zero",
            ));
        }
        if self.max_impressions_per_tick == 0 {
            return Err(EngineError::validation(
                "simulator.max_impressions_per_tick",
                "must be at least 1",
            ));
        }
        check_probability("simulator.click_through_rate", self.click_through_rate)?;
        check_probability("simulator.viewability_rate", self.viewability_rate)?;
        if !self.dwell_mean_secs.is_finite() || self.dwell_mean_secs < 0.0 {
            return Err(EngineError::validation(
                "simulator.dwell_mean_secs",
                format!("expected a non-negative number, got {}", self.dwell_mean_secs),
            ));
        }
        Ok(())
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.neighbors == 0 {
            return Err(EngineError::validation(
                "matching.neighbors",
                "must be at least 1",
            ));
        }
        if !self.question_threshold.is_finite() {
            return Err(EngineError::validation(
                "matching.question_threshold",
                "must be a finite number",
            ));
        }
        if self.physician_index.trim().is_empty() || self.ad_category_index.trim().is_empty() {
            return Err(EngineError::validation(
                "matching",
                "index names must not be empty",
            ));
        }
        Ok(())
    }
}

impl EmbeddingConfig {
    /// Model cache directory, defaulting to the user cache dir
    pub fn models_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("adlens").join("models"))
                .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
        })
    }
}

fn check_probability(field: &'static str, value: f64) -> EngineResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::validation(
            field,
            format!("expected a probability in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by walking up from the current directory
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Validate every section
    pub fn validate(&self) -> EngineResult<()> {
        self.simulator.validate()?;
        self.matching.validate()?;
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write a default settings file under `.adlens/`
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if config_path.exists() && !force {
            return Err(format!(
                "Configuration file already exists at {}. Use --force to overwrite",
                config_path.display()
            )
            .into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
