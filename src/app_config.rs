use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Where the heritage dataset comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// Completion API settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Worker pool, retry and checkpoint settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Token pricing and run estimates
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Directory for the final enriched dataset
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Dataset source configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceConfig {
    // @field: Remote URL of the JS file holding the dataset
    #[serde(default = "default_source_url")]
    pub url: String,

    // @field: Local file used instead of the URL when set
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    // @field: Name of the constant the array literal is assigned to
    #[serde(default = "default_array_name")]
    pub array_name: String,

    // @field: Timeout seconds for the initial fetch
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            local_path: None,
            array_name: default_array_name(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// OpenAI-compatible completion API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Service URL (chat/completions is appended)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Max output tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    // @field: Reasoning effort hint, omitted from requests when None
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: Option<String>,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            reasoning_effort: default_reasoning_effort(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// An unset or blank variable is a fatal startup condition.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential(self.api_key_env.clone())),
        }
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Number of concurrent workers, the hard bound on in-flight API calls
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Total attempts per job (first call included)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the second attempt, in seconds
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: f64,

    /// Factor applied to the delay after every failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Write a checkpoint each time the success count reaches a multiple of this
    #[serde(default = "default_backup_interval")]
    pub backup_interval: usize,

    /// Log a progress line every this many processed jobs
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Directory receiving checkpoint files
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_retries: default_max_retries(),
            initial_backoff_secs: default_initial_backoff_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            backup_interval: default_backup_interval(),
            progress_interval: default_progress_interval(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

/// Pricing used for cost reporting and the pre-run estimate
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default = "default_usd_per_million_tokens")]
    pub usd_per_million_tokens: f64,

    #[serde(default = "default_estimated_tokens_per_job")]
    pub estimated_tokens_per_job: u64,

    #[serde(default = "default_estimated_secs_per_job")]
    pub estimated_secs_per_job: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            usd_per_million_tokens: default_usd_per_million_tokens(),
            estimated_tokens_per_job: default_estimated_tokens_per_job(),
            estimated_secs_per_job: default_estimated_secs_per_job(),
        }
    }
}

impl PricingConfig {
    /// Dollar cost of a token count
    pub fn cost_of(&self, tokens: u64) -> f64 {
        tokens as f64 / 1_000_000.0 * self.usd_per_million_tokens
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_url() -> String {
    "https://raw.githubusercontent.com/yuyongkim/Korean_Heritage/main/js/heritage-data.js".to_string()
}

fn default_array_name() -> String {
    "HERITAGE_DATA".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_endpoint() -> String {
    "https://api.upstage.ai/v1/solar".to_string()
}

fn default_model() -> String {
    "solar-pro2".to_string()
}

fn default_api_key_env() -> String {
    "UPSTAGE_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_reasoning_effort() -> Option<String> {
    Some("high".to_string())
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_workers() -> usize {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_secs() -> f64 {
    2.0
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_backup_interval() -> usize {
    100
}

fn default_progress_interval() -> usize {
    50
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_usd_per_million_tokens() -> f64 {
    0.30
}

fn default_estimated_tokens_per_job() -> u64 {
    1500
}

fn default_estimated_secs_per_job() -> f64 {
    6.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load a configuration file, or write and return the defaults when it does not exist
    pub fn load_or_create(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Failed to open config file {:?}: {}", path, e))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;
            Ok(config)
        } else {
            log::warn!("Config file not found at {:?}, creating default config.", path);
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)?;
            std::fs::write(path, config_json)
                .map_err(|e| anyhow!("Failed to write default config to {:?}: {}", path, e))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.workers",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.batch.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.max_retries",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.batch.backup_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.backup_interval",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.batch.progress_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.progress_interval",
                reason: "must be at least 1".to_string(),
            });
        }

        if !(self.batch.initial_backoff_secs >= 0.0 && self.batch.initial_backoff_secs.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "batch.initial_backoff_secs",
                reason: format!("{} is not a non-negative number", self.batch.initial_backoff_secs),
            });
        }

        if !(self.batch.backoff_multiplier >= 1.0 && self.batch.backoff_multiplier.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "batch.backoff_multiplier",
                reason: format!("{} is below 1.0", self.batch.backoff_multiplier),
            });
        }

        Url::parse(&self.provider.endpoint)
            .map_err(|source| ConfigError::InvalidUrl { field: "provider.endpoint", source })?;

        if self.source.local_path.is_none() {
            Url::parse(&self.source.url)
                .map_err(|source| ConfigError::InvalidUrl { field: "source.url", source })?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig::default(),
            provider: ProviderConfig::default(),
            batch: BatchConfig::default(),
            pricing: PricingConfig::default(),
            output_dir: default_output_dir(),
            log_level: LogLevel::default(),
        }
    }
}
