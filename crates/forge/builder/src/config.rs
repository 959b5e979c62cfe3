//! Configuration for the forge pipeline

use forge_sandbox::SandboxConfig;
use forge_testgen::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Retry policy for generation calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Test-case generation executor
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Custom judge scripts
    #[serde(default)]
    pub judge: JudgeSettings,

    /// Interpreter limits
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Cross-validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Builder admission
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Caller rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retry and backoff for generation calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Custom judge script settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeSettings {
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            script_timeout_ms: default_script_timeout_ms(),
        }
    }
}

impl JudgeSettings {
    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }
}

/// Cross-validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Survivor count below which a run is degraded
    #[serde(default = "default_min_test_cases")]
    pub min_test_cases: usize,

    /// Timeout of one solution call
    #[serde(default = "default_solution_timeout_ms")]
    pub solution_timeout_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_test_cases: default_min_test_cases(),
            solution_timeout_ms: default_solution_timeout_ms(),
        }
    }
}

impl ValidationConfig {
    pub fn solution_timeout(&self) -> Duration {
        Duration::from_millis(self.solution_timeout_ms)
    }
}

/// Builder admission settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default = "default_max_concurrent_builders")]
    pub max_concurrent_builders: usize,

    /// How long finished builders stay queryable before they are pruned
    #[serde(default = "default_finished_retention_secs")]
    pub finished_retention_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_builders: default_max_concurrent_builders(),
            finished_retention_secs: default_finished_retention_secs(),
        }
    }
}

impl AdmissionConfig {
    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_secs)
    }
}

/// Sliding-window rate limit per (subject, operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// One JSON document per problem
    Json {
        /// Output directory
        dir: PathBuf,
    },
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    8000
}

fn default_script_timeout_ms() -> u64 {
    2000
}

fn default_min_test_cases() -> usize {
    6
}

fn default_solution_timeout_ms() -> u64 {
    2000
}

fn default_max_concurrent_builders() -> usize {
    5
}

fn default_finished_retention_secs() -> u64 {
    3600
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_requests() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ForgeConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `FORGE_`-prefixed environment variables (`FORGE_RETRY__MAX_RETRIES=5`)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ForgeConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FORGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// A configuration for tests: no backoff, short timeouts
    pub fn for_tests() -> Self {
        Self {
            retry: RetryConfig {
                initial_backoff_ms: 0,
                max_backoff_ms: 0,
                ..Default::default()
            },
            executor: ExecutorConfig::default().with_timeout(10),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForgeConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.executor.timeout_secs, 30);
        assert_eq!(config.validation.min_test_cases, 6);
        assert_eq!(config.admission.max_concurrent_builders, 5);
        assert_eq!(config.admission.finished_retention_secs, 3600);
        assert!(matches!(config.storage, StorageConfig::Memory));
    }

    #[test]
    fn test_partial_sections() {
        let config: ForgeConfig = serde_json::from_str(
            r#"{"retry": {"max_retries": 1}, "storage": {"type": "json", "dir": "/tmp/forge"}}"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.initial_backoff_ms, 1000);
        assert_eq!(
            config.storage,
            StorageConfig::Json {
                dir: PathBuf::from("/tmp/forge")
            }
        );
    }

    #[test]
    fn test_load_without_file() {
        let config = ForgeConfig::load(None).unwrap();
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.judge.script_timeout(), Duration::from_secs(2));
    }
}
