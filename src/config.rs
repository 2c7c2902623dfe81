//! Configuration management for Atlas Fetcher
//!
//! This module provides layered configuration loading: built-in defaults,
//! then a TOML file, then environment variables. Command-line flags are
//! applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::models::{DatasetParams, DatasetSubtype, ProtocolFamily};
use crate::app::processor::MetricThreshold;
use crate::app::{ClientConfig, CoordinatorConfig, StorageConfig};
use crate::constants::{atlas, env, limits, logging, workers};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Record filter settings as they appear in the `[filter]` section
pub type FilterConfig = MetricThreshold;

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "atlas-fetcher.toml";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Raw and parsed storage roots
    pub storage: StorageConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Dataset selection and concurrency
    pub pipeline: PipelineConfig,
    /// Record filter
    pub filter: FilterConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Client settings; durations are written as `"30s"`, `"2m"`, ...
pub type ClientConfigToml = ClientConfig;

/// Dataset selection and worker pool size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent workers per phase
    pub worker_count: usize,
    /// Archive server root
    pub base_url: String,
    /// Measurement kind prefixed to archive names
    pub measurement: String,
    pub protocol: ProtocolFamily,
    pub subtype: DatasetSubtype,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let params = DatasetParams::default();
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            base_url: atlas::BASE_URL.to_string(),
            measurement: params.measurement,
            protocol: params.protocol,
            subtype: params.subtype,
        }
    }
}

impl PipelineConfig {
    pub fn params(&self) -> DatasetParams {
        DatasetParams::new(self.protocol, self.subtype).with_measurement(&self.measurement)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, CoordinatorConfig) {
        let coordinator = CoordinatorConfig::default()
            .with_worker_count(self.pipeline.worker_count)
            .with_params(self.pipeline.params())
            .with_base_url(&self.pipeline.base_url)
            .with_storage(self.storage.clone())
            .with_filter(self.filter.clone());
        (self.client.clone(), coordinator)
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied afterwards by the caller.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            debug!("Loading config from: {}", path.display());
            config = Self::load_from_file(&path).await?;
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `ATLAS_FETCHER_*` environment variables
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(env::BASE_URL) {
            debug!("{} overrides base URL", env::BASE_URL);
            self.pipeline.base_url = base_url;
        }

        if let Some(value) = lookup(env::WORKERS) {
            self.pipeline.worker_count = value.trim().parse().map_err(|_| {
                ConfigError::invalid_value(env::WORKERS, &value, "expected a positive integer")
            })?;
        }

        Ok(())
    }

    /// Write a commented default configuration file
    ///
    /// Uses the per-user location when `path` is `None`. An existing file is
    /// only replaced when `force` is set.
    pub async fn initialize(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(AppError::generic(format!(
                "Configuration file already exists: {} (use --force to overwrite)",
                config_path.display()
            )));
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content()).await?;
        info!("Wrote configuration file: {}", config_path.display());
        Ok(config_path)
    }

    /// Render the configuration as TOML
    pub fn render(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Ok(user_path) = Self::get_default_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join("atlas-fetcher").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Atlas Fetcher Configuration
# Every setting is optional; missing values fall back to the defaults shown.

[storage]
# Raw .bz2 archives, named after the remote file
raw_dir = "{raw_dir}"
# Parsed JSON documents, one per archive
parsed_dir = "{parsed_dir}"

[client]
connect_timeout = "30s"
# Longest pause between two body chunks before a download is abandoned
read_timeout = "30s"
# Whole-request limit; leave unset for multi-gigabyte archives
# request_timeout = "1h"
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = 16
rate_limit_rps = {rps}

[pipeline]
worker_count = {workers}
base_url = "{base_url}"
measurement = "{measurement}"
protocol = "v4"      # v4 or v6
subtype = "builtin"  # builtin or udm

[filter]
# Records whose metric is strictly greater than the threshold are kept.
# A missing metric counts as 0.
metric_field = "avg"
threshold = 50.0

[logging]
level = "info"  # error, warn, info, debug, trace
"#,
            raw_dir = crate::constants::files::DEFAULT_RAW_DIR,
            parsed_dir = crate::constants::files::DEFAULT_PARSED_DIR,
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            workers = workers::DEFAULT_WORKER_COUNT,
            base_url = atlas::BASE_URL,
            measurement = atlas::DEFAULT_MEASUREMENT,
        )
    }
}
