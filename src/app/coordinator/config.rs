//! Configuration structures for the pipeline coordinator
//!
//! Holds everything a run needs besides the date window: which dataset to
//! fetch, where to store it, how to filter it and how wide the pools are.

use serde::{Deserialize, Serialize};

use crate::app::locator::ArchiveLocator;
use crate::app::models::DatasetParams;
use crate::app::processor::MetricThreshold;
use crate::app::storage::StorageConfig;
use crate::constants::{atlas, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the pipeline coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Number of concurrent workers per phase
    pub worker_count: usize,
    /// Dataset selection
    pub params: DatasetParams,
    /// Root URL of the archive server
    pub base_url: String,
    /// Raw and parsed storage roots
    pub storage: StorageConfig,
    /// Default record filter
    pub filter: MetricThreshold,
    /// Stop after the fetch phase
    pub fetch_only: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            params: DatasetParams::default(),
            base_url: atlas::BASE_URL.to_string(),
            storage: StorageConfig::default(),
            filter: MetricThreshold::default(),
            fetch_only: false,
        }
    }
}

impl CoordinatorConfig {
    /// Set the number of workers per phase
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_params(mut self, params: DatasetParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_filter(mut self, filter: MetricThreshold) -> Self {
        self.filter = filter;
        self
    }

    /// Skip processing after the fetch phase
    pub fn with_fetch_only(mut self, fetch_only: bool) -> Self {
        self.fetch_only = fetch_only;
        self
    }

    /// Locator for the configured server and dataset
    pub fn locator(&self) -> ConfigResult<ArchiveLocator> {
        ArchiveLocator::new(&self.base_url, self.params.clone())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a worker count outside
    /// `1..=MAX_WORKER_COUNT`, an unusable base URL, dataset parameters or
    /// filter
    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker_count == 0 || self.worker_count > workers::MAX_WORKER_COUNT {
            return Err(ConfigError::invalid_value(
                "worker_count",
                self.worker_count,
                &format!("must be between 1 and {}", workers::MAX_WORKER_COUNT),
            ));
        }

        self.locator()?;
        self.filter.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::app::models::{DatasetSubtype, ProtocolFamily};

    #[test]
    fn test_default_config_is_valid() {
        let config = CoordinatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_count, workers::DEFAULT_WORKER_COUNT);
        assert_eq!(config.base_url, atlas::BASE_URL);
        assert!(!config.fetch_only);
    }

    #[test]
    fn test_config_builder_methods() {
        let config = CoordinatorConfig::default()
            .with_worker_count(16)
            .with_params(DatasetParams::new(ProtocolFamily::V6, DatasetSubtype::Udm))
            .with_base_url("http://localhost:8080/data")
            .with_storage(StorageConfig::under(&PathBuf::from("/srv/atlas")))
            .with_filter(MetricThreshold::new("max", 120.0))
            .with_fetch_only(true);

        assert_eq!(config.worker_count, 16);
        assert_eq!(config.params.protocol, ProtocolFamily::V6);
        assert_eq!(config.storage.raw_dir, PathBuf::from("/srv/atlas/raw_dumps"));
        assert_eq!(config.filter.threshold, 120.0);
        assert!(config.fetch_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(CoordinatorConfig::default()
            .with_worker_count(0)
            .validate()
            .is_err());
        assert!(CoordinatorConfig::default()
            .with_worker_count(workers::MAX_WORKER_COUNT + 1)
            .validate()
            .is_err());
        assert!(CoordinatorConfig::default()
            .with_base_url("not a url")
            .validate()
            .is_err());
        assert!(CoordinatorConfig::default()
            .with_params(DatasetParams::default().with_measurement("../etc"))
            .validate()
            .is_err());
    }
}
