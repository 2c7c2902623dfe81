//! Prelude module for Atlas Fetcher Library
//!
//! Re-exports the items needed for a typical integration with a single
//! `use atlas_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use atlas_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(AtlasClient::new()?);
//!     let config = CoordinatorConfig::default().with_worker_count(4);
//!     let window = DateWindow::parse("2025-10-01", "2025-10-07")?;
//!
//!     let result = Coordinator::new(config, client).execute(&window).await?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    ArchiveDescriptor,
    ArchiveFetcher,
    ArchiveLocator,
    ArchiveProcessor,
    AtlasClient,
    ClientConfig,
    // Core orchestration
    Coordinator,
    CoordinatorConfig,
    DatasetParams,
    DatasetSubtype,
    DateWindow,
    // Outcomes
    FetchOutcome,
    FilteredRecord,
    MetricThreshold,
    PipelineStats,
    ProcessOutcome,
    ProcessReport,
    ProtocolFamily,
    Record,
    RecordFilter,
    SessionResult,
    StorageConfig,
    WorkerPool,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{ATLAS_BASE_URL, DEFAULT_WORKER_COUNT, USER_AGENT};

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let coordinator_config = CoordinatorConfig::default();
        let _client_config = ClientConfig::default();
        let _storage = StorageConfig::default();

        assert_eq!(coordinator_config.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(coordinator_config.base_url, ATLAS_BASE_URL);
        assert!(USER_AGENT.contains("Atlas-Fetcher"));
    }

    #[test]
    fn test_custom_filter_through_prelude() {
        let filter: Arc<dyn RecordFilter> = Arc::new(|record: &Record| record.contains_key("avg"));
        let mut record = Record::new();
        assert!(!filter.accept(&record));
        record.insert("avg".to_string(), serde_json::json!(1.0));
        assert!(filter.accept(&record));
    }
}
