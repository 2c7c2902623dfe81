//! Core application logic for Atlas Fetcher
//!
//! This module contains the pipeline components: date windows, archive
//! location, the HTTP client and fetcher, the streaming processor, the
//! bounded worker pool and the coordinator that ties both phases together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use atlas_fetcher::app::{
//!     ArchiveFetcher, ArchiveLocator, AtlasClient, DatasetParams, DateWindow,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(AtlasClient::new()?);
//! let locator = ArchiveLocator::atlas(DatasetParams::default())?;
//! let fetcher = ArchiveFetcher::new(client, "data/raw_dumps");
//!
//! let window = DateWindow::parse("2025-10-01", "2025-10-03")?;
//! for day in window.days() {
//!     let outcome = fetcher.fetch(&locator.locate(day)).await;
//!     println!("{}: {}", day, outcome.label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod fetcher;
pub mod locator;
pub mod models;
pub mod processor;
pub mod storage;
pub mod window;
pub mod worker;

// Re-export main public API
pub use client::{AtlasClient, ClientConfig};
pub use coordinator::{
    Coordinator, CoordinatorConfig, Phase, PipelineStats, ProgressEvent, SessionResult,
};
pub use fetcher::ArchiveFetcher;
pub use locator::ArchiveLocator;
pub use models::{
    ArchiveDescriptor, DatasetParams, DatasetSubtype, FetchOutcome, FilteredRecord,
    ProcessOutcome, ProcessReport, ProtocolFamily, Record,
};
pub use processor::{ArchiveProcessor, MetricThreshold, RecordFilter, RecordReader};
pub use storage::StorageConfig;
pub use window::DateWindow;
pub use worker::{PoolRun, WorkerPool};
