//! Two-phase pipeline orchestration
//!
//! The coordinator turns a date window into per-day outcomes:
//!
//! 1. **Pre-flight**: validate configuration and create both storage roots.
//!    This is the only stage that can fail the run.
//! 2. **Fetch**: one fetch task per day through a bounded [`WorkerPool`].
//! 3. **Process**: once every fetch has finished, one process task per
//!    locally available archive through a second pool of the same width.
//!
//! Individual failures, including panicking tasks, are recorded as outcomes
//! and never abort the batch.
//!
//! # Architecture
//!
//! - [`config`] - Configuration structures and validation
//! - [`stats`] - Outcome counting and the session result
//! - [`progress`] - Progress events for front ends
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use atlas_fetcher::app::{AtlasClient, Coordinator, CoordinatorConfig, DateWindow};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(AtlasClient::new()?);
//! let config = CoordinatorConfig::default().with_worker_count(4);
//! let window = DateWindow::parse("2025-10-01", "2025-10-07")?;
//!
//! let result = Coordinator::new(config, client).execute(&window).await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod progress;
pub mod stats;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::client::AtlasClient;
use crate::app::fetcher::ArchiveFetcher;
use crate::app::models::{ArchiveDescriptor, FetchOutcome, ProcessOutcome};
use crate::app::processor::{ArchiveProcessor, RecordFilter};
use crate::app::window::DateWindow;
use crate::app::worker::WorkerPool;
use crate::errors::{ConfigResult, Result};

pub use config::CoordinatorConfig;
pub use progress::{Phase, ProgressEvent, ProgressReporter};
pub use stats::{format_duration, PipelineStats, SessionResult};

/// Main coordinator for a fetch-then-process run
#[derive(Debug)]
pub struct Coordinator {
    config: CoordinatorConfig,
    client: Arc<AtlasClient>,
    processor_filter: Option<Arc<dyn RecordFilter>>,
    progress: ProgressReporter,
}

impl Coordinator {
    /// Create a coordinator using the configured threshold filter
    pub fn new(config: CoordinatorConfig, client: Arc<AtlasClient>) -> Self {
        Self {
            config,
            client,
            processor_filter: None,
            progress: ProgressReporter::disabled(),
        }
    }

    /// Replace the configured threshold filter with a custom one
    ///
    /// The projected metric is still read from `filter.metric_field`.
    pub fn with_filter(mut self, filter: Arc<dyn RecordFilter>) -> Self {
        self.processor_filter = Some(filter);
        self
    }

    /// Send progress events to `sender` while executing
    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = ProgressReporter::new(sender);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Descriptors a run over `window` would fetch, without any I/O
    pub fn plan(&self, window: &DateWindow) -> ConfigResult<Vec<ArchiveDescriptor>> {
        self.config.validate()?;
        let locator = self.config.locator()?;
        Ok(window.days().map(|day| locator.locate(day)).collect())
    }

    /// Run both phases over `window`
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when pre-flight validation or storage
    /// preparation fails; nothing is fetched in that case. Per-item
    /// failures are reported inside the returned [`SessionResult`].
    pub async fn execute(&self, window: &DateWindow) -> Result<SessionResult> {
        let started = Instant::now();

        let descriptors = self.plan(window)?;
        self.config.storage.prepare().await?;
        let pool = WorkerPool::new(self.config.worker_count)?;

        let mut stats = PipelineStats {
            total_days: descriptors.len(),
            ..Default::default()
        };

        info!(
            "Fetching {} archives ({} to {}) with {} workers",
            descriptors.len(),
            window.start(),
            window.end(),
            pool.worker_count()
        );
        let (fetches, fetch_peak) = self.fetch_phase(&pool, descriptors).await;
        stats.record_fetches(&fetches);
        stats.fetch_peak_in_flight = fetch_peak;
        info!(
            "Fetch phase complete: {} fetched, {} already present, {} not found, {} failed",
            stats.fetched, stats.fetch_already_present, stats.not_found, stats.transient_errors
        );

        let processes = if self.config.fetch_only {
            debug!("Fetch-only run, skipping process phase");
            Vec::new()
        } else {
            let inputs: Vec<_> = fetches
                .iter()
                .filter_map(|(day, outcome)| {
                    outcome.local_path().map(|path| (*day, path.to_path_buf()))
                })
                .collect();

            info!("Processing {} archives", inputs.len());
            let (processes, process_peak) = self.process_phase(&pool, inputs).await;
            stats.record_processes(&processes);
            stats.process_peak_in_flight = process_peak;
            info!(
                "Process phase complete: {} processed, {} already present, {} failed",
                stats.processed, stats.process_already_present, stats.process_failed
            );
            processes
        };

        let result = SessionResult {
            fetches,
            processes,
            stats,
            fetch_only: self.config.fetch_only,
            total_duration: started.elapsed(),
        };
        info!(
            "Run completed in {}",
            format_duration(result.total_duration)
        );
        Ok(result)
    }

    async fn fetch_phase(
        &self,
        pool: &WorkerPool,
        descriptors: Vec<ArchiveDescriptor>,
    ) -> (Vec<(NaiveDate, FetchOutcome)>, usize) {
        let days: Vec<NaiveDate> = descriptors.iter().map(|d| d.day).collect();
        self.progress
            .send(ProgressEvent::PhaseStarted {
                phase: Phase::Fetch,
                total: days.len(),
            })
            .await;

        let fetcher = ArchiveFetcher::new(Arc::clone(&self.client), &self.config.storage.raw_dir);
        let progress = self.progress.clone();
        let run = pool
            .run(descriptors, move |descriptor| {
                let fetcher = fetcher.clone();
                let progress = progress.clone();
                async move {
                    let outcome = fetcher.fetch(&descriptor).await;
                    progress.item_finished(Phase::Fetch, outcome.label()).await;
                    outcome
                }
            })
            .await;

        let mut outcomes = Vec::with_capacity(days.len());
        for (day, result) in days.into_iter().zip(run.results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = FetchOutcome::TransientError(e.to_string());
                    self.progress.item_finished(Phase::Fetch, outcome.label()).await;
                    outcome
                }
            };
            outcomes.push((day, outcome));
        }

        self.progress
            .send(ProgressEvent::PhaseFinished {
                phase: Phase::Fetch,
            })
            .await;
        (outcomes, run.peak_in_flight)
    }

    async fn process_phase(
        &self,
        pool: &WorkerPool,
        inputs: Vec<(NaiveDate, PathBuf)>,
    ) -> (Vec<(NaiveDate, ProcessOutcome)>, usize) {
        let days: Vec<NaiveDate> = inputs.iter().map(|(day, _)| *day).collect();
        self.progress
            .send(ProgressEvent::PhaseStarted {
                phase: Phase::Process,
                total: days.len(),
            })
            .await;

        let processor = self.build_processor();
        let progress = self.progress.clone();
        let run = pool
            .run(inputs, move |(_, raw_path)| {
                let processor = processor.clone();
                let progress = progress.clone();
                async move {
                    let outcome = processor.process(Some(raw_path)).await;
                    progress.item_finished(Phase::Process, outcome.label()).await;
                    outcome
                }
            })
            .await;

        let mut outcomes = Vec::with_capacity(days.len());
        for (day, result) in days.into_iter().zip(run.results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = ProcessOutcome::Failed(e.to_string());
                    self.progress
                        .item_finished(Phase::Process, outcome.label())
                        .await;
                    outcome
                }
            };
            outcomes.push((day, outcome));
        }

        self.progress
            .send(ProgressEvent::PhaseFinished {
                phase: Phase::Process,
            })
            .await;
        (outcomes, run.peak_in_flight)
    }

    fn build_processor(&self) -> ArchiveProcessor {
        let parsed_dir = &self.config.storage.parsed_dir;
        match &self.processor_filter {
            Some(filter) => ArchiveProcessor::with_filter(
                parsed_dir,
                Arc::clone(filter),
                &self.config.filter.metric_field,
            ),
            None => ArchiveProcessor::new(parsed_dir, self.config.filter.clone()),
        }
    }
}
