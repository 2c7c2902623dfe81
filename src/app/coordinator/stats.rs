//! Run statistics and the final session result
//!
//! Counts are derived from the per-item outcome lists after each phase, so
//! every reported number can be traced back to an individual day.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::models::{FetchOutcome, ProcessOutcome};

/// Aggregated counts for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Days in the window
    pub total_days: usize,
    pub fetched: usize,
    pub fetch_already_present: usize,
    pub not_found: usize,
    pub transient_errors: usize,
    pub processed: usize,
    pub process_already_present: usize,
    pub process_failed: usize,
    /// Non-blank lines read across all processed archives
    pub lines_read: u64,
    pub records_kept: u64,
    pub malformed_lines: u64,
    pub fetch_peak_in_flight: usize,
    pub process_peak_in_flight: usize,
}

impl PipelineStats {
    /// Count fetch outcomes
    pub fn record_fetches(&mut self, fetches: &[(NaiveDate, FetchOutcome)]) {
        for (_, outcome) in fetches {
            match outcome {
                FetchOutcome::Fetched(_) => self.fetched += 1,
                FetchOutcome::AlreadyPresent(_) => self.fetch_already_present += 1,
                FetchOutcome::NotFound { .. } => self.not_found += 1,
                FetchOutcome::TransientError(_) => self.transient_errors += 1,
            }
        }
    }

    /// Count process outcomes and sum their line counters
    pub fn record_processes(&mut self, processes: &[(NaiveDate, ProcessOutcome)]) {
        for (_, outcome) in processes {
            match outcome {
                ProcessOutcome::Processed(report) => {
                    self.processed += 1;
                    self.lines_read += report.lines_read;
                    self.records_kept += report.records_kept;
                    self.malformed_lines += report.malformed_lines;
                }
                ProcessOutcome::AlreadyPresent(_) => self.process_already_present += 1,
                ProcessOutcome::Failed(_) => self.process_failed += 1,
            }
        }
    }

    /// Archives available locally after the fetch phase
    pub fn available(&self) -> usize {
        self.fetched + self.fetch_already_present
    }

    /// Items that failed for reasons other than expected absence
    pub fn failures(&self) -> usize {
        self.transient_errors + self.process_failed
    }
}

/// Final result of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Fetch outcome for every day in the window, in day order
    pub fetches: Vec<(NaiveDate, FetchOutcome)>,
    /// Process outcome for every archive that was available, in day order
    pub processes: Vec<(NaiveDate, ProcessOutcome)>,
    pub stats: PipelineStats,
    /// Whether the process phase was skipped
    pub fetch_only: bool,
    /// Time taken for the entire run
    pub total_duration: Duration,
}

impl SessionResult {
    /// Check if any item failed (absent archives do not count)
    pub fn has_failures(&self) -> bool {
        self.stats.failures() > 0
    }

    /// Fetch outcome for `day`
    pub fn fetch_outcome(&self, day: NaiveDate) -> Option<&FetchOutcome> {
        self.fetches
            .iter()
            .find(|(d, _)| *d == day)
            .map(|(_, outcome)| outcome)
    }

    /// Process outcome for `day`, if the day reached the process phase
    pub fn process_outcome(&self, day: NaiveDate) -> Option<&ProcessOutcome> {
        self.processes
            .iter()
            .find(|(d, _)| *d == day)
            .map(|(_, outcome)| outcome)
    }

    /// Get a summary of the session result
    pub fn summary(&self) -> String {
        let s = &self.stats;
        let fetch_line = format!(
            "Fetch: {} fetched, {} already present, {} not found, {} failed",
            s.fetched, s.fetch_already_present, s.not_found, s.transient_errors
        );
        let process_line = if self.fetch_only {
            "Process: skipped".to_string()
        } else {
            format!(
                "Process: {} processed, {} already present, {} failed ({} records kept, {} malformed lines)",
                s.processed,
                s.process_already_present,
                s.process_failed,
                s.records_kept,
                s.malformed_lines
            )
        };
        format!(
            "{} days in {}\n{}\n{}",
            s.total_days,
            format_duration(self.total_duration),
            fetch_line,
            process_line
        )
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if total_seconds > 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
