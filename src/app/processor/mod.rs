//! Streaming archive processing
//!
//! Turns one raw `.bz2` archive into one parsed JSON document:
//! - `reader`: bzip2 decompression and line-by-line JSON parsing
//! - `filter`: pluggable record predicates
//!
//! The decompressed archive is never held in memory; only the filtered,
//! projected records accumulate until the single write at the end.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::models::{parsed_file_name, FilteredRecord, ProcessOutcome, ProcessReport};
use crate::app::storage::temp_path_for;
use crate::errors::{ProcessError, ProcessResult};

pub mod filter;
pub mod reader;

pub use filter::{MetricThreshold, RecordFilter};
pub use reader::RecordReader;

/// Filters raw archives into parsed documents under `parsed_dir`
#[derive(Debug, Clone)]
pub struct ArchiveProcessor {
    parsed_dir: PathBuf,
    filter: Arc<dyn RecordFilter>,
    metric_field: String,
}

impl ArchiveProcessor {
    /// Processor using a metric threshold filter
    ///
    /// The projected metric is read from the same field the filter tests.
    pub fn new(parsed_dir: impl Into<PathBuf>, threshold: MetricThreshold) -> Self {
        let metric_field = threshold.metric_field.clone();
        Self {
            parsed_dir: parsed_dir.into(),
            filter: Arc::new(threshold),
            metric_field,
        }
    }

    /// Processor with a custom filter, projecting `metric_field`
    pub fn with_filter(
        parsed_dir: impl Into<PathBuf>,
        filter: Arc<dyn RecordFilter>,
        metric_field: impl Into<String>,
    ) -> Self {
        Self {
            parsed_dir: parsed_dir.into(),
            filter,
            metric_field: metric_field.into(),
        }
    }

    pub fn parsed_dir(&self) -> &Path {
        &self.parsed_dir
    }

    /// Output document path derived from the raw archive file name
    pub fn output_path_for(&self, raw_path: &Path) -> ProcessResult<PathBuf> {
        let file_name = raw_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ProcessError::InvalidPath {
                path: raw_path.to_path_buf(),
            })?;
        Ok(self.parsed_dir.join(parsed_file_name(file_name)))
    }

    /// Process one archive, skipping it when its output already exists
    ///
    /// `None` means the fetch phase produced no file for this item.
    pub async fn process(&self, raw_path: Option<PathBuf>) -> ProcessOutcome {
        let Some(raw_path) = raw_path else {
            return ProcessOutcome::Failed(ProcessError::NoInput.to_string());
        };

        let output_path = match self.output_path_for(&raw_path) {
            Ok(path) => path,
            Err(e) => return ProcessOutcome::Failed(e.to_string()),
        };

        if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            debug!("Output already present: {}", output_path.display());
            return ProcessOutcome::AlreadyPresent(output_path);
        }

        let filter = Arc::clone(&self.filter);
        let metric_field = self.metric_field.clone();
        let input = raw_path.clone();
        let output = output_path.clone();
        let result = tokio::task::spawn_blocking(move || {
            filter_archive(&input, &output, filter.as_ref(), &metric_field)
        })
        .await
        .map_err(|e| ProcessError::Task(e.to_string()))
        .and_then(|result| result);

        match result {
            Ok(report) => {
                info!(
                    "Processed {}: kept {} of {} records ({} malformed)",
                    raw_path.display(),
                    report.records_kept,
                    report.lines_read,
                    report.malformed_lines
                );
                ProcessOutcome::Processed(report)
            }
            Err(e) => {
                warn!("Failed to process {}: {}", raw_path.display(), e);
                ProcessOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Blocking pass: decompress, filter, project, then write once
pub fn filter_archive(
    raw_path: &Path,
    output_path: &Path,
    filter: &dyn RecordFilter,
    metric_field: &str,
) -> ProcessResult<ProcessReport> {
    let mut reader = RecordReader::open_bz2(raw_path).map_err(|source| ProcessError::Open {
        path: raw_path.to_path_buf(),
        source,
    })?;

    let mut kept = Vec::new();
    for record in reader.by_ref() {
        let record = record.map_err(|source| ProcessError::Read {
            path: raw_path.to_path_buf(),
            source,
        })?;
        if filter.accept(&record) {
            kept.push(FilteredRecord::project(&record, metric_field));
        }
    }

    write_document(output_path, &kept)?;

    Ok(ProcessReport {
        output_path: output_path.to_path_buf(),
        lines_read: reader.lines_read(),
        records_kept: kept.len() as u64,
        malformed_lines: reader.malformed_lines(),
    })
}

/// Serialize `records` to a temp file and rename it over `output_path`
fn write_document(output_path: &Path, records: &[FilteredRecord]) -> ProcessResult<()> {
    let temp_path = temp_path_for(output_path);
    let write_err = |source| ProcessError::Write {
        path: output_path.to_path_buf(),
        source,
    };

    let result = (|| -> ProcessResult<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = File::create(&temp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, records)?;
        writer.flush().map_err(write_err)?;
        writer.get_ref().sync_all().map_err(write_err)?;
        std::fs::rename(&temp_path, output_path).map_err(write_err)
    })();

    if result.is_err() {
        remove_temp_file(&temp_path);
    }
    result
}

fn remove_temp_file(temp_path: &Path) {
    if let Err(e) = std::fs::remove_file(temp_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", temp_path.display(), e);
        }
    }
}
