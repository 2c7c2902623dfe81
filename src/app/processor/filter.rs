//! Record filter predicates
//!
//! The processor is generic over [`RecordFilter`]. Closures taking a
//! `&Record` implement it directly; [`MetricThreshold`] is the default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::models::{metric_value, Record};
use crate::constants::filter;
use crate::errors::{ConfigError, ConfigResult};

/// Decides which parsed records are kept
pub trait RecordFilter: Send + Sync {
    fn accept(&self, record: &Record) -> bool;

    /// Human-readable form for logs
    fn describe(&self) -> String {
        "custom filter".to_string()
    }
}

impl fmt::Debug for dyn RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<F> RecordFilter for F
where
    F: Fn(&Record) -> bool + Send + Sync,
{
    fn accept(&self, record: &Record) -> bool {
        self(record)
    }
}

/// Keeps records whose metric is strictly greater than a threshold
///
/// A missing or non-numeric metric counts as 0, so with a non-negative
/// threshold such records are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricThreshold {
    pub metric_field: String,
    pub threshold: f64,
}

impl Default for MetricThreshold {
    fn default() -> Self {
        Self {
            metric_field: filter::DEFAULT_METRIC_FIELD.to_string(),
            threshold: filter::DEFAULT_THRESHOLD,
        }
    }
}

impl MetricThreshold {
    pub fn new(metric_field: impl Into<String>, threshold: f64) -> Self {
        Self {
            metric_field: metric_field.into(),
            threshold,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.metric_field.is_empty() {
            return Err(ConfigError::MissingField {
                field: "filter.metric_field".to_string(),
            });
        }
        if !self.threshold.is_finite() {
            return Err(ConfigError::invalid_value(
                "filter.threshold",
                self.threshold,
                "must be a finite number",
            ));
        }
        Ok(())
    }
}

impl RecordFilter for MetricThreshold {
    fn accept(&self, record: &Record) -> bool {
        metric_value(record, &self.metric_field) > self.threshold
    }

    fn describe(&self) -> String {
        format!("{} > {}", self.metric_field, self.threshold)
    }
}
