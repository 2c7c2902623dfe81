//! Data models for archive descriptors, records and per-item outcomes
//!
//! Descriptors identify one day's archive; outcomes are the tagged results
//! the fetch and process phases produce for every item, so that expected
//! absence (`NotFound`) stays distinguishable from real failures.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::constants::{atlas, files};
use crate::errors::ConfigError;

/// One parsed archive line: an untyped JSON object
pub type Record = Map<String, Value>;

/// IP protocol family of a measurement dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolFamily {
    V4,
    V6,
}

impl ProtocolFamily {
    /// Tag used in archive names
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolFamily::V4 => "v4",
            ProtocolFamily::V6 => "v6",
        }
    }
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4" | "ipv4" | "4" => Ok(ProtocolFamily::V4),
            "v6" | "ipv6" | "6" => Ok(ProtocolFamily::V6),
            _ => Err(ConfigError::invalid_value(
                "protocol",
                s,
                "expected 'v4' or 'v6'",
            )),
        }
    }
}

/// Which measurement population a dump covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSubtype {
    /// Built-in measurements run by every Atlas node
    Builtin,
    /// User-defined measurements
    Udm,
}

impl DatasetSubtype {
    /// Tag used in archive names
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSubtype::Builtin => "builtin",
            DatasetSubtype::Udm => "udm",
        }
    }
}

impl fmt::Display for DatasetSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetSubtype {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "builtin" => Ok(DatasetSubtype::Builtin),
            "udm" => Ok(DatasetSubtype::Udm),
            _ => Err(ConfigError::invalid_value(
                "subtype",
                s,
                "expected 'builtin' or 'udm'",
            )),
        }
    }
}

/// Parameters selecting one dataset on the archive server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetParams {
    /// Measurement kind, e.g. `ping` or `traceroute`
    pub measurement: String,
    pub protocol: ProtocolFamily,
    pub subtype: DatasetSubtype,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            measurement: atlas::DEFAULT_MEASUREMENT.to_string(),
            protocol: ProtocolFamily::V4,
            subtype: DatasetSubtype::Builtin,
        }
    }
}

impl DatasetParams {
    /// Create parameters for the default measurement kind
    pub fn new(protocol: ProtocolFamily, subtype: DatasetSubtype) -> Self {
        Self {
            protocol,
            subtype,
            ..Default::default()
        }
    }

    /// Override the measurement kind
    pub fn with_measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = measurement.into();
        self
    }

    /// Reject measurement names that would break the archive path
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = !self.measurement.is_empty()
            && self
                .measurement
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(ConfigError::invalid_value(
                "measurement",
                &self.measurement,
                "must be non-empty and contain only letters, digits or '_'",
            ))
        }
    }
}

/// Identity of one day's archive: where it lives remotely and locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    pub day: NaiveDate,
    pub params: DatasetParams,
    pub url: Url,
    /// Remote file name, reused as the local raw file name
    pub file_name: String,
}

impl ArchiveDescriptor {
    /// Local path of the raw archive under `raw_dir`
    pub fn raw_path(&self, raw_dir: &Path) -> PathBuf {
        raw_dir.join(&self.file_name)
    }

    /// File name of the parsed output document for this archive
    pub fn parsed_file_name(&self) -> String {
        parsed_file_name(&self.file_name)
    }
}

/// Derive the parsed output file name from a raw archive file name
///
/// `ping-v4-builtin-2025-10-01.bz2` becomes
/// `ping-v4-builtin-2025-10-01_parsed.json`. Names without the archive
/// extension keep their full name as the stem.
pub fn parsed_file_name(raw_file_name: &str) -> String {
    let archive_suffix = format!(".{}", atlas::ARCHIVE_EXTENSION);
    let stem = raw_file_name
        .strip_suffix(&archive_suffix)
        .unwrap_or(raw_file_name);
    format!(
        "{}{}.{}",
        stem,
        files::PARSED_SUFFIX,
        files::PARSED_EXTENSION
    )
}

/// Result of one archive acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// Downloaded during this run
    Fetched(PathBuf),
    /// Found complete on disk, no network access made
    AlreadyPresent(PathBuf),
    /// Server does not have this archive (yet)
    NotFound { status: u16 },
    /// Network-layer failure; not retried
    TransientError(String),
}

impl FetchOutcome {
    /// Local raw path when the archive is available on disk
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Fetched(path) | FetchOutcome::AlreadyPresent(path) => Some(path),
            FetchOutcome::NotFound { .. } | FetchOutcome::TransientError(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.local_path().is_some()
    }

    /// Short label for logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Fetched(_) => "fetched",
            FetchOutcome::AlreadyPresent(_) => "already-present",
            FetchOutcome::NotFound { .. } => "not-found",
            FetchOutcome::TransientError(_) => "transient-error",
        }
    }
}

/// Projection of a record retaining only the fields used downstream
///
/// Identity fields are copied as found, whatever their JSON type, since
/// records are not schema-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredRecord {
    /// Identifier of the measuring node (`prb_id`)
    pub prb_id: Option<Value>,
    /// Destination address
    pub dst_addr: Option<Value>,
    /// Average round-trip time in milliseconds
    pub avg_rtt: f64,
    /// Unix timestamp of the result
    pub timestamp: Option<Value>,
}

impl FilteredRecord {
    /// Project a record, reading the metric from `metric_field`
    ///
    /// Absent fields become `None`, and the metric becomes 0 unless numeric.
    pub fn project(record: &Record, metric_field: &str) -> Self {
        Self {
            prb_id: copy_field(record, "prb_id"),
            dst_addr: copy_field(record, "dst_addr"),
            avg_rtt: metric_value(record, metric_field),
            timestamp: copy_field(record, "timestamp"),
        }
    }
}

fn copy_field(record: &Record, field: &str) -> Option<Value> {
    record.get(field).filter(|value| !value.is_null()).cloned()
}

/// Numeric value of `field`, or 0 when absent or not a number
pub fn metric_value(record: &Record, field: &str) -> f64 {
    record.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Counters from one completed processing pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub output_path: PathBuf,
    /// Non-blank lines seen
    pub lines_read: u64,
    /// Records that passed the filter and were written
    pub records_kept: u64,
    /// Lines skipped because they were not a JSON object
    pub malformed_lines: u64,
}

/// Result of processing one raw archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessOutcome {
    Processed(ProcessReport),
    /// Output existed; input was not opened
    AlreadyPresent(PathBuf),
    Failed(String),
}

impl ProcessOutcome {
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            ProcessOutcome::Processed(report) => Some(&report.output_path),
            ProcessOutcome::AlreadyPresent(path) => Some(path),
            ProcessOutcome::Failed(_) => None,
        }
    }

    /// Short label for logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Processed(_) => "processed",
            ProcessOutcome::AlreadyPresent(_) => "already-present",
            ProcessOutcome::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_protocol_and_subtype_parsing() {
        assert_eq!("v4".parse::<ProtocolFamily>().unwrap(), ProtocolFamily::V4);
        assert_eq!("IPv6".parse::<ProtocolFamily>().unwrap(), ProtocolFamily::V6);
        assert!("v5".parse::<ProtocolFamily>().is_err());

        assert_eq!(
            "builtin".parse::<DatasetSubtype>().unwrap(),
            DatasetSubtype::Builtin
        );
        assert_eq!("UDM".parse::<DatasetSubtype>().unwrap(), DatasetSubtype::Udm);
        assert!(matches!(
            "custom".parse::<DatasetSubtype>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_measurement_validation() {
        assert!(DatasetParams::default().validate().is_ok());
        assert!(DatasetParams::default()
            .with_measurement("traceroute")
            .validate()
            .is_ok());
        assert!(DatasetParams::default()
            .with_measurement("../etc")
            .validate()
            .is_err());
        assert!(DatasetParams::default().with_measurement("").validate().is_err());
    }

    #[test]
    fn test_parsed_file_name() {
        assert_eq!(
            parsed_file_name("ping-v4-builtin-2025-10-01.bz2"),
            "ping-v4-builtin-2025-10-01_parsed.json"
        );
        assert_eq!(parsed_file_name("dump"), "dump_parsed.json");
    }

    #[test]
    fn test_projection_defaults_missing_fields() {
        let full = record(json!({
            "prb_id": 1001,
            "dst_addr": "193.0.14.129",
            "avg": 75.5,
            "timestamp": 1759276800,
            "msm_id": 1001,
        }));
        let projected = FilteredRecord::project(&full, "avg");
        assert_eq!(projected.prb_id, Some(json!(1001)));
        assert_eq!(projected.dst_addr, Some(json!("193.0.14.129")));
        assert_eq!(projected.avg_rtt, 75.5);
        assert_eq!(projected.timestamp, Some(json!(1759276800)));

        let sparse = record(json!({ "avg": "n/a", "dst_addr": null }));
        let projected = FilteredRecord::project(&sparse, "avg");
        assert_eq!(projected.prb_id, None);
        assert_eq!(projected.dst_addr, None);
        assert_eq!(projected.avg_rtt, 0.0);
        assert_eq!(projected.timestamp, None);
    }

    #[test]
    fn test_projection_keeps_unexpected_types() {
        let odd = record(json!({
            "prb_id": "6001",
            "dst_addr": "192.0.2.1",
            "avg": 75,
            "timestamp": 1759276800.5,
        }));
        let projected = FilteredRecord::project(&odd, "avg");
        assert_eq!(projected.prb_id, Some(json!("6001")));
        assert_eq!(projected.timestamp, Some(json!(1759276800.5)));

        let value = serde_json::to_value(&projected).unwrap();
        assert_eq!(
            value,
            json!({
                "prb_id": "6001",
                "dst_addr": "192.0.2.1",
                "avg_rtt": 75.0,
                "timestamp": 1759276800.5
            })
        );
    }

    #[test]
    fn test_filtered_record_serializes_nulls() {
        let projected = FilteredRecord::project(&record(json!({ "avg": 60 })), "avg");
        let value = serde_json::to_value(&projected).unwrap();
        assert_eq!(
            value,
            json!({ "prb_id": null, "dst_addr": null, "avg_rtt": 60.0, "timestamp": null })
        );
    }

    #[test]
    fn test_outcome_paths() {
        let path = PathBuf::from("/tmp/raw.bz2");
        assert_eq!(
            FetchOutcome::Fetched(path.clone()).local_path(),
            Some(path.as_path())
        );
        assert!(FetchOutcome::AlreadyPresent(path.clone()).is_available());
        assert!(!FetchOutcome::NotFound { status: 404 }.is_available());
        assert_eq!(
            FetchOutcome::TransientError("reset".into()).label(),
            "transient-error"
        );
        assert_eq!(ProcessOutcome::Failed("boom".into()).output_path(), None);
    }
}
