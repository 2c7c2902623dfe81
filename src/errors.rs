//! Error types for Atlas Fetcher
//!
//! Errors are split by concern. Only [`ConfigError`] is fatal to a pipeline
//! run; download and processing errors are folded into per-archive outcomes
//! by the fetcher and processor so that one bad day never aborts the batch.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration and pre-flight validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Date window with start after end
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    /// Date string that is not an ISO calendar date
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered back to TOML
    #[error("Failed to render configuration")]
    Render(#[from] toml::ser::Error),

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Storage root that cannot be created or written
    #[error("Storage directory not accessible: {path}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Shorthand for an [`ConfigError::InvalidValue`]
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error (connect failure, reset, protocol error)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error while writing the archive
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No data received within the read timeout
    #[error("Download stalled: no response for {waited:?}")]
    Timeout { waited: Duration },

    /// Server answered with a non-success status
    #[error("Archive not available at {url}: HTTP {status}")]
    NotFound { url: String, status: u16 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

impl DownloadError {
    /// Whether the remote reported the archive as unavailable
    pub fn is_not_found(&self) -> bool {
        matches!(self, DownloadError::NotFound { .. })
    }
}

/// Archive processing errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The corresponding fetch produced no local file
    #[error("no input: archive was not fetched")]
    NoInput,

    /// Raw archive could not be opened
    #[error("Failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read or decompression failure mid-stream
    #[error("Failed to read archive {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output document could not be serialized
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Output document could not be written
    #[error("Failed to write output {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raw path has no usable file name
    #[error("Invalid archive path: {path}")]
    InvalidPath { path: PathBuf },

    /// Blocking processing task died
    #[error("Processing task failed: {0}")]
    Task(String),
}

/// Worker pool errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    /// A task panicked or was cancelled
    #[error("Task on worker {worker_id} terminated unexpectedly: {detail}")]
    TaskPanicked { worker_id: usize, detail: String },

    /// The worker holding this item died before reporting a result
    #[error("Item {index} was lost when its worker terminated")]
    WorkerLost { index: usize },

    /// Pool configured with no workers
    #[error("Worker pool requires at least one worker")]
    NoWorkers,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Processing error
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Worker pool error
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Download(_) => "download",
            AppError::Process(_) => "process",
            AppError::Pool(_) => "pool",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Processing result type alias
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
