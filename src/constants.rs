//! Application constants for Atlas Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the archive server base URL
    pub const BASE_URL: &str = "ATLAS_FETCHER_BASE_URL";

    /// Overrides the worker pool size
    pub const WORKERS: &str = "ATLAS_FETCHER_WORKERS";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Atlas-Fetcher/0.1.0 (Measurement Archive Tool)";

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Longest gap between two body chunks before a download counts as stalled
    pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 16;
}

/// Request rate limiting
pub mod limits {
    /// Default rate limit for archive requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 15;
}

/// RIPE Atlas archive layout
pub mod atlas {
    /// Public daily dump root
    pub const BASE_URL: &str = "https://ftp.ripe.net/ripe/atlas/data";

    /// Measurement kind prefixed to every archive name
    pub const DEFAULT_MEASUREMENT: &str = "ping";

    /// Extension of the compressed archives, without the dot
    pub const ARCHIVE_EXTENSION: &str = "bz2";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Marker appended to the archive stem for parsed output
    pub const PARSED_SUFFIX: &str = "_parsed";

    /// Extension of the parsed output documents
    pub const PARSED_EXTENSION: &str = "json";

    /// Default directory for raw archives
    pub const DEFAULT_RAW_DIR: &str = "data/raw_dumps";

    /// Default directory for parsed output
    pub const DEFAULT_PARSED_DIR: &str = "data/parsed_dumps";

    /// Download write buffer size (8KB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

    /// Read buffer in front of the decompressor (64KB)
    pub const DECOMPRESS_BUFFER_SIZE: usize = 64 * 1024;
}

/// Record filter defaults
pub mod filter {
    /// Field holding the average round-trip time
    pub const DEFAULT_METRIC_FIELD: &str = "avg";

    /// Records with a metric strictly above this are kept
    pub const DEFAULT_THRESHOLD: f64 = 50.0;
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of concurrent workers per phase
    pub const DEFAULT_WORKER_COUNT: usize = 8;

    /// Maximum accepted worker count
    pub const MAX_WORKER_COUNT: usize = 64;

    /// Channel buffer size for progress events
    pub const CHANNEL_BUFFER_SIZE: usize = 100;
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use atlas::BASE_URL as ATLAS_BASE_URL;
pub use files::TEMP_FILE_SUFFIX;
pub use http::USER_AGENT;
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use workers::DEFAULT_WORKER_COUNT;
