//! HTTP client for the measurement archive server
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: rate-limited request sending
//! - `download`: streaming file downloads with atomic writes

use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::errors::{ConfigResult, DownloadResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;

use download::DownloadHandler;
use http::HttpHandler;

/// HTTP client for downloading archives
///
/// Cheap to share behind an `Arc`: the underlying connection pool and the
/// rate limiter are shared by every worker.
#[derive(Debug)]
pub struct AtlasClient {
    http_handler: HttpHandler,
    read_timeout: Duration,
}

impl AtlasClient {
    /// Creates a client with default settings
    pub fn new() -> ConfigResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or the
    /// underlying HTTP client cannot be built
    pub fn with_config(config: ClientConfig) -> ConfigResult<Self> {
        config.validate()?;
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::debug!(
            "Created archive client (connect timeout {:?}, read timeout {:?}, {} req/s)",
            config.connect_timeout,
            config.read_timeout,
            config.rate_limit_rps
        );

        Ok(Self {
            http_handler,
            read_timeout: config.read_timeout,
        })
    }

    /// Streams `url` into `destination` using the temp file + rename pattern
    ///
    /// Returns the number of bytes written.
    pub async fn download_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        DownloadHandler::new(&self.http_handler, self.read_timeout)
            .download_file(url, destination)
            .await
    }
}
