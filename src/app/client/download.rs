//! Streaming file downloads with atomic writes
//!
//! The response body is copied to disk chunk by chunk through a small
//! buffered writer, so memory use is independent of archive size. Data
//! lands in a `.tmp` sibling first and is renamed into place only after the
//! whole body has been written and synced.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::storage::temp_path_for;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    read_timeout: Duration,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, read_timeout: Duration) -> Self {
        Self {
            http_handler,
            read_timeout,
        }
    }

    /// Downloads `url` to `destination`, returning the number of bytes written
    ///
    /// Any existing file at `destination` is replaced. On failure the
    /// temporary file is removed and `destination` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::NotFound` for a non-success status, and
    /// `Http`, `Timeout` or `Io` for transport and disk failures.
    pub async fn download_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);

        let bytes = match self.download_file_attempt(url, &temp_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_temp_file(&temp_path).await;
                return Err(e);
            }
        };

        if tokio::fs::rename(&temp_path, destination).await.is_err() {
            remove_temp_file(&temp_path).await;
            return Err(DownloadError::AtomicOperationFailed {
                temp_path,
                final_path: destination.to_path_buf(),
            });
        }

        tracing::debug!("Downloaded {} bytes to {}", bytes, destination.display());
        Ok(bytes)
    }

    /// Streams the body of `url` into `temp_path`
    async fn download_file_attempt(&self, url: &Url, temp_path: &Path) -> DownloadResult<u64> {
        let response = self
            .http_handler
            .get_response(url, self.read_timeout)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::NotFound {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file = File::create(temp_path).await?;
        let mut writer = BufWriter::with_capacity(files::DOWNLOAD_CHUNK_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = tokio::time::timeout(self.read_timeout, stream.next())
            .await
            .map_err(|_| self.stalled())?
        {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        writer.get_ref().sync_all().await?;
        Ok(written)
    }

    fn stalled(&self) -> DownloadError {
        DownloadError::Timeout {
            waited: self.read_timeout,
        }
    }
}

async fn remove_temp_file(temp_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", temp_path.display(), e);
        }
    }
}
