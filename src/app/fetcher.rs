//! Idempotent acquisition of one archive
//!
//! A non-empty file at the derived raw path counts as complete and is never
//! downloaded again. Everything else goes to the network exactly once, and
//! the result is folded into a [`FetchOutcome`] instead of an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::client::AtlasClient;
use crate::app::models::{ArchiveDescriptor, FetchOutcome};
use crate::errors::DownloadError;

/// Downloads archives into a raw storage root
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: Arc<AtlasClient>,
    raw_dir: PathBuf,
}

impl ArchiveFetcher {
    pub fn new(client: Arc<AtlasClient>, raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            raw_dir: raw_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// Fetch one archive, skipping the network when it is already on disk
    pub async fn fetch(&self, descriptor: &ArchiveDescriptor) -> FetchOutcome {
        let raw_path = descriptor.raw_path(&self.raw_dir);

        if is_complete(&raw_path).await {
            debug!("Archive already present: {}", raw_path.display());
            return FetchOutcome::AlreadyPresent(raw_path);
        }

        debug!("Fetching {}", descriptor.url);
        match self.client.download_file(&descriptor.url, &raw_path).await {
            Ok(bytes) => {
                info!("Fetched {} ({} bytes)", descriptor.file_name, bytes);
                FetchOutcome::Fetched(raw_path)
            }
            Err(DownloadError::NotFound { url, status }) => {
                warn!(
                    "Archive not available for {}: HTTP {} ({})",
                    descriptor.day, status, url
                );
                FetchOutcome::NotFound { status }
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", descriptor.file_name, e);
                FetchOutcome::TransientError(e.to_string())
            }
        }
    }
}

/// A raw archive is complete when it exists and is non-empty
async fn is_complete(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::app::locator::ArchiveLocator;
    use crate::app::models::DatasetParams;

    const ARCHIVE_PATH: &str = "/2025/10/01/ping-v4-builtin-2025-10-01.bz2";

    fn descriptor_for(server: &MockServer) -> ArchiveDescriptor {
        let locator = ArchiveLocator::new(&server.uri(), DatasetParams::default()).unwrap();
        locator.locate(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
    }

    fn fetcher_in(temp_dir: &TempDir) -> ArchiveFetcher {
        let client = Arc::new(AtlasClient::new().unwrap());
        ArchiveFetcher::new(client, temp_dir.path().join("raw"))
    }

    #[tokio::test]
    async fn test_second_fetch_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BZh9 archive".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let fetcher = fetcher_in(&temp_dir);
        let descriptor = descriptor_for(&server);

        let first = fetcher.fetch(&descriptor).await;
        let expected_path = temp_dir
            .path()
            .join("raw")
            .join("ping-v4-builtin-2025-10-01.bz2");
        assert_eq!(first, FetchOutcome::Fetched(expected_path.clone()));

        let second = fetcher.fetch(&descriptor).await;
        assert_eq!(second, FetchOutcome::AlreadyPresent(expected_path));
    }

    #[tokio::test]
    async fn test_zero_size_file_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"complete".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let fetcher = fetcher_in(&temp_dir);
        let descriptor = descriptor_for(&server);

        let raw_path = descriptor.raw_path(fetcher.raw_dir());
        tokio::fs::create_dir_all(fetcher.raw_dir()).await.unwrap();
        tokio::fs::write(&raw_path, b"").await.unwrap();

        let outcome = fetcher.fetch(&descriptor).await;
        assert_eq!(outcome, FetchOutcome::Fetched(raw_path.clone()));
        assert_eq!(tokio::fs::read(&raw_path).await.unwrap(), b"complete");
    }

    #[tokio::test]
    async fn test_missing_archive_is_not_found() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let fetcher = fetcher_in(&temp_dir);

        // wiremock answers unmatched requests with 404
        let outcome = fetcher.fetch(&descriptor_for(&server)).await;
        assert_eq!(outcome, FetchOutcome::NotFound { status: 404 });
        assert!(!descriptor_for(&server).raw_path(fetcher.raw_dir()).exists());
    }

    #[tokio::test]
    async fn test_server_error_is_classified_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let outcome = fetcher_in(&temp_dir).fetch(&descriptor_for(&server)).await;
        assert_eq!(outcome, FetchOutcome::NotFound { status: 503 });
    }

    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = fetcher_in(&temp_dir);
        let locator = ArchiveLocator::new("http://127.0.0.1:9", DatasetParams::default()).unwrap();
        let descriptor = locator.locate(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());

        let outcome = fetcher.fetch(&descriptor).await;
        assert!(matches!(outcome, FetchOutcome::TransientError(_)));
        assert!(!descriptor.raw_path(fetcher.raw_dir()).exists());
    }

    #[tokio::test]
    async fn test_silent_server_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(std::time::Duration::from_secs(4)),
            )
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let config = crate::app::client::ClientConfig {
            read_timeout: std::time::Duration::from_millis(300),
            ..Default::default()
        };
        let client = Arc::new(AtlasClient::with_config(config).unwrap());
        let fetcher = ArchiveFetcher::new(client, temp_dir.path().join("raw"));
        let descriptor = descriptor_for(&server);

        let started = std::time::Instant::now();
        let outcome = fetcher.fetch(&descriptor).await;

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert!(matches!(outcome, FetchOutcome::TransientError(ref e) if e.contains("stalled")));
        assert!(!descriptor.raw_path(fetcher.raw_dir()).exists());
    }
}
