//! Local storage roots and atomic file helpers
//!
//! The pipeline only ever touches two directories: one for raw archives and
//! one for parsed output. Both are injected through [`StorageConfig`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::files;
use crate::errors::{ConfigError, ConfigResult};

/// Storage roots for raw archives and parsed documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub raw_dir: PathBuf,
    pub parsed_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(files::DEFAULT_RAW_DIR),
            parsed_dir: PathBuf::from(files::DEFAULT_PARSED_DIR),
        }
    }
}

impl StorageConfig {
    /// Storage with both roots under one base directory
    pub fn under(base: &Path) -> Self {
        Self {
            raw_dir: base.join("raw_dumps"),
            parsed_dir: base.join("parsed_dumps"),
        }
    }

    /// Create both roots if missing
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::StorageUnavailable` naming the directory that
    /// could not be created
    pub async fn prepare(&self) -> ConfigResult<()> {
        for dir in [&self.raw_dir, &self.parsed_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ConfigError::StorageUnavailable {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Temporary sibling path used while a file is being written
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(files::TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_file_path_generation() {
        let temp_path = temp_path_for(Path::new("/tmp/ping-v4-builtin-2025-10-01.bz2"));
        assert_eq!(
            temp_path,
            Path::new("/tmp/ping-v4-builtin-2025-10-01.bz2.tmp")
        );
        assert!(temp_path_for(Path::new("archive"))
            .to_string_lossy()
            .ends_with("archive.tmp"));
    }

    #[tokio::test]
    async fn test_prepare_creates_both_roots() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::under(&temp_dir.path().join("data"));

        storage.prepare().await.unwrap();
        assert!(storage.raw_dir.is_dir());
        assert!(storage.parsed_dir.is_dir());

        // Idempotent
        storage.prepare().await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_reports_unusable_root() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("occupied");
        tokio::fs::write(&blocker, b"file, not a directory").await.unwrap();

        let storage = StorageConfig {
            raw_dir: blocker.join("raw"),
            parsed_dir: temp_dir.path().join("parsed"),
        };
        let result = storage.prepare().await;
        assert!(matches!(
            result,
            Err(ConfigError::StorageUnavailable { ref path, .. }) if path == &blocker.join("raw")
        ));
    }
}
