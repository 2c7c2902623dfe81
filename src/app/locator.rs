//! Archive location derivation
//!
//! Maps a calendar day to the remote URL and local file name of that day's
//! dump. The mapping is a pure function of its inputs, which is what makes
//! re-running a window land on the same local files.

use chrono::NaiveDate;
use url::Url;

use crate::app::models::{ArchiveDescriptor, DatasetParams};
use crate::constants::atlas;
use crate::errors::{ConfigError, ConfigResult};

/// Derives [`ArchiveDescriptor`]s under a fixed base URL
#[derive(Debug, Clone)]
pub struct ArchiveLocator {
    base_url: Url,
    params: DatasetParams,
}

impl ArchiveLocator {
    /// Create a locator for the public RIPE Atlas dump root
    pub fn atlas(params: DatasetParams) -> ConfigResult<Self> {
        Self::new(atlas::BASE_URL, params)
    }

    /// Create a locator, validating the base URL and dataset parameters
    pub fn new(base_url: &str, params: DatasetParams) -> ConfigResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ConfigError::invalid_value("base_url", base_url, e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ConfigError::invalid_value(
                "base_url",
                base_url,
                "expected an http(s) URL",
            ));
        }
        params.validate()?;

        Ok(Self {
            base_url: parsed,
            params,
        })
    }

    pub fn params(&self) -> &DatasetParams {
        &self.params
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Archive file name for a day, e.g. `ping-v4-builtin-2025-10-01.bz2`
    pub fn file_name(&self, day: NaiveDate) -> String {
        format!(
            "{}-{}-{}-{}.{}",
            self.params.measurement,
            self.params.protocol,
            self.params.subtype,
            day.format("%Y-%m-%d"),
            atlas::ARCHIVE_EXTENSION
        )
    }

    /// Build the descriptor for one day
    ///
    /// Layout: `<base>/<YYYY>/<MM>/<DD>/<file name>`
    pub fn locate(&self, day: NaiveDate) -> ArchiveDescriptor {
        let file_name = self.file_name(day);
        let mut url = self.base_url.clone();
        // Cannot fail: `new` rejects cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                day.format("%Y").to_string(),
                day.format("%m").to_string(),
                day.format("%d").to_string(),
                file_name.clone(),
            ]);
        }

        ArchiveDescriptor {
            day,
            params: self.params.clone(),
            url,
            file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{DatasetSubtype, ProtocolFamily};
    use std::path::Path;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_atlas_url_layout() {
        let locator = ArchiveLocator::atlas(DatasetParams::default()).unwrap();
        let descriptor = locator.locate(day("2025-10-01"));

        assert_eq!(
            descriptor.url.as_str(),
            "https://ftp.ripe.net/ripe/atlas/data/2025/10/01/ping-v4-builtin-2025-10-01.bz2"
        );
        assert_eq!(descriptor.file_name, "ping-v4-builtin-2025-10-01.bz2");
        assert_eq!(
            descriptor.raw_path(Path::new("raw")),
            Path::new("raw").join("ping-v4-builtin-2025-10-01.bz2")
        );
        assert_eq!(
            descriptor.parsed_file_name(),
            "ping-v4-builtin-2025-10-01_parsed.json"
        );
    }

    #[test]
    fn test_dataset_params_are_encoded() {
        let params = DatasetParams::new(ProtocolFamily::V6, DatasetSubtype::Udm)
            .with_measurement("traceroute");
        let locator = ArchiveLocator::new("http://127.0.0.1:8080/dumps/", params).unwrap();
        let descriptor = locator.locate(day("2024-02-29"));

        assert_eq!(
            descriptor.url.as_str(),
            "http://127.0.0.1:8080/dumps/2024/02/29/traceroute-v6-udm-2024-02-29.bz2"
        );
        assert_eq!(descriptor.day, day("2024-02-29"));
    }

    #[test]
    fn test_locate_is_deterministic() {
        let locator = ArchiveLocator::atlas(DatasetParams::default()).unwrap();
        let first = locator.locate(day("2025-10-05"));
        let second = locator.locate(day("2025-10-05"));
        assert_eq!(first, second);

        let rebuilt = ArchiveLocator::atlas(DatasetParams::default()).unwrap();
        assert_eq!(rebuilt.locate(day("2025-10-05")), first);
    }

    #[test]
    fn test_invalid_base_urls_are_rejected() {
        let params = DatasetParams::default();
        assert!(ArchiveLocator::new("not a url", params.clone()).is_err());
        assert!(ArchiveLocator::new("ftp://ftp.ripe.net/ripe", params.clone()).is_err());
        assert!(ArchiveLocator::new("mailto:someone@example.com", params).is_err());
    }
}
