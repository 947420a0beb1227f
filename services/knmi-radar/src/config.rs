//! Archive configuration.
//!
//! Every field defaults to the public KNMI open data platform, so the YAML
//! file only needs the values that differ:
//!
//! ```yaml
//! dataset: radar_forecast
//! version: "2.0"
//! download_dir: /data/radar
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Where and how to reach the file archive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Open data API root
    pub base_url: String,
    /// Dataset name
    pub dataset: String,
    /// Dataset version
    pub version: String,
    /// Default directory for downloaded containers
    pub download_dir: PathBuf,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dataplatform.knmi.nl/open-data/v1".to_string(),
            dataset: "radar_forecast".to_string(),
            version: "2.0".to_string(),
            download_dir: PathBuf::from("data"),
            request_timeout_secs: 300,
        }
    }
}

impl ArchiveConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), dataset = %config.dataset, "Loaded archive config");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to null, not to the defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// URL of the dataset's file listing.
    pub fn files_url(&self) -> String {
        format!(
            "{}/datasets/{}/versions/{}/files",
            self.base_url.trim_end_matches('/'),
            self.dataset,
            self.version
        )
    }

    /// URL that yields a temporary download URL for one file.
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}/{}/url", self.files_url(), filename)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_public_archive() {
        let config = ArchiveConfig::default();
        assert_eq!(
            config.files_url(),
            "https://api.dataplatform.knmi.nl/open-data/v1/datasets/radar_forecast/versions/2.0/files"
        );
        assert_eq!(
            config.file_url("RAD_NL25_RAC_FM_202401010000.h5"),
            "https://api.dataplatform.knmi.nl/open-data/v1/datasets/radar_forecast/versions/2.0/files/RAD_NL25_RAC_FM_202401010000.h5/url"
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
dataset: radar_reflectivity_composites
version: "2.0"
download_dir: /data/radar
"#;
        let config = ArchiveConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.dataset, "radar_reflectivity_composites");
        assert_eq!(config.download_dir, PathBuf::from("/data/radar"));
        assert_eq!(config.base_url, ArchiveConfig::default().base_url);
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ArchiveConfig::from_yaml("").unwrap(), ArchiveConfig::default());
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let config = ArchiveConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        assert!(config.files_url().starts_with("http://localhost:8080/v1/datasets/"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.yaml");
        std::fs::write(&path, "request_timeout_secs: 30\n").unwrap();

        let config = ArchiveConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.request_timeout_secs, 30);

        assert!(ArchiveConfig::load(&dir.path().join("missing.yaml")).is_err());
    }
}
