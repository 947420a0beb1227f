//! Client for the KNMI open data file API.
//!
//! Listing and URL requests carry the API key in the `Authorization` header.
//! The temporary download URLs they return are pre-signed and are fetched
//! without it.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ArchiveConfig;
use crate::download::stream_to_file;

/// Sort direction of a file listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Query parameters of the file listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub max_keys: u32,
    pub order_by: String,
    pub sorting: SortDirection,
}

impl ListParams {
    /// The newest file only.
    pub fn latest() -> Self {
        Self {
            max_keys: 1,
            order_by: "created".to_string(),
            sorting: SortDirection::Desc,
        }
    }
}

/// One file in a listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    /// ISO 8601 creation time
    pub created: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub is_truncated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemporaryUrl {
    temporary_download_url: String,
}

/// Operations the download policy needs from the archive.
#[async_trait]
pub trait ArchiveApi: Send + Sync {
    async fn list_files(&self, params: &ListParams) -> Result<FileListing>;

    /// Temporary URL from which `filename` can be fetched.
    async fn get_download_url(&self, filename: &str) -> Result<String>;

    /// Fetch `url` into `destination`, returning the byte count.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;

    /// Most recently created file.
    async fn latest_file_info(&self) -> Result<FileInfo> {
        self.list_files(&ListParams::latest())
            .await?
            .files
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Archive listing is empty"))
    }
}

/// HTTP client for the open data API.
pub struct OpenDataClient {
    client: Client,
    config: ArchiveConfig,
    api_key: String,
}

impl OpenDataClient {
    pub fn new(config: ArchiveConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// List up to `max_keys` files ordered by `order_by`.
    pub async fn list_latest(
        &self,
        max_keys: u32,
        order_by: &str,
        sorting: SortDirection,
    ) -> Result<FileListing> {
        self.list_files(&ListParams {
            max_keys,
            order_by: order_by.to_string(),
            sorting,
        })
        .await
    }

    async fn get_json<T, Q>(&self, url: &str, query: Option<&Q>) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        Q: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, &self.api_key);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Archive returned an error for {}", url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Unexpected response body from {}", url))
    }
}

#[async_trait]
impl ArchiveApi for OpenDataClient {
    async fn list_files(&self, params: &ListParams) -> Result<FileListing> {
        let listing: FileListing = self
            .get_json(&self.config.files_url(), Some(params))
            .await?;
        debug!(count = listing.files.len(), truncated = listing.is_truncated, "Listed archive files");
        Ok(listing)
    }

    async fn get_download_url(&self, filename: &str) -> Result<String> {
        let url: TemporaryUrl = self
            .get_json::<_, ()>(&self.config.file_url(filename), None)
            .await?;
        Ok(url.temporary_download_url)
    }

    #[instrument(skip(self, url), fields(destination = %destination.display()))]
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Download request failed")?
            .error_for_status()
            .context("Unable to download file using download URL")?;

        stream_to_file(response.bytes_stream(), destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_query_names() {
        let query = serde_json::to_value(ListParams::latest()).unwrap();
        assert_eq!(
            query,
            serde_json::json!({"maxKeys": 1, "orderBy": "created", "sorting": "desc"})
        );
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{
            "isTruncated": true,
            "resultCount": 1,
            "files": [{
                "filename": "RAD_NL25_RAC_FM_202401010005.h5",
                "size": 5242880,
                "created": "2024-01-01T00:06:12+00:00",
                "lastModified": "2024-01-01T00:06:12+00:00"
            }],
            "maxResults": 1,
            "startAfterFilename": ""
        }"#;

        let listing: FileListing = serde_json::from_str(body).unwrap();
        assert!(listing.is_truncated);
        assert_eq!(listing.files[0].filename, "RAD_NL25_RAC_FM_202401010005.h5");
        assert_eq!(listing.files[0].size, Some(5242880));
    }

    #[test]
    fn test_parse_temporary_url() {
        let body = r#"{"contentType": "application/x-hdf5", "lastModified": "x", "size": "1", "temporaryDownloadUrl": "https://s3.example/file?sig=abc"}"#;
        let url: TemporaryUrl = serde_json::from_str(body).unwrap();
        assert_eq!(url.temporary_download_url, "https://s3.example/file?sig=abc");
    }
}
