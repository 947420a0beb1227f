//! Fetching the newest nowcast container.
//!
//! Bodies are streamed to `<name>.partial` and renamed into place once
//! complete, so a finished name never refers to a truncated file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use radar_common::parse_iso8601;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::api::ArchiveApi;

/// Whether a file created at `created` is newer than the last one seen.
pub fn should_download(created: DateTime<Utc>, after: Option<DateTime<Utc>>) -> bool {
    match after {
        Some(after) => created > after,
        None => true,
    }
}

/// Download the most recently created archive file into `dir`.
///
/// Returns `Ok(None)` without downloading when `after` is given and the
/// newest file is not newer than it.
#[instrument(skip(api), fields(dir = %dir.display()))]
pub async fn download_latest_file(
    api: &dyn ArchiveApi,
    dir: &Path,
    after: Option<DateTime<Utc>>,
) -> Result<Option<PathBuf>> {
    let latest = api.latest_file_info().await?;
    let created = parse_iso8601(&latest.created)
        .with_context(|| format!("Invalid creation time for {}", latest.filename))?;

    if !should_download(created, after) {
        info!(
            filename = %latest.filename,
            created = %created,
            "Latest file is not newer, skipping download"
        );
        return Ok(None);
    }

    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    // Archive names are flat; refuse anything that would leave `dir`
    let filename = Path::new(&latest.filename)
        .file_name()
        .with_context(|| format!("Invalid archive file name {:?}", latest.filename))?;
    let destination = dir.join(filename);

    let url = api.get_download_url(&latest.filename).await?;
    let bytes = api.download(&url, &destination).await?;

    info!(
        path = %destination.display(),
        bytes,
        created = %created,
        "Download completed"
    );

    Ok(Some(destination))
}

/// Stream chunks to `destination`, going through a `.partial` file.
///
/// The partial file is removed when the stream or a write fails.
pub async fn stream_to_file<S, B, E>(stream: S, destination: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let partial = partial_path(destination);

    match write_chunks(stream, &partial).await {
        Ok(bytes) => {
            fs::rename(&partial, destination)
                .await
                .with_context(|| format!("Failed to move download to {}", destination.display()))?;
            Ok(bytes)
        }
        Err(e) => {
            fs::remove_file(&partial).await.ok();
            Err(e)
        }
    }
}

async fn write_chunks<S, B, E>(stream: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut file = fs::File::create(path)
        .await
        .context("Failed to open output file")?;

    futures::pin_mut!(stream);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading response chunk")?;
        let chunk = chunk.as_ref();

        file.write_all(chunk)
            .await
            .context("Error writing to file")?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    debug!(path = %path.display(), bytes = written, "Stream written");
    Ok(written)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}
