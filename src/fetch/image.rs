use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Saved { path: PathBuf, bytes: usize },
    Failed { status: StatusCode },
}

/// Download `url` to `dest`, overwriting any existing file. Only a 200 response is written.
#[instrument(level = "info", skip(client, dest), fields(dest = %dest.as_ref().display()))]
pub async fn download_image(
    client: &Client,
    url: &str,
    dest: impl AsRef<Path>,
) -> Result<ImageOutcome> {
    let dest = dest.as_ref();
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;

    let status = resp.status();
    if status != StatusCode::OK {
        warn!(%status, "image request failed");
        return Ok(ImageOutcome::Failed { status });
    }

    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {:?}", dest))?;
    info!(bytes = bytes.len(), "image saved");

    Ok(ImageOutcome::Saved {
        path: dest.to_path_buf(),
        bytes: bytes.len(),
    })
}
