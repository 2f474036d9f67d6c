// src/fetch/mod.rs
//
// Scrape one news page: print its paragraphs and image sources, then download one image.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::io::Write;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::ScrapeConfig;

pub mod image;
pub mod page;

pub use image::{download_image, ImageOutcome};
pub use page::{fetch_page, parse_page, PageContent};

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    /// The page did not answer 200; nothing was parsed or downloaded.
    PageFailed { status: StatusCode },
    Scraped {
        content: PageContent,
        /// `None` when no image URL was configured and the page had no images.
        image: Option<ImageOutcome>,
    },
}

/// Configured image URL, or else the first image on the page resolved against the page URL.
fn image_target(cfg: &ScrapeConfig, content: &PageContent) -> Result<Option<String>> {
    if let Some(u) = &cfg.image_url {
        return Ok(Some(u.clone()));
    }
    let Some(src) = content.images.first() else {
        return Ok(None);
    };
    let base = Url::parse(&cfg.page_url)
        .with_context(|| format!("parsing page URL {}", cfg.page_url))?;
    let full = base
        .join(src)
        .with_context(|| format!("resolving image source {}", src))?;
    Ok(Some(full.to_string()))
}

/// Run the scrape, printing results to `out`.
///
/// A non-200 page prints a failure line and stops. Transport errors are returned.
#[instrument(level = "info", skip_all, fields(url = %cfg.page_url))]
pub async fn scrape<W: Write>(
    client: &Client,
    cfg: &ScrapeConfig,
    out: &mut W,
) -> Result<ScrapeOutcome> {
    let resp = fetch_page(client, &cfg.page_url).await?;
    let body = match resp.body {
        Some(body) if resp.status == StatusCode::OK => body,
        _ => {
            writeln!(
                out,
                "Failed to retrieve the webpage. Status code: {}",
                resp.status.as_u16()
            )?;
            return Ok(ScrapeOutcome::PageFailed {
                status: resp.status,
            });
        }
    };

    let content = parse_page(&body);
    info!(
        paragraphs = content.paragraphs.len(),
        images = content.images.len(),
        "page parsed"
    );

    if cfg.print_html {
        writeln!(out, "{}", content.html)?;
    }
    for p in &content.paragraphs {
        writeln!(out, "{}", p)?;
    }
    for src in &content.images {
        writeln!(out, "{}", src)?;
    }

    let image = match image_target(cfg, &content)? {
        None => {
            warn!("no image URL configured and none found on the page");
            writeln!(out, "No image to download.")?;
            None
        }
        Some(url) => {
            let outcome = download_image(client, &url, &cfg.image_path).await?;
            match &outcome {
                ImageOutcome::Saved { path, bytes } => {
                    writeln!(out, "Image downloaded successfully.")?;
                    writeln!(out, "Saved {} ({} bytes)", path.display(), bytes)?;
                }
                ImageOutcome::Failed { status } => {
                    writeln!(
                        out,
                        "Failed to download image. Status code: {}",
                        status.as_u16()
                    )?;
                }
            }
            Some(outcome)
        }
    };

    Ok(ScrapeOutcome::Scraped { content, image })
}
