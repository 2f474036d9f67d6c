use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Status of a page request, with the body only when it succeeded.
#[derive(Debug)]
pub struct PageResponse {
    pub status: StatusCode,
    pub body: Option<String>,
}

/// Paragraph text and image sources, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub paragraphs: Vec<String>,
    pub images: Vec<String>,
    /// The parsed document re-serialised, for optional dumping.
    pub html: String,
}

/// Single GET; anything other than 200 is returned as a status with no body.
#[instrument(level = "info", skip(client))]
pub async fn fetch_page(client: &Client, url: &str) -> Result<PageResponse> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;
    let status = resp.status();
    if status != StatusCode::OK {
        warn!(%status, "page request failed");
        return Ok(PageResponse { status, body: None });
    }

    let body = resp
        .text()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    debug!(bytes = body.len(), "page fetched");
    Ok(PageResponse {
        status,
        body: Some(body),
    })
}

pub fn parse_page(html: &str) -> PageContent {
    let doc = Html::parse_document(html);
    let p_sel = Selector::parse("p").expect("paragraph selector should parse");
    let img_sel = Selector::parse("img").expect("image selector should parse");

    let paragraphs = doc
        .select(&p_sel)
        .map(|p| p.text().collect::<String>())
        .collect();

    let images = doc
        .select(&img_sel)
        .filter_map(|img| {
            let src = img.value().attr("src");
            if src.is_none() {
                warn!(tag = %img.html(), "img without src skipped");
            }
            src.map(str::to_string)
        })
        .collect();

    PageContent {
        paragraphs,
        images,
        html: doc.root_element().html(),
    }
}
