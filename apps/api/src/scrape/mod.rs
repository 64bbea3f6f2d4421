//! Page fetching — downloads a job page and flattens its HTML into plain text.
//!
//! HTML parsing itself is delegated to `html2text`; this module only owns the
//! HTTP round-trip and the "did we get anything readable" decision.

pub mod cleaner;

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
/// Wrap width handed to html2text; wide enough that lines are never re-flowed.
const TEXT_WIDTH: usize = 10_000;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex"));

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page returned status {status}")]
    Status { status: u16 },

    #[error("HTML conversion failed: {0}")]
    Html(String),

    #[error("Page contained no readable text")]
    Empty,
}

/// A fetched page reduced to text.
#[derive(Debug, Clone, Serialize)]
pub struct PageDocument {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

/// Thin wrapper over a shared HTTP client used for job-page downloads.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns its readable text.
    ///
    /// Fails with `ScrapeError::Empty` when the page has no text at all, which
    /// callers report as a page-load failure.
    pub async fn fetch(&self, url: &str) -> Result<PageDocument, ScrapeError> {
        let parsed = parse_url(url)?;
        info!("Fetching job page {parsed}");

        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {parsed}", html.len());

        let document = html_to_document(parsed.as_str(), &html)?;
        if document.content.trim().is_empty() {
            return Err(ScrapeError::Empty);
        }
        Ok(document)
    }
}

/// Accepts only absolute http(s) URLs.
pub fn parse_url(raw: &str) -> Result<Url, ScrapeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::InvalidUrl("url cannot be empty".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| ScrapeError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ScrapeError::InvalidUrl(format!(
            "unsupported scheme '{scheme}', expected http or https"
        ))),
    }
}

fn html_to_document(url: &str, html: &str) -> Result<PageDocument, ScrapeError> {
    let title = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());

    let body = html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .map_err(|e| ScrapeError::Html(e.to_string()))?;
    let body = body.trim();

    let content = match &title {
        Some(t) if !body.is_empty() => format!("{t}\n{body}"),
        Some(t) => t.clone(),
        None => body.to_string(),
    };

    Ok(PageDocument {
        url: url.to_string(),
        title,
        content,
    })
}
