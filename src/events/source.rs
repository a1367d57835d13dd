//! Event source adapter: pulls the "Events" section of a year's Wikipedia
//! page and extracts list items as raw candidates.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::RawEventCandidate;
use crate::config::{EventsConfig, WikipediaConfig};

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"<li(?:\s[^>]*)?>(.*?)</li>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Candidate event strings for `year`, in document order.
    async fn fetch_candidates(&self, year: i32) -> Result<Vec<RawEventCandidate>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    text: Option<ParsedText>,
}

#[derive(Debug, Deserialize)]
struct ParsedText {
    #[serde(rename = "*")]
    html: String,
}

pub struct WikipediaSource {
    client: Client,
    api_url: String,
    section: u32,
    max_candidates: usize,
    min_len: usize,
}

impl WikipediaSource {
    pub fn new(client: Client, wikipedia: &WikipediaConfig, events: &EventsConfig) -> Self {
        Self {
            client,
            api_url: wikipedia.api_url.clone(),
            section: wikipedia.section,
            max_candidates: events.max_candidates,
            min_len: events.min_candidate_len,
        }
    }

    async fn fetch_section_html(&self, year: i32) -> Result<String, SourceError> {
        let page = year.to_string();
        let section = self.section.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "parse"),
                ("page", page.as_str()),
                ("format", "json"),
                ("prop", "text"),
                ("section", section.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: ParseResponse = response.json().await?;
        body.parse
            .and_then(|p| p.text)
            .map(|t| t.html)
            .ok_or_else(|| SourceError::Unavailable(format!("no page content for {}", year)))
    }
}

#[async_trait]
impl EventSource for WikipediaSource {
    async fn fetch_candidates(&self, year: i32) -> Result<Vec<RawEventCandidate>, SourceError> {
        match self.fetch_section_html(year).await {
            Ok(html) => {
                let candidates = extract_candidates(&html, self.max_candidates, self.min_len);
                info!("Extracted {} candidate events for {}", candidates.len(), year);
                Ok(candidates)
            }
            Err(e) => {
                warn!("Wikipedia fetch for {} failed: {}", year, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Pull `<li>` items out of an HTML fragment, clean them, and keep the
/// first `max` that are longer than `min_len` characters.
pub fn extract_candidates(html: &str, max: usize, min_len: usize) -> Vec<RawEventCandidate> {
    LIST_ITEM
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|inner| clean_fragment(inner.as_str()))
        .filter(|text| text.chars().count() > min_len)
        .inspect(|text| debug!("candidate: {}", text))
        .take(max)
        .collect()
}

fn clean_fragment(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, "");
    let text = CITATION.replace_all(&text, "");
    decode_entities(&text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&#160;", " ")
        .replace("&#8211;", "–")
        .replace("&ndash;", "–")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
