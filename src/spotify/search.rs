use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::SpotifyConfig;

#[derive(Debug, Error)]
pub enum SearchError {
    /// No token in the session; the upstream was not contacted
    #[error("no access token")]
    Unauthenticated,

    #[error("year parameter is required")]
    MissingYear,

    #[error("invalid year parameter: {0}")]
    InvalidYear(String),

    /// The platform rejected the token; re-auth rather than retry
    #[error("access token rejected by Spotify")]
    UpstreamUnauthorized,

    #[error("Spotify search failed: {0}")]
    Upstream(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct MusicSearch {
    client: Client,
    api_url: String,
    limit: u32,
}

impl MusicSearch {
    pub fn new(client: Client, config: &SpotifyConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            limit: config.search_limit,
        }
    }

    /// Year-scoped track search. Token and year are checked locally first.
    pub async fn search(
        &self,
        year: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Value, SearchError> {
        let access_token = access_token.ok_or(SearchError::Unauthenticated)?;
        let year = parse_year(year)?;

        let query = format!("year:{}", year);
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.api_url))
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", limit.as_str())])
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED => {
                warn!("Spotify rejected access token for search");
                Err(SearchError::UpstreamUnauthorized)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                error!("Error searching Spotify: {} {}", status, body);
                Err(SearchError::Upstream(status.to_string()))
            }
        }
    }
}

fn parse_year(raw: Option<&str>) -> Result<i32, SearchError> {
    let raw = raw.map(str::trim).filter(|y| !y.is_empty()).ok_or(SearchError::MissingYear)?;
    raw.parse().map_err(|_| SearchError::InvalidYear(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_client, spawn_upstream};
    use axum::{Json, Router, extract::Query, http::HeaderMap, response::IntoResponse, routing::get};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn fake_api(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new().route(
            "/search",
            get(move |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("");
                    match auth {
                        "Bearer good" => Json(json!({
                            "q": params["q"],
                            "limit": params["limit"],
                            "tracks": { "items": [] }
                        }))
                        .into_response(),
                        "Bearer stale" => StatusCode::UNAUTHORIZED.into_response(),
                        _ => StatusCode::BAD_GATEWAY.into_response(),
                    }
                }
            }),
        );
        spawn_upstream(app).await
    }

    fn search(base: String) -> MusicSearch {
        let config = SpotifyConfig { api_url: base, ..SpotifyConfig::default() };
        MusicSearch::new(http_client(), &config)
    }

    #[tokio::test]
    async fn missing_token_never_reaches_upstream() {
        let hits = Arc::new(AtomicUsize::new(0));
        let s = search(fake_api(hits.clone()).await);
        let err = s.search(Some("1999"), None).await.unwrap_err();
        assert!(matches!(err, SearchError::Unauthenticated));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_year_is_bad_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let s = search(fake_api(hits.clone()).await);
        assert!(matches!(s.search(None, Some("good")).await, Err(SearchError::MissingYear)));
        assert!(matches!(s.search(Some("19x9"), Some("good")).await, Err(SearchError::InvalidYear(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn forwards_year_scoped_query() {
        let s = search(fake_api(Arc::new(AtomicUsize::new(0))).await);
        let payload = s.search(Some("1999"), Some("good")).await.unwrap();
        assert_eq!(payload["q"], "year:1999");
        assert_eq!(payload["limit"], "10");
    }

    #[tokio::test]
    async fn upstream_401_is_distinct_from_other_failures() {
        let s = search(fake_api(Arc::new(AtomicUsize::new(0))).await);
        assert!(matches!(
            s.search(Some("1999"), Some("stale")).await,
            Err(SearchError::UpstreamUnauthorized)
        ));
        assert!(matches!(
            s.search(Some("1999"), Some("other")).await,
            Err(SearchError::Upstream(_))
        ));
    }
}
