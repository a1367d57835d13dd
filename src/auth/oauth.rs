//! Spotify accounts service client: authorize URL, code exchange, refresh,
//! and the identity check.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::SpotifyConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Spotify client credentials not configured")]
    NotConfigured,

    #[error("invalid Spotify URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: StatusCode, body: String },
}

impl AuthError {
    /// The accounts service looked at the credential and said no
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::TokenEndpoint { status, .. } if status.is_client_error())
    }
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    /// Always present on code exchange; only present on refresh when rotated
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub struct SpotifyOAuth {
    client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
    scopes: String,
    accounts_url: String,
    api_url: String,
}

impl SpotifyOAuth {
    pub fn new(client: Client, config: &SpotifyConfig) -> Self {
        Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            accounts_url: config.accounts_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), AuthError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(AuthError::NotConfigured),
        }
    }

    /// Where to send the user agent to grant access, echoing `state`.
    pub fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        let client_id = self.client_id.as_deref().ok_or(AuthError::NotConfigured)?;
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_url),
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("scope", self.scopes.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// Client credentials go in HTTP Basic auth, never in the form body.
    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
        let (client_id, client_secret) = self.credentials()?;

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(client_id, Some(client_secret))
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint { status, body });
        }

        Ok(response.json().await?)
    }

    /// Ask the identity endpoint about the token. Any non-success answer means "no".
    pub async fn verify(&self, access_token: &str) -> Result<bool, AuthError> {
        let response = self
            .client
            .get(format!("{}/me", self.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_client, spawn_upstream};
    use axum::{Form, Json, Router, http::HeaderMap, routing::post};
    use serde_json::json;
    use std::collections::HashMap;

    fn oauth(base: &str, with_secret: bool) -> SpotifyOAuth {
        let config = SpotifyConfig {
            client_id: Some("client-id".to_string()),
            client_secret: with_secret.then(|| "client-secret".to_string()),
            accounts_url: base.to_string(),
            api_url: base.to_string(),
            ..SpotifyConfig::default()
        };
        SpotifyOAuth::new(http_client(), &config)
    }

    #[test]
    fn authorize_url_carries_state_and_redirect() {
        let url = oauth("https://accounts.example", true).authorize_url("nonce123").unwrap();
        assert_eq!(url.path(), "/authorize");
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["state"], "nonce123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/api/auth/callback/spotify");
    }

    #[tokio::test]
    async fn exchange_uses_basic_auth_and_form_body() {
        let app = Router::new().route(
            "/api/token",
            post(|headers: HeaderMap, Form(form): Form<HashMap<String, String>>| async move {
                let auth = headers["authorization"].to_str().unwrap().to_string();
                assert!(auth.starts_with("Basic "));
                assert!(!form.contains_key("client_secret"));
                assert_eq!(form["grant_type"], "authorization_code");
                assert_eq!(form["code"], "the-code");
                Json(json!({
                    "access_token": "acc",
                    "refresh_token": "ref",
                    "expires_in": 1800,
                    "token_type": "Bearer"
                }))
            }),
        );
        let base = spawn_upstream(app).await;

        let grant = oauth(&base, true).exchange_code("the-code").await.unwrap();
        assert_eq!(grant.access_token, "acc");
        assert_eq!(grant.refresh_token.as_deref(), Some("ref"));
        assert_eq!(grant.expires_in, 1800);
    }

    #[tokio::test]
    async fn rejected_refresh_is_flagged() {
        let app = Router::new().route(
            "/api/token",
            post(|| async {
                (axum::http::StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" })))
            }),
        );
        let base = spawn_upstream(app).await;

        let err = oauth(&base, true).refresh("revoked").await.unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn missing_secret_fails_before_network() {
        let err = oauth("http://127.0.0.1:9", false).refresh("r").await.unwrap_err();
        assert!(matches!(err, AuthError::NotConfigured));
    }
}
