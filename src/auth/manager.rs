//! Spotify session lifecycle.
//!
//! ```text
//! Anonymous --login--> AwaitingCallback --callback(code)--> Authenticated
//!     ^                       |                                  |
//!     |<--callback(error)-----+                      access cookie expires
//!     |                                                          v
//!     +<--refresh rejected / absent--- AccessExpired --refresh--> Authenticated
//! ```
//!
//! No transition raises. Callback failures become a [`CallbackError`] whose
//! reason is surfaced to the UI; refresh failures become "no token".

use std::time::Duration;

use rand::{Rng, distributions::Alphanumeric};
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use super::oauth::{AuthError, SpotifyOAuth, TokenGrant};
use super::session::{SessionStore, TokenRole};
use crate::config::SpotifyConfig;

const STATE_NONCE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    AwaitingCallback,
    Authenticated,
    AccessExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    /// The platform redirected back with an `error` parameter
    AuthFailed,
    NoCode,
    /// `state` did not match the nonce issued at login
    StateMismatch,
    TokenExchangeFailed,
    ServerError,
}

impl CallbackError {
    pub const fn reason(self) -> &'static str {
        match self {
            CallbackError::AuthFailed => "auth_failed",
            CallbackError::NoCode => "no_code",
            CallbackError::StateMismatch => "state_mismatch",
            CallbackError::TokenExchangeFailed => "token_exchange_failed",
            CallbackError::ServerError => "server_error",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

pub struct AuthSessionManager {
    oauth: SpotifyOAuth,
    state_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthSessionManager {
    pub fn new(oauth: SpotifyOAuth, config: &SpotifyConfig) -> Self {
        Self {
            oauth,
            state_ttl: config.state_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Current state as implied by which tokens the store still holds.
    pub fn session_state<S: SessionStore>(store: &S) -> SessionState {
        let access = store.get(TokenRole::Access).is_some();
        let refresh = store.get(TokenRole::Refresh).is_some();
        let awaiting = store.get(TokenRole::State).is_some();
        match (access, refresh, awaiting) {
            (true, _, _) => SessionState::Authenticated,
            (false, true, _) => SessionState::AccessExpired,
            (false, false, true) => SessionState::AwaitingCallback,
            (false, false, false) => SessionState::Anonymous,
        }
    }

    /// Issue a fresh nonce and return the authorize URL that echoes it.
    pub fn begin_login<S: SessionStore>(&self, store: &mut S) -> Result<Url, AuthError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_NONCE_LEN)
            .map(char::from)
            .collect();
        let url = self.oauth.authorize_url(&nonce)?;
        store.set(TokenRole::State, &nonce, self.state_ttl);
        Ok(url)
    }

    /// Handle the platform's redirect back. On success the store holds the
    /// access and refresh tokens; on failure it holds neither.
    pub async fn complete_login<S: SessionStore + Send>(
        &self,
        store: &mut S,
        params: CallbackParams,
    ) -> Result<(), CallbackError> {
        let expected_state = store.get(TokenRole::State);
        store.clear(TokenRole::State);

        if let Some(error) = params.error {
            warn!("Spotify auth error: {}", error);
            return Err(CallbackError::AuthFailed);
        }

        let Some(code) = params.code.filter(|c| !c.is_empty()) else {
            warn!("No code received from Spotify");
            return Err(CallbackError::NoCode);
        };

        if expected_state.is_none() || params.state != expected_state {
            warn!("Spotify callback state does not match the issued nonce");
            return Err(CallbackError::StateMismatch);
        }

        match self.oauth.exchange_code(&code).await {
            Ok(grant) => {
                self.store_grant(store, &grant);
                info!("Spotify login completed");
                Ok(())
            }
            Err(AuthError::NotConfigured) => {
                error!("Spotify callback hit without client credentials configured");
                Err(CallbackError::ServerError)
            }
            Err(e) => {
                warn!("Failed to exchange code for token: {}", e);
                Err(CallbackError::TokenExchangeFailed)
            }
        }
    }

    /// A usable access token, silently refreshing when only the refresh
    /// token is left. `None` means the caller is unauthenticated.
    pub async fn access_token<S: SessionStore + Send>(&self, store: &mut S) -> Option<String> {
        if let Some(token) = store.get(TokenRole::Access) {
            return Some(token);
        }

        let refresh_token = store.get(TokenRole::Refresh)?;
        match self.oauth.refresh(&refresh_token).await {
            Ok(grant) => {
                self.store_grant(store, &grant);
                info!("Refreshed Spotify access token");
                Some(grant.access_token)
            }
            Err(e) => {
                warn!("Error refreshing Spotify token: {}", e);
                if e.is_rejection() {
                    store.clear(TokenRole::Refresh);
                }
                None
            }
        }
    }

    /// Lightweight identity check; any failure reads as "not authenticated".
    pub async fn is_authenticated<S: SessionStore + Send>(&self, store: &mut S) -> bool {
        let Some(token) = self.access_token(store).await else {
            return false;
        };
        match self.oauth.verify(&token).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Error checking authentication: {}", e);
                false
            }
        }
    }

    /// Drop every session token.
    pub fn logout<S: SessionStore>(store: &mut S) {
        for role in TokenRole::ALL {
            store.clear(role);
        }
    }

    fn store_grant<S: SessionStore>(&self, store: &mut S, grant: &TokenGrant) {
        store.set(
            TokenRole::Access,
            &grant.access_token,
            Duration::from_secs(grant.expires_in),
        );
        if let Some(refresh_token) = &grant.refresh_token {
            store.set(TokenRole::Refresh, refresh_token, self.refresh_ttl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::InMemorySessionStore;
    use crate::test_support::{dead_upstream, http_client, spawn_upstream};
    use axum::{Form, Json, Router, http::{HeaderMap, StatusCode}, response::IntoResponse, routing::{get, post}};
    use serde_json::json;
    use std::collections::HashMap;

    async fn fake_spotify() -> String {
        let app = Router::new()
            .route(
                "/api/token",
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    match (form["grant_type"].as_str(), form.get("code"), form.get("refresh_token")) {
                        ("authorization_code", Some(code), _) if code == "good-code" => Json(json!({
                            "access_token": "fresh-access",
                            "refresh_token": "fresh-refresh",
                            "expires_in": 3600
                        }))
                        .into_response(),
                        ("refresh_token", _, Some(token)) if token == "valid-refresh" => {
                            Json(json!({ "access_token": "renewed-access", "expires_in": 3600 }))
                                .into_response()
                        }
                        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" })))
                            .into_response(),
                    }
                }),
            )
            .route(
                "/me",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer fresh-access") | Some("Bearer renewed-access") => {
                            Json(json!({ "id": "user" })).into_response()
                        }
                        _ => StatusCode::UNAUTHORIZED.into_response(),
                    }
                }),
            );
        spawn_upstream(app).await
    }

    fn manager(base: &str) -> AuthSessionManager {
        let config = SpotifyConfig {
            client_id: Some("client-id".to_string()),
            client_secret: Some("client-secret".to_string()),
            accounts_url: base.to_string(),
            api_url: base.to_string(),
            ..SpotifyConfig::default()
        };
        AuthSessionManager::new(SpotifyOAuth::new(http_client(), &config), &config)
    }

    fn awaiting(store: &mut InMemorySessionStore, m: &AuthSessionManager) -> String {
        let url = m.begin_login(store).unwrap();
        url.query_pairs().find(|(k, _)| k == "state").unwrap().1.into_owned()
    }

    #[tokio::test]
    async fn login_then_callback_authenticates() {
        let m = manager(&fake_spotify().await);
        let mut store = InMemorySessionStore::new();
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::Anonymous);

        let state = awaiting(&mut store, &m);
        assert_eq!(state.len(), STATE_NONCE_LEN);
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::AwaitingCallback);

        let params = CallbackParams { code: Some("good-code".into()), state: Some(state), error: None };
        m.complete_login(&mut store, params).await.unwrap();

        assert_eq!(AuthSessionManager::session_state(&store), SessionState::Authenticated);
        assert_eq!(store.get(TokenRole::Access).as_deref(), Some("fresh-access"));
        assert_eq!(store.get(TokenRole::Refresh).as_deref(), Some("fresh-refresh"));
        assert_eq!(store.get(TokenRole::State), None);
        assert!(m.is_authenticated(&mut store).await);
    }

    #[tokio::test]
    async fn callback_error_sets_no_tokens() {
        let m = manager(&fake_spotify().await);
        let mut store = InMemorySessionStore::new();
        let state = awaiting(&mut store, &m);

        let params = CallbackParams { error: Some("access_denied".into()), state: Some(state), code: None };
        let err = m.complete_login(&mut store, params).await.unwrap_err();

        assert_eq!(err.reason(), "auth_failed");
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn callback_failures_are_categorized() {
        let m = manager(&fake_spotify().await);

        let mut store = InMemorySessionStore::new();
        let state = awaiting(&mut store, &m);
        let err = m
            .complete_login(&mut store, CallbackParams { state: Some(state), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(err, CallbackError::NoCode);

        let mut store = InMemorySessionStore::new();
        awaiting(&mut store, &m);
        let params = CallbackParams { code: Some("good-code".into()), state: Some("forged".into()), error: None };
        assert_eq!(m.complete_login(&mut store, params).await.unwrap_err(), CallbackError::StateMismatch);

        let mut store = InMemorySessionStore::new();
        let state = awaiting(&mut store, &m);
        let params = CallbackParams { code: Some("bad-code".into()), state: Some(state), error: None };
        assert_eq!(
            m.complete_login(&mut store, params).await.unwrap_err(),
            CallbackError::TokenExchangeFailed
        );
        assert_eq!(store.get(TokenRole::Access), None);
    }

    #[tokio::test]
    async fn expired_access_is_silently_refreshed() {
        let m = manager(&fake_spotify().await);
        let mut store = InMemorySessionStore::new();
        store.set(TokenRole::Access, "old-access", Duration::ZERO);
        store.set(TokenRole::Refresh, "valid-refresh", Duration::from_secs(60));
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::AccessExpired);

        let token = m.access_token(&mut store).await;
        assert_eq!(token.as_deref(), Some("renewed-access"));
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::Authenticated);
        // Refresh token was not rotated, so the original stays
        assert_eq!(store.get(TokenRole::Refresh).as_deref(), Some("valid-refresh"));
    }

    #[tokio::test]
    async fn rejected_refresh_returns_to_anonymous() {
        let m = manager(&fake_spotify().await);
        let mut store = InMemorySessionStore::new();
        store.set(TokenRole::Refresh, "revoked-refresh", Duration::from_secs(60));

        assert_eq!(m.access_token(&mut store).await, None);
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::Anonymous);
        assert!(!m.is_authenticated(&mut store).await);
    }

    #[tokio::test]
    async fn unreachable_accounts_service_keeps_refresh_token() {
        let m = manager(&dead_upstream().await);
        let mut store = InMemorySessionStore::new();
        store.set(TokenRole::Refresh, "valid-refresh", Duration::from_secs(60));

        assert_eq!(m.access_token(&mut store).await, None);
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::AccessExpired);
    }

    #[tokio::test]
    async fn identity_rejection_reads_unauthenticated() {
        let m = manager(&fake_spotify().await);
        let mut store = InMemorySessionStore::new();
        store.set(TokenRole::Access, "revoked-access", Duration::from_secs(60));
        assert!(!m.is_authenticated(&mut store).await);
    }

    #[test]
    fn logout_clears_everything() {
        let mut store = InMemorySessionStore::new();
        for role in TokenRole::ALL {
            store.set(role, "x", Duration::from_secs(60));
        }
        AuthSessionManager::logout(&mut store);
        assert_eq!(AuthSessionManager::session_state(&store), SessionState::Anonymous);
    }
}
