//! Auth routes for the Spotify login flow and session checks

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::{debug, error};

use crate::auth::{AuthSessionManager, CallbackParams, CookieSession};
use crate::error::AppError;
use crate::server::AppState;

#[derive(Serialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// 302 Found with a `Location` header.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// GET /api/auth/spotify: issue a state nonce and redirect to Spotify.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut session = CookieSession::new(jar, state.secure_cookies());
    match state.auth.begin_login(&mut session) {
        Ok(url) => (session.into_jar(), found(url.as_str())).into_response(),
        Err(e) => {
            error!("Cannot start Spotify login: {}", e);
            AppError::Internal("Spotify client ID not configured".to_string()).into_response()
        }
    }
}

/// GET /api/auth/callback/spotify: always answers with a redirect.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let mut session = CookieSession::new(jar, state.secure_cookies());
    let params = params.map(|Query(p)| p).unwrap_or_default();

    let location = match state.auth.complete_login(&mut session, params).await {
        Ok(()) => "/".to_string(),
        Err(reason) => format!("/?error={}", reason.reason()),
    };
    (session.into_jar(), found(&location)).into_response()
}

/// GET /api/auth/check
pub async fn check(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let mut session = CookieSession::new(jar, state.secure_cookies());
    let before = AuthSessionManager::session_state(&session);
    let authenticated = state.auth.is_authenticated(&mut session).await;
    debug!(
        "Auth check: {:?} -> {:?}, authenticated={}",
        before,
        AuthSessionManager::session_state(&session),
        authenticated
    );
    (session.into_jar(), Json(AuthCheckResponse { authenticated }))
}

/// GET /api/auth/token: the current access token, refreshed if needed.
pub async fn token(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut session = CookieSession::new(jar, state.secure_cookies());
    match state.auth.access_token(&mut session).await {
        Some(token) => (session.into_jar(), Json(TokenResponse { token })).into_response(),
        None => (
            session.into_jar(),
            AppError::Unauthorized("No token found".to_string()),
        )
            .into_response(),
    }
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let mut session = CookieSession::new(jar, state.secure_cookies());
    AuthSessionManager::logout(&mut session);
    (session.into_jar(), StatusCode::NO_CONTENT)
}

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/spotify", get(login))
        .route("/api/auth/callback/spotify", get(callback))
        .route("/api/auth/check", get(check))
        .route("/api/auth/token", get(token))
        .route("/api/auth/logout", post(logout))
}
