use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::{CookieSession, SessionStore, TokenRole};
use crate::error::AppError;
use crate::routes::events::YearQuery;
use crate::server::AppState;
use crate::spotify::SearchError;

/// GET /api/spotify/search?year=YYYY
pub async fn search(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<YearQuery>,
) -> Response {
    let mut session = CookieSession::new(jar, state.secure_cookies());
    let token = state.auth.access_token(&mut session).await;

    match state.music.search(query.year.as_deref(), token.as_deref()).await {
        Ok(payload) => (session.into_jar(), Json(payload)).into_response(),
        Err(e) => {
            // Forget the rejected token so the next call goes through a refresh
            if matches!(e, SearchError::UpstreamUnauthorized) {
                session.clear(TokenRole::Access);
            }
            (session.into_jar(), AppError::from(e)).into_response()
        }
    }
}

pub fn create_spotify_routes() -> Router<AppState> {
    Router::new().route("/api/spotify/search", get(search))
}
