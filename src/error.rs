//! HTTP-boundary error type.
//!
//! Component errors are recovered close to where they happen; whatever is left
//! reaches a handler as an [`AppError`] and is rendered as `{ "error": msg }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::spotify::SearchError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed client input
    #[error("{0}")]
    BadRequest(String),

    /// Missing, expired or rejected credentials; callers should re-authenticate
    #[error("{0}")]
    Unauthorized(String),

    /// Anything else, including upstream failures without a sensible default
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Unauthenticated => AppError::Unauthorized("No access token".to_string()),
            SearchError::UpstreamUnauthorized => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            SearchError::MissingYear => {
                AppError::BadRequest("Year parameter is required".to_string())
            }
            SearchError::InvalidYear(raw) => {
                AppError::BadRequest(format!("Invalid year parameter: {}", raw))
            }
            SearchError::Upstream(_) | SearchError::Http(_) => {
                AppError::Internal("Failed to search Spotify".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_keep_auth_failures_distinct() {
        let stale: AppError = SearchError::UpstreamUnauthorized.into();
        assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

        let missing: AppError = SearchError::Unauthenticated.into();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let transient: AppError = SearchError::Upstream("502 Bad Gateway".into()).into();
        assert_eq!(transient.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let no_year: AppError = SearchError::MissingYear.into();
        assert_eq!(no_year.status(), StatusCode::BAD_REQUEST);
    }
}
