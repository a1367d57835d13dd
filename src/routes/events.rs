//! Historical events endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::events::{FallbackReason, HistoricalEvent};
use crate::server::AppState;
use crate::theme::{DecadeTheme, PlaylistCard, decade_theme, playlist_for_year};

const NO_EVENTS_MESSAGE: &str = "No historical events found for this year.";

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub year: i32,
    pub events: Vec<HistoricalEvent>,
}

#[derive(Debug, Serialize)]
pub struct YearData {
    pub year: i32,
    pub events: Vec<HistoricalEvent>,
    pub theme: DecadeTheme,
    pub playlist: PlaylistCard,
    /// Set when there is nothing to show, so the UI can say so
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub event: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Parse and range-check a year against `min_year..=current year`.
fn validate_year(raw: Option<&str>, min_year: i32) -> Result<i32, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .ok_or_else(|| AppError::BadRequest("Year parameter is required".to_string()))?;
    let year: i32 = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid year parameter: {}", raw)))?;

    let max_year = Utc::now().year();
    if !(min_year..=max_year).contains(&year) {
        return Err(AppError::BadRequest(format!(
            "Year must be between {} and {}",
            min_year, max_year
        )));
    }
    Ok(year)
}

/// GET /api/events?year=YYYY
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<EventsResponse>, AppError> {
    let year = validate_year(query.year.as_deref(), state.config.events.min_year)?;
    info!("Fetching events for year: {}", year);
    let events = state.events.get_events(year).await;
    Ok(Json(EventsResponse { year, events }))
}

/// GET /api/year/{year}: events plus the decade theme and playlist card.
pub async fn get_year(
    State(state): State<AppState>,
    Path(raw_year): Path<String>,
) -> Result<Json<YearData>, AppError> {
    let year = validate_year(Some(&raw_year), state.config.events.min_year)?;
    let events = state.events.get_events(year).await;
    let error = events.is_empty().then(|| NO_EVENTS_MESSAGE.to_string());

    Ok(Json(YearData {
        year,
        events,
        theme: decade_theme(year),
        playlist: playlist_for_year(year),
        error,
    }))
}

/// POST /api/summarize with `{"event": "..."}`.
///
/// A malformed reply from the summarizer still answers 200 with the fallback
/// record; only an unreachable summarizer is reported as a 500.
pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if request.event.trim().is_empty() {
        return Err(AppError::BadRequest("Event text is required".to_string()));
    }

    let outcome = state.enricher.enrich(&request.event).await;
    if outcome.fallback_reason() == Some(FallbackReason::Unavailable) {
        return Err(AppError::Internal("Failed to generate summary".to_string()));
    }

    let event = outcome.into_event();
    Ok(Json(SummaryResponse {
        title: event.title,
        description: event.description,
        category: event.category.to_string(),
    }))
}

pub fn create_event_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(get_events))
        .route("/api/year/{year}", get(get_year))
        .route("/api/summarize", post(summarize))
}
