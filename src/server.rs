//! # Server Module
//!
//! HTTP server setup and route configuration for the Time Travel Journal.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::auth::{AuthSessionManager, SpotifyOAuth};
use crate::config::Config;
use crate::events::{EventEnricher, EventsOrchestrator, OpenAiEnricher, WikipediaSource};
use crate::routes;
use crate::spotify::MusicSearch;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: Arc<EventsOrchestrator>,
    pub enricher: Arc<dyn EventEnricher>,
    pub auth: Arc<AuthSessionManager>,
    pub music: Arc<MusicSearch>,
}

impl AppState {
    /// Wire every component from configuration around one shared HTTP client.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.server.upstream_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let source = Arc::new(WikipediaSource::new(client.clone(), &config.wikipedia, &config.events));
        let enricher: Arc<dyn EventEnricher> = Arc::new(OpenAiEnricher::new(client.clone(), &config.openai));
        let events = Arc::new(EventsOrchestrator::new(source, enricher.clone(), &config.events));

        let oauth = SpotifyOAuth::new(client.clone(), &config.spotify);
        let auth = Arc::new(AuthSessionManager::new(oauth, &config.spotify));
        let music = Arc::new(MusicSearch::new(client, &config.spotify));

        Ok(Self {
            config: Arc::new(config),
            events,
            enricher,
            auth,
            music,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.server.secure_cookies
    }
}

/// Build the application router with CORS applied.
pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_origins
        .iter()
        // Credentialed CORS cannot answer with a wildcard origin
        .filter(|origin| {
            if origin.as_str() == "*" {
                tracing::warn!("Ignoring wildcard CORS origin, list origins explicitly");
                return false;
            }
            true
        })
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Router::new()
        .route("/ping", get(routes::health::ping))
        .merge(routes::auth::create_auth_routes())
        .merge(routes::events::create_event_routes())
        .merge(routes::spotify::create_spotify_routes())
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT])
                    .allow_credentials(true),
            ),
        )
        .with_state(state)
}

/// Starts the HTTP server and serves until the process is terminated.
pub async fn start(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, event summaries will use the fallback format");
    }
    if config.spotify.client_id.is_none() || config.spotify.client_secret.is_none() {
        tracing::warn!("Spotify client credentials not set, login is disabled");
    }

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("🚀 Time Travel Journal starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
