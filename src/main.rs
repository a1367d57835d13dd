//! # Time Travel Journal server
//!
//! ## Environment Setup
//! Copy your Spotify and OpenAI credentials into `.env`:
//! ```bash
//! SPOTIFY_CLIENT_ID=...
//! SPOTIFY_CLIENT_SECRET=...
//! OPENAI_API_KEY=...
//! ```
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! curl http://localhost:3000/ping
//! ```

use anyhow::Result;
use time_travel_journal::{Config, server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting Time Travel Journal...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });

    let config = Config::from_env()?;
    server::start(config).await
}
