// # Routes Module
//
// - HTTP route handlers, grouped by the API area they serve.
// - Each module exposes a `create_*_routes()` builder merged in `server.rs`.

/// Health check endpoint
pub mod health;

/// Spotify login, callback, session check, token and logout
pub mod auth;

/// Historical events, year overview and single-event summaries
pub mod events;

/// Token-gated Spotify search passthrough
pub mod spotify;
