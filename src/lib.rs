//! # Time Travel Journal
//!
//! Backend for a "pick a year" page: historical events for the year,
//! summarized by an LLM, plus a Spotify-backed playlist for the era.
//!
//! ## Architecture
//! - `events`: Wikipedia adapter, OpenAI enrichment, and the orchestrator
//!   that fans enrichment out concurrently
//! - `auth`: Spotify OAuth session lifecycle with silent refresh
//! - `spotify`: token-gated search passthrough
//! - `theme`: decade look-up and the playlist card
//! - `routes`: HTTP handlers, `server`: router and listener
//! - `config`: environment configuration, `error`: HTTP error mapping

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod routes;
pub mod server;
pub mod spotify;
pub mod theme;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use server::{AppState, build_router};
