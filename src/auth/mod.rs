//! # Authentication Module
//!
//! Spotify OAuth authorization-code flow with split access/refresh tokens.
//! The access token may lapse while the refresh token is still valid; the
//! manager renews it silently on the next call that needs it.

pub mod manager;
pub mod oauth;
pub mod session;

pub use manager::{AuthSessionManager, CallbackError, CallbackParams, SessionState};
pub use oauth::{AuthError, SpotifyOAuth, TokenGrant};
pub use session::{CookieSession, InMemorySessionStore, SessionStore, TokenRole};
