//! Spotify Web API passthrough, gated on a session token.

pub mod search;

pub use search::{MusicSearch, SearchError};
