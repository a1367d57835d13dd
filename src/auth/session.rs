//! Session storage for the Spotify tokens.
//!
//! Each token lives under a [`TokenRole`] with its own lifetime. In production
//! the store is the request's cookie jar; tests use [`InMemorySessionStore`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRole {
    Access,
    Refresh,
    /// CSRF nonce echoed through the authorize redirect
    State,
}

impl TokenRole {
    pub const ALL: [TokenRole; 3] = [TokenRole::Access, TokenRole::Refresh, TokenRole::State];

    pub const fn cookie_name(self) -> &'static str {
        match self {
            TokenRole::Access => "spotify_access_token",
            TokenRole::Refresh => "spotify_refresh_token",
            TokenRole::State => "spotify_auth_state",
        }
    }
}

pub trait SessionStore {
    fn get(&self, role: TokenRole) -> Option<String>;
    fn set(&mut self, role: TokenRole, token: &str, ttl: Duration);
    fn clear(&mut self, role: TokenRole);
}

/// Cookie-backed store. Writes accumulate in the jar, which the handler
/// returns so they become `Set-Cookie` headers.
#[derive(Debug, Clone)]
pub struct CookieSession {
    jar: CookieJar,
    secure: bool,
}

impl CookieSession {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionStore for CookieSession {
    fn get(&self, role: TokenRole) -> Option<String> {
        self.jar
            .get(role.cookie_name())
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set(&mut self, role: TokenRole, token: &str, ttl: Duration) {
        let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let cookie = Cookie::build((role.cookie_name(), token.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(max_age));
        self.jar = self.jar.clone().add(cookie);
    }

    fn clear(&mut self, role: TokenRole) {
        self.jar = self
            .jar
            .clone()
            .remove(Cookie::build(role.cookie_name()).path("/"));
    }
}

/// Map-backed store with real expiry, mirroring how a browser drops cookies.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: HashMap<TokenRole, (String, Instant)>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, role: TokenRole) -> Option<String> {
        self.entries
            .get(&role)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(token, _)| token.clone())
    }

    fn set(&mut self, role: TokenRole, token: &str, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(role, (token.to_string(), expires_at));
    }

    fn clear(&mut self, role: TokenRole) {
        self.entries.remove(&role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_entries_expire() {
        let mut store = InMemorySessionStore::new();
        store.set(TokenRole::Access, "a", Duration::ZERO);
        store.set(TokenRole::Refresh, "r", Duration::from_secs(60));
        assert_eq!(store.get(TokenRole::Access), None);
        assert_eq!(store.get(TokenRole::Refresh).as_deref(), Some("r"));

        store.clear(TokenRole::Refresh);
        assert_eq!(store.get(TokenRole::Refresh), None);
    }

    #[test]
    fn cookie_session_sets_secure_attributes() {
        let mut session = CookieSession::new(CookieJar::new(), true);
        session.set(TokenRole::Access, "abc", Duration::from_secs(3600));
        assert_eq!(session.get(TokenRole::Access).as_deref(), Some("abc"));

        let jar = session.into_jar();
        let cookie = jar.get("spotify_access_token").unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn cookie_session_clear_hides_value() {
        let jar = CookieJar::new().add(Cookie::new("spotify_refresh_token", "r"));
        let mut session = CookieSession::new(jar, false);
        assert!(session.get(TokenRole::Refresh).is_some());
        session.clear(TokenRole::Refresh);
        assert!(session.get(TokenRole::Refresh).is_none());
    }
}
