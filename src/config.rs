//! Configuration module for environment variables and application settings
//!
//! Everything is read once at startup into [`Config`] and handed to the
//! components that need it. Nothing below `main` touches the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;

const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/api/auth/callback/spotify";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// HTTP listener and cookie settings
    pub server: ServerConfig,

    /// Spotify OAuth + Web API settings
    pub spotify: SpotifyConfig,

    /// OpenAI chat completion settings used for event summaries
    pub openai: OpenAiConfig,

    /// Wikipedia parse API settings
    pub wikipedia: WikipediaConfig,

    /// Limits for the events pipeline
    pub events: EventsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Sets the `Secure` attribute on session cookies (production only)
    pub secure_cookies: bool,
    /// Request timeout applied to every outbound HTTP call
    pub upstream_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: String,
    pub accounts_url: String,
    pub api_url: String,
    pub search_limit: u32,
    pub state_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Optional: without a key every summary degrades to the fallback record
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask for a JSON object instead of three labelled lines
    pub structured_output: bool,
}

#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub api_url: String,
    /// Page section holding the "Events" list
    pub section: u32,
}

#[derive(Debug, Clone)]
pub struct EventsConfig {
    /// Candidates kept after extraction
    pub max_candidates: usize,
    /// Candidates sent to the summarizer
    pub max_events: usize,
    /// Fragments of this many characters or fewer are dropped
    pub min_candidate_len: usize,
    pub enrich_timeout: Duration,
    pub min_year: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: false,
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: "user-read-private user-read-email".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
            search_limit: 10,
            state_ttl: Duration::from_secs(60 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.7,
            structured_output: true,
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            section: 1,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            max_events: 5,
            min_candidate_len: 10,
            enrich_timeout: Duration::from_secs(15),
            min_year: 1920,
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and environment variables
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; real deployments set the environment directly
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let app_env = env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("PORT")
                    .or_else(|_| env::var("SERVER_PORT"))
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                cors_origins: env::var("CORS_ORIGINS")
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|origin| !origin.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or(defaults.server.cors_origins),
                secure_cookies: app_env.eq_ignore_ascii_case("production"),
                upstream_timeout: Duration::from_secs(
                    parse_env("UPSTREAM_TIMEOUT_SECS", defaults.server.upstream_timeout.as_secs()),
                ),
            },

            spotify: SpotifyConfig {
                client_id: non_empty_env("SPOTIFY_CLIENT_ID"),
                client_secret: non_empty_env("SPOTIFY_CLIENT_SECRET"),
                redirect_uri: non_empty_env("REDIRECT_URI")
                    .or_else(|| non_empty_env("SPOTIFY_REDIRECT_URI"))
                    .unwrap_or(defaults.spotify.redirect_uri),
                scopes: env::var("SPOTIFY_SCOPES").unwrap_or(defaults.spotify.scopes),
                accounts_url: env::var("SPOTIFY_ACCOUNTS_URL").unwrap_or(defaults.spotify.accounts_url),
                api_url: env::var("SPOTIFY_API_URL").unwrap_or(defaults.spotify.api_url),
                ..defaults.spotify
            },

            openai: OpenAiConfig {
                api_key: non_empty_env("OPENAI_API_KEY"),
                api_url: env::var("OPENAI_API_URL").unwrap_or(defaults.openai.api_url),
                model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                structured_output: parse_env("OPENAI_STRUCTURED_OUTPUT", defaults.openai.structured_output),
                ..defaults.openai
            },

            wikipedia: WikipediaConfig {
                api_url: env::var("WIKIPEDIA_API_URL").unwrap_or(defaults.wikipedia.api_url),
                ..defaults.wikipedia
            },

            events: EventsConfig {
                enrich_timeout: Duration::from_secs(
                    parse_env("ENRICH_TIMEOUT_SECS", defaults.events.enrich_timeout.as_secs()),
                ),
                ..defaults.events
            },
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    parse_or(env::var(key).ok(), default)
}

/// Parse a raw setting, keeping `default` when it is absent or unparsable.
fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(default)
}
