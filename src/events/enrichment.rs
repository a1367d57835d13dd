use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use super::summary::{EnrichmentOutcome, FallbackReason, parse_summary};
use crate::config::OpenAiConfig;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("no OpenAI API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("no content in OpenAI response")]
    EmptyContent,
}

#[async_trait]
pub trait EventEnricher: Send + Sync {
    /// Summarize one candidate. Always yields a complete record; failures
    /// are reported through [`EnrichmentOutcome::Fallback`], never raised.
    async fn enrich(&self, candidate: &str) -> EnrichmentOutcome;
}

/// Summarizes candidates with the OpenAI chat completion API. No retries:
/// a failed call degrades to the fallback record straight away.
pub struct OpenAiEnricher {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    structured: bool,
}

impl OpenAiEnricher {
    pub fn new(client: Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            structured: config.structured_output,
        }
    }

    fn create_system_prompt(&self) -> String {
        let base = "You are a helpful assistant that summarizes historical events into a title, \
                    description, and category. The category should be one of: Politics, \
                    Technology, Science, Culture, Sports, or Other.";
        if self.structured {
            format!(
                "{} Respond with a JSON object with the string keys \"title\", \"description\" and \"category\".",
                base
            )
        } else {
            format!(
                "{} Answer in exactly three lines formatted as \"Title: ...\", \"Description: ...\" and \"Category: ...\".",
                base
            )
        }
    }

    async fn call_openai_api(&self, candidate: &str) -> Result<String, EnrichmentError> {
        let api_key = self.api_key.as_deref().ok_or(EnrichmentError::MissingApiKey)?;

        let mut payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": self.create_system_prompt()
                },
                {
                    "role": "user",
                    "content": format!(
                        "Please summarize this historical event into a title, description, and category: {}",
                        candidate
                    )
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        if self.structured {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status { status, body });
        }

        let json: Value = response.json().await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(EnrichmentError::EmptyContent)
    }
}

#[async_trait]
impl EventEnricher for OpenAiEnricher {
    async fn enrich(&self, candidate: &str) -> EnrichmentOutcome {
        let outcome = match self.call_openai_api(candidate).await {
            Ok(content) => parse_summary(candidate, &content),
            Err(EnrichmentError::MissingApiKey) => {
                debug!("Skipping summary, no OpenAI API key configured");
                EnrichmentOutcome::fallback(candidate, FallbackReason::Unavailable)
            }
            Err(e) => {
                warn!("Error generating summary: {}", e);
                EnrichmentOutcome::fallback(candidate, FallbackReason::Unavailable)
            }
        };
        debug!("Summary outcome: {}", outcome.kind());
        outcome
    }
}
