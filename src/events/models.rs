//! Event records produced by the enrichment pipeline.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Unstructured line of text extracted from encyclopedic markup
pub type RawEventCandidate = String;

/// Category attached to a historical event.
///
/// The summarizer is asked for one of the closed set; anything else it
/// answers is kept verbatim as `Custom`. `History` marks a fallback record
/// and stands in for a blank answer, so the name is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCategory {
    Politics,
    Technology,
    Science,
    Culture,
    Sports,
    Other,
    History,
    Custom(String),
}

impl EventCategory {
    pub fn as_str(&self) -> &str {
        match self {
            EventCategory::Politics => "Politics",
            EventCategory::Technology => "Technology",
            EventCategory::Science => "Science",
            EventCategory::Culture => "Culture",
            EventCategory::Sports => "Sports",
            EventCategory::Other => "Other",
            EventCategory::History => "History",
            EventCategory::Custom(name) => name,
        }
    }
}

impl From<String> for EventCategory {
    fn from(raw: String) -> Self {
        let name = raw.trim().trim_end_matches('.').trim();
        match name.to_ascii_lowercase().as_str() {
            "" => EventCategory::History,
            "politics" => EventCategory::Politics,
            "technology" => EventCategory::Technology,
            "science" => EventCategory::Science,
            "culture" => EventCategory::Culture,
            "sports" | "sport" => EventCategory::Sports,
            "other" => EventCategory::Other,
            "history" => EventCategory::History,
            _ => EventCategory::Custom(name.to_string()),
        }
    }
}

impl From<&str> for EventCategory {
    fn from(raw: &str) -> Self {
        EventCategory::from(raw.to_string())
    }
}

impl From<EventCategory> for String {
    fn from(category: EventCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    /// `YYYY-MM-DD`; the source does not expose per-event dates, so this is the day of enrichment
    pub date: String,
    pub title: String,
    pub description: String,
    pub category: EventCategory,
}

impl HistoricalEvent {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: EventCategory,
    ) -> Self {
        Self {
            date: today(),
            title: title.into(),
            description: description.into(),
            category,
        }
    }

    /// Deterministic, lower-fidelity record built from the candidate alone.
    pub fn fallback(candidate: &str) -> Self {
        let description = candidate.trim();
        let description = if description.is_empty() {
            "No description available"
        } else {
            description
        };
        Self::new(fallback_title(candidate), description, EventCategory::History)
    }
}

/// Text preceding the first period of the candidate.
pub fn fallback_title(candidate: &str) -> String {
    let trimmed = candidate.trim();
    let head = trimmed.split('.').next().unwrap_or_default().trim();
    match (head.is_empty(), trimmed.is_empty()) {
        (false, _) => head.to_string(),
        (true, false) => trimmed.to_string(),
        (true, true) => "Untitled event".to_string(),
    }
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_uses_text_before_first_period() {
        let event = HistoricalEvent::fallback("Apollo 11 landed on the Moon. Armstrong stepped out.");
        assert_eq!(event.title, "Apollo 11 landed on the Moon");
        assert_eq!(event.description, "Apollo 11 landed on the Moon. Armstrong stepped out.");
        assert_eq!(event.category, EventCategory::History);
        assert_eq!(event.date.len(), 10);
    }

    #[test]
    fn fallback_never_produces_empty_fields() {
        for candidate in ["", "   ", "...", ". leading period"] {
            let event = HistoricalEvent::fallback(candidate);
            assert!(!event.title.is_empty(), "empty title for {:?}", candidate);
            assert!(!event.description.is_empty());
            assert!(!event.category.as_str().is_empty());
        }
    }

    #[test]
    fn category_parsing_is_lenient() {
        assert_eq!(EventCategory::from(" science. "), EventCategory::Science);
        assert_eq!(EventCategory::from("SPORTS"), EventCategory::Sports);
        assert_eq!(
            EventCategory::from("Space Exploration"),
            EventCategory::Custom("Space Exploration".to_string())
        );
    }

    #[test]
    fn punctuation_only_category_becomes_history() {
        for raw in [".", "...", " . ", ""] {
            let category = EventCategory::from(raw);
            assert_eq!(category, EventCategory::History, "for {:?}", raw);
            assert!(!category.as_str().is_empty());
        }
    }

    #[test]
    fn category_serializes_as_plain_string() {
        let event = HistoricalEvent::new("Moon landing", "Apollo 11", EventCategory::Science);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "Science");

        let back: HistoricalEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.category, EventCategory::Science);
    }
}
