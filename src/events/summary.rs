//! Turns a summarizer reply into a [`HistoricalEvent`].
//!
//! Structured JSON is tried first, then the `Title:` / `Description:` /
//! `Category:` line layout (by label, else by position), then the
//! deterministic fallback.

use serde::Deserialize;

use super::models::{EventCategory, HistoricalEvent, fallback_title};

/// Why an enrichment ended up on the fallback path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Request failed, timed out, or no API key configured
    Unavailable,
    /// The service answered but the reply could not be parsed
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Structured(HistoricalEvent),
    HeuristicParsed(HistoricalEvent),
    Fallback {
        event: HistoricalEvent,
        reason: FallbackReason,
    },
}

impl EnrichmentOutcome {
    pub fn fallback(candidate: &str, reason: FallbackReason) -> Self {
        EnrichmentOutcome::Fallback {
            event: HistoricalEvent::fallback(candidate),
            reason,
        }
    }

    pub fn event(&self) -> &HistoricalEvent {
        match self {
            EnrichmentOutcome::Structured(event)
            | EnrichmentOutcome::HeuristicParsed(event)
            | EnrichmentOutcome::Fallback { event, .. } => event,
        }
    }

    pub fn into_event(self) -> HistoricalEvent {
        match self {
            EnrichmentOutcome::Structured(event)
            | EnrichmentOutcome::HeuristicParsed(event)
            | EnrichmentOutcome::Fallback { event, .. } => event,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            EnrichmentOutcome::Fallback { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentOutcome::Structured(_) => "structured",
            EnrichmentOutcome::HeuristicParsed(_) => "heuristic",
            EnrichmentOutcome::Fallback { reason: FallbackReason::Unavailable, .. } => "fallback:unavailable",
            EnrichmentOutcome::Fallback { reason: FallbackReason::Malformed, .. } => "fallback:malformed",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(default, alias = "Title")]
    title: String,
    #[serde(default, alias = "Description")]
    description: String,
    #[serde(default, alias = "Category")]
    category: String,
}

/// Parse the raw reply text for `candidate`. Never fails.
pub fn parse_summary(candidate: &str, content: &str) -> EnrichmentOutcome {
    if let Some(event) = parse_structured(candidate, content) {
        return EnrichmentOutcome::Structured(event);
    }
    // A broken JSON object is not a line layout
    if !content.trim_start().starts_with('{') {
        if let Some(event) = parse_labelled_lines(candidate, content) {
            return EnrichmentOutcome::HeuristicParsed(event);
        }
    }
    EnrichmentOutcome::fallback(candidate, FallbackReason::Malformed)
}

fn parse_structured(candidate: &str, content: &str) -> Option<HistoricalEvent> {
    let body = strip_code_fence(content.trim());
    let payload: SummaryPayload = serde_json::from_str(body).ok()?;
    if payload.title.trim().is_empty() {
        return None;
    }
    Some(assemble(candidate, &payload.title, &payload.description, &payload.category))
}

fn parse_labelled_lines(candidate: &str, content: &str) -> Option<HistoricalEvent> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 3 {
        return None;
    }

    let find = |label: &str| lines.iter().find_map(|&line| labelled_value(line, label));
    let (title, description, category) = (find("Title"), find("Description"), find("Category"));

    // Labels win over position, so chatter around the fields does not shift them
    if title.is_some() || description.is_some() || category.is_some() {
        return Some(assemble(
            candidate,
            title.unwrap_or_default(),
            description.unwrap_or_default(),
            category.unwrap_or_default(),
        ));
    }

    let [title, description, category, ..] = lines.as_slice() else {
        return None;
    };
    Some(assemble(candidate, unmark(title), unmark(description), unmark(category)))
}

/// Fill any blank field from the candidate so the record is always complete.
fn assemble(candidate: &str, title: &str, description: &str, category: &str) -> HistoricalEvent {
    let title = match title.trim() {
        "" => fallback_title(candidate),
        t => t.to_string(),
    };
    let description = match description.trim() {
        "" => candidate.trim().to_string(),
        d => d.to_string(),
    };
    let category = match category.trim() {
        "" => EventCategory::History,
        c => EventCategory::from(c),
    };
    let mut event = HistoricalEvent::new(title, description, category);
    if event.description.is_empty() {
        event.description = event.title.clone();
    }
    event
}

/// Value of a `Label: value` line, tolerating markdown around the label.
fn labelled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let line = unmark(line);
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = line[label.len()..].trim_start_matches('*');
    let value = rest.strip_prefix(':')?;
    Some(value.trim_start_matches('*').trim())
}

fn unmark(line: &str) -> &str {
    line.trim_start_matches(['*', '#', '-', ' ']).trim()
}

fn strip_code_fence(body: &str) -> &str {
    let Some(inner) = body.strip_prefix("```") else {
        return body;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
