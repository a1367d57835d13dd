//! # Events Module
//!
//! Year → enriched historical events pipeline:
//! - `source`: Wikipedia adapter producing raw candidate strings
//! - `enrichment`: OpenAI-backed summarizer turning a candidate into a record
//! - `summary`: parsing of the summarizer reply, with deterministic fallback
//! - `orchestrator`: bounded, concurrent composition of the two

pub mod enrichment;
pub mod models;
pub mod orchestrator;
pub mod source;
pub mod summary;

pub use enrichment::{EventEnricher, OpenAiEnricher};
pub use models::{EventCategory, HistoricalEvent, RawEventCandidate};
pub use orchestrator::EventsOrchestrator;
pub use source::{EventSource, WikipediaSource};
pub use summary::{EnrichmentOutcome, FallbackReason};
