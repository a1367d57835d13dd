use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use super::enrichment::EventEnricher;
use super::models::HistoricalEvent;
use super::source::EventSource;
use crate::config::EventsConfig;

/// Composes the event source and the enricher into the year → events pipeline.
pub struct EventsOrchestrator {
    source: Arc<dyn EventSource>,
    enricher: Arc<dyn EventEnricher>,
    max_events: usize,
    enrich_timeout: Duration,
}

impl EventsOrchestrator {
    pub fn new(
        source: Arc<dyn EventSource>,
        enricher: Arc<dyn EventEnricher>,
        config: &EventsConfig,
    ) -> Self {
        Self {
            source,
            enricher,
            max_events: config.max_events,
            enrich_timeout: config.enrich_timeout,
        }
    }

    /// Enriched events for `year`, at most `max_events` long, in source order.
    ///
    /// Never fails: any error along the way yields an empty list, and the
    /// enricher is not called at all when the source has nothing.
    pub async fn get_events(&self, year: i32) -> Vec<HistoricalEvent> {
        let fetch = AssertUnwindSafe(self.source.fetch_candidates(year)).catch_unwind();
        let candidates = match fetch.await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                error!("Error in get_events for {}: {}", year, e);
                return Vec::new();
            }
            Err(_) => {
                error!("Event source panicked for {}", year);
                return Vec::new();
            }
        };

        info!("Found {} events for year {}", candidates.len(), year);
        if candidates.is_empty() {
            return Vec::new();
        }

        let start_time = Instant::now();

        // Fan out; join_all yields results in input order regardless of completion order
        let tasks: Vec<_> = candidates
            .iter()
            .take(self.max_events)
            .map(|candidate| self.enrich_bounded(candidate))
            .collect();
        let events = futures::future::join_all(tasks).await;

        debug!("Enriched {} events for {} in {:?}", events.len(), year, start_time.elapsed());
        events
    }

    async fn enrich_bounded(&self, candidate: &str) -> HistoricalEvent {
        let call = AssertUnwindSafe(self.enricher.enrich(candidate)).catch_unwind();
        match timeout(self.enrich_timeout, call).await {
            Ok(Ok(outcome)) => outcome.into_event(),
            Ok(Err(_)) => {
                error!("Enricher panicked, using fallback record");
                HistoricalEvent::fallback(candidate)
            }
            Err(_) => {
                warn!("Summary timed out after {:?}, using fallback record", self.enrich_timeout);
                HistoricalEvent::fallback(candidate)
            }
        }
    }
}
