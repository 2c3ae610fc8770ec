//! Ticket engine: cache gate in front of the fetch, reconcile and aggregate
//! pipeline.

mod cache;
mod clock;
mod types;

pub use cache::{CacheGate, CachedSnapshot};
pub use clock::{Clock, SystemClock};
pub use types::{EngineError, ResponseData};

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::leaderboard::build_leaderboard;
use crate::metrics;
use crate::reconcile::reconcile;
use crate::source::TicketSource;
use crate::ticket::NormalizedTicket;

/// Entry point used by the HTTP layer.
///
/// Serves the cached snapshot while it is fresh. Misses and bypass requests
/// run the pipeline; concurrent misses share one refresh.
pub struct TicketEngine {
    primary: Arc<dyn TicketSource>,
    secondary: Option<Arc<dyn TicketSource>>,
    cache: CacheGate,
    clock: Arc<dyn Clock>,
    refresh_lock: Mutex<()>,
}

impl TicketEngine {
    pub fn new(
        primary: Arc<dyn TicketSource>,
        secondary: Option<Arc<dyn TicketSource>>,
        cache_duration_secs: u64,
    ) -> Self {
        Self::with_clock(primary, secondary, cache_duration_secs, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit time source.
    pub fn with_clock(
        primary: Arc<dyn TicketSource>,
        secondary: Option<Arc<dyn TicketSource>>,
        cache_duration_secs: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache: CacheGate::new(cache_duration_secs),
            clock,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Whether the primary source has its credentials.
    pub fn is_configured(&self) -> bool {
        self.primary.is_configured()
    }

    /// Age of the current snapshot in whole seconds, if any.
    pub async fn cache_age_secs(&self) -> Option<u64> {
        self.cache.age(self.clock.now()).await
    }

    /// Get the leaderboard payload.
    ///
    /// With `bypass_cache` the pipeline always runs; concurrent bypass
    /// requests are serialized, not shared. A failed run leaves the previous
    /// snapshot in place.
    pub async fn get_tickets(&self, bypass_cache: bool) -> Result<ResponseData, EngineError> {
        if !self.is_configured() {
            metrics::TICKET_REQUESTS.with_label_values(&["failed"]).inc();
            return Err(EngineError::Configuration(format!(
                "{} token not configured",
                self.primary.name()
            )));
        }

        let current = self.cache.snapshot().await;
        if let Some(snapshot) = current.as_ref().filter(|_| !bypass_cache) {
            if let Some(age) = self.cache.fresh_age(snapshot, self.clock.now()) {
                debug!(age_secs = age, "Serving tickets from cache");
                metrics::TICKET_REQUESTS.with_label_values(&["cached"]).inc();
                return Ok(snapshot.payload.served_from_cache(age));
            }
        }

        let seen_generation = current.map(|s| s.generation).unwrap_or(0);
        let _guard = self.refresh_lock.lock().await;

        // A stale miss may reuse a refresh that finished while it waited.
        // A bypass always reads upstream itself.
        if !bypass_cache {
            if let Some(snapshot) = self.cache.snapshot().await {
                if snapshot.generation > seen_generation {
                    debug!("Reusing refresh completed by a concurrent request");
                    metrics::TICKET_REQUESTS.with_label_values(&["refreshed"]).inc();
                    return Ok(snapshot.payload.served_fresh());
                }
            }
        }

        match self.refresh().await {
            Ok(payload) => {
                metrics::TICKET_REQUESTS.with_label_values(&["refreshed"]).inc();
                Ok(payload)
            }
            Err(e) => {
                metrics::TICKET_REQUESTS.with_label_values(&["failed"]).inc();
                Err(e)
            }
        }
    }

    /// Run the pipeline and store the result.
    async fn refresh(&self) -> Result<ResponseData, EngineError> {
        let started = Instant::now();
        info!("Refreshing ticket data");

        let (primary, secondary) =
            tokio::join!(self.primary.fetch_tickets(), self.fetch_secondary());

        let primary = match primary {
            Ok(tickets) => tickets,
            Err(e) => {
                error!(source = self.primary.name(), error = %e, "Primary source fetch failed");
                metrics::SOURCE_FAILURES
                    .with_label_values(&[self.primary.name()])
                    .inc();
                metrics::PIPELINE_DURATION
                    .with_label_values(&["failed"])
                    .observe(started.elapsed().as_secs_f64());
                return Err(e.into());
            }
        };

        metrics::SOURCE_TICKETS
            .with_label_values(&[self.primary.name()])
            .set(primary.len() as i64);

        let reconciliation = reconcile(primary, secondary);
        let leaderboard = build_leaderboard(&reconciliation.tickets);
        let captured_at = self.clock.now();

        let payload = ResponseData {
            success: true,
            total_tickets: reconciliation.tickets.len(),
            leaderboard,
            last_updated: captured_at,
            cached: false,
            cache_age: None,
            data_sources: reconciliation.stats,
        };

        self.cache.store(payload.clone(), captured_at).await;

        metrics::PIPELINE_DURATION
            .with_label_values(&["success"])
            .observe(started.elapsed().as_secs_f64());

        info!(
            total_tickets = payload.total_tickets,
            referrers = payload.leaderboard.len(),
            from_primary = payload.data_sources.from_primary,
            only_in_secondary = payload.data_sources.only_in_secondary,
            referrers_updated = payload.data_sources.referrers_updated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ticket data refreshed"
        );

        Ok(payload)
    }

    /// Secondary tickets, or none if the source is absent or fails.
    async fn fetch_secondary(&self) -> Vec<NormalizedTicket> {
        let Some(source) = &self.secondary else {
            return Vec::new();
        };
        if !source.is_configured() {
            debug!(source = source.name(), "Secondary source not configured, skipping");
            return Vec::new();
        }

        match source.fetch_tickets().await {
            Ok(tickets) => {
                metrics::SOURCE_TICKETS
                    .with_label_values(&[source.name()])
                    .set(tickets.len() as i64);
                tickets
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    error = %e,
                    "Secondary source failed, continuing without it"
                );
                metrics::SOURCE_FAILURES
                    .with_label_values(&[source.name()])
                    .inc();
                Vec::new()
            }
        }
    }
}
