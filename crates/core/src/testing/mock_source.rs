//! Mock ticket source for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::source::{SourceError, TicketSource};
use crate::ticket::{NormalizedTicket, TicketOrigin};

/// Mock implementation of the TicketSource trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable ticket list
/// - Count fetches for cache assertions
/// - Simulate failures, slow upstreams and missing credentials
///
/// # Example
///
/// ```rust,ignore
/// use referboard_core::testing::{fixtures, MockTicketSource};
///
/// let source = MockTicketSource::primary(vec![fixtures::primary_ticket("A1", Some("Dancer X"))]);
/// source.set_next_error(SourceError::ParseError("bad page".into())).await;
///
/// assert!(source.fetch_tickets().await.is_err());
/// assert_eq!(source.fetch_tickets().await?.len(), 1);
/// assert_eq!(source.fetch_count(), 2);
/// ```
pub struct MockTicketSource {
    name: String,
    origin: TicketOrigin,
    configured: AtomicBool,
    /// Tickets returned by each fetch.
    tickets: Arc<RwLock<Vec<NormalizedTicket>>>,
    /// If set, the next fetch fails with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
    /// If set, every fetch fails with this API status.
    failing_status: Arc<RwLock<Option<u16>>>,
    /// Simulated upstream latency.
    delay: Arc<RwLock<Option<Duration>>>,
    fetches: AtomicUsize,
}

impl std::fmt::Debug for MockTicketSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTicketSource")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("fetches", &self.fetch_count())
            .finish()
    }
}

impl MockTicketSource {
    /// Create a configured mock for the given side of the merge.
    pub fn new(origin: TicketOrigin, tickets: Vec<NormalizedTicket>) -> Self {
        Self {
            name: format!("mock-{}", origin),
            origin,
            configured: AtomicBool::new(true),
            tickets: Arc::new(RwLock::new(tickets)),
            next_error: Arc::new(RwLock::new(None)),
            failing_status: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn primary(tickets: Vec<NormalizedTicket>) -> Self {
        Self::new(TicketOrigin::Primary, tickets)
    }

    pub fn secondary(tickets: Vec<NormalizedTicket>) -> Self {
        Self::new(TicketOrigin::Secondary, tickets)
    }

    /// A mock that reports missing credentials.
    pub fn unconfigured(origin: TicketOrigin) -> Self {
        let source = Self::new(origin, Vec::new());
        source.set_configured(false);
        source
    }

    /// Set the tickets returned by subsequent fetches.
    pub async fn set_tickets(&self, tickets: Vec<NormalizedTicket>) {
        *self.tickets.write().await = tickets;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every fetch fail with an API error until cleared with `None`.
    pub async fn set_failing_status(&self, status: Option<u16>) {
        *self.failing_status.write().await = status;
    }

    /// Delay every fetch by the given duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketSource for MockTicketSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn fetch_tickets(&self) -> Result<Vec<NormalizedTicket>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        if let Some(status) = *self.failing_status.read().await {
            return Err(SourceError::ApiError {
                status,
                message: "mock upstream failure".to_string(),
            });
        }

        if !self.is_configured() {
            return Err(SourceError::NotConfigured(format!("{} is not configured", self.name)));
        }

        Ok(self.tickets.read().await.clone())
    }
}
