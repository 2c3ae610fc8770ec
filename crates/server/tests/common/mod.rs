//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with mock ticket sources and a manual clock, so requests can be driven
//! without network access.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use referboard_core::{
    testing::{ManualClock, MockTicketSource},
    Config, TicketEngine, TicketOrigin, TicketSource,
};

/// Re-export fixtures for test convenience
pub use referboard_core::testing::fixtures;

/// Test fixture with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_leaderboard() {
///     let fixture = TestFixture::new();
///     fixture.primary.set_tickets(vec![fixtures::primary_ticket("A1", Some("Dancer X"))]).await;
///
///     let response = fixture.get("/api/tickets").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock primary source - configure tickets and failures
    pub primary: Arc<MockTicketSource>,
    /// Mock secondary source
    pub secondary: Arc<MockTicketSource>,
    /// Clock driving cache freshness
    pub clock: Arc<ManualClock>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with empty, configured mock sources.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let primary = Arc::new(MockTicketSource::new(TicketOrigin::Primary, Vec::new()));
        let secondary = Arc::new(MockTicketSource::new(TicketOrigin::Secondary, Vec::new()));
        let clock = Arc::new(ManualClock::default());

        let engine = Arc::new(TicketEngine::with_clock(
            Arc::clone(&primary) as Arc<dyn TicketSource>,
            Some(Arc::clone(&secondary) as Arc<dyn TicketSource>),
            config.cache.duration_secs,
            clock.clone(),
        ));

        let state = Arc::new(referboard_server::state::AppState::new(config, engine));
        let router = referboard_server::api::create_router(state);

        Self {
            router,
            primary,
            secondary,
            clock,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let (status, body_bytes) = self.get_raw(path).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Send a GET request and return the raw body.
    pub async fn get_raw(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}
