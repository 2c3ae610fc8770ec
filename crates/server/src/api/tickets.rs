//! Leaderboard API handler.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use referboard_core::{EngineError, ResponseData};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the tickets endpoint
#[derive(Debug, Default, Deserialize)]
pub struct TicketsParams {
    /// `true` skips the cache
    pub nocache: Option<String>,
    /// Alias of `nocache`
    pub refresh: Option<String>,
}

impl TicketsParams {
    pub fn bypass_cache(&self) -> bool {
        let is_true = |v: &Option<String>| v.as_deref() == Some("true");
        is_true(&self.nocache) || is_true(&self.refresh)
    }
}

/// Failure body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tickets
///
/// Leaderboard built from reconciled ticket data.
pub async fn get_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketsParams>,
) -> Result<Json<ResponseData>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine().get_tickets(params.bypass_cache()).await {
        Ok(data) => Ok(Json(data)),
        Err(e) => {
            error!(error = %e, "Failed to get tickets");
            let status = match &e {
                EngineError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::SourceFetch(_) => StatusCode::BAD_GATEWAY,
            };
            Err((status, Json(ErrorResponse::new(e.to_string()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(nocache: Option<&str>, refresh: Option<&str>) -> TicketsParams {
        TicketsParams {
            nocache: nocache.map(str::to_string),
            refresh: refresh.map(str::to_string),
        }
    }

    #[test]
    fn test_bypass_flags() {
        assert!(!params(None, None).bypass_cache());
        assert!(params(Some("true"), None).bypass_cache());
        assert!(params(None, Some("true")).bypass_cache());
        assert!(!params(Some("1"), Some("false")).bypass_cache());
        assert!(!params(Some("TRUE"), None).bypass_cache());
    }
}
