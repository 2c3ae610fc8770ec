//! Ticket source adapters.
//!
//! Each adapter fetches raw records from one upstream system and normalizes
//! them into [`NormalizedTicket`]s. The Eventbrite adapter is the primary
//! source; the Google Sheets export is the secondary one.

mod eventbrite;
mod pagination;
mod sheet_row;
mod sheets;

pub use eventbrite::EventbriteSource;
pub use pagination::{collect_pages, paginate, Page};
pub use sheet_row::{parse_sheet_rows, RowOutcome, SheetRow, SkipReason};
pub use sheets::{AccessTokenProvider, ServiceAccountToken, SheetsSource, StaticToken};

use async_trait::async_trait;
use thiserror::Error;

use crate::ticket::NormalizedTicket;

/// Errors that can occur while fetching from a ticket source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Obtaining upstream credentials failed.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Source not configured (missing token, etc.).
    #[error("Source not configured: {0}")]
    NotConfigured(String),
}

/// A source of attending tickets.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    /// Whether the credentials needed to fetch are present.
    fn is_configured(&self) -> bool;

    /// Fetch and normalize every attending ticket.
    ///
    /// Malformed individual records are dropped; only transport, status or
    /// configuration problems are errors.
    async fn fetch_tickets(&self) -> Result<Vec<NormalizedTicket>, SourceError>;
}

/// Shorten an upstream error body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}
