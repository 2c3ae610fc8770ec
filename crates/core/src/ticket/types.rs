//! Normalized ticket records shared by both sources.

use serde::{Deserialize, Serialize};

/// Which source produced a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketOrigin {
    /// Ticketing platform API; authoritative for ticket existence.
    Primary,
    /// Spreadsheet export; used to correct referrers and backfill tickets.
    Secondary,
}

impl TicketOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketOrigin::Primary => "primary",
            TicketOrigin::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for TicketOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attending ticket in the common schema.
///
/// Adapters only build these for records that pass their attendance check,
/// and always run referrers through [`normalize_referrer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTicket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Cross-source correlation key. Always set for primary tickets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Distinguishes tickets that share an order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Raw attendance status text as reported by the source.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub origin: TicketOrigin,
}

impl NormalizedTicket {
    /// Minimal ticket for the given origin; remaining fields are filled by the adapter.
    pub fn new(origin: TicketOrigin, order_id: Option<String>, status: impl Into<String>) -> Self {
        Self {
            event_id: None,
            order_id,
            seat: None,
            first_name: None,
            last_name: None,
            email: None,
            status: status.into(),
            referrer: None,
            origin,
        }
    }

    pub fn with_referrer(mut self, referrer: Option<&str>) -> Self {
        self.referrer = referrer.and_then(normalize_referrer);
        self
    }

    pub fn with_seat(mut self, seat: Option<String>) -> Self {
        self.seat = seat;
        self
    }

    /// Order id usable for cross-source matching (present and non-blank).
    pub fn match_key(&self) -> Option<&str> {
        self.order_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Normalize a referrer name: trimmed, with blank and `n/a` mapped to `None`.
pub fn normalize_referrer(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trim a free-text field, mapping blank to `None`.
pub fn clean_field(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Attendance check for ticketing platform statuses.
///
/// The platform reports a closed set of statuses; only these two count.
pub fn is_primary_attending(status: &str) -> bool {
    let status = status.trim();
    status.eq_ignore_ascii_case("attending") || status.eq_ignore_ascii_case("checked in")
}

/// Attendance check for spreadsheet statuses, which are free text.
pub fn is_secondary_attending(status: &str) -> bool {
    status.to_lowercase().contains("attending")
}
