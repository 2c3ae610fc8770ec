//! Eventbrite attendee source (primary).
//!
//! Attendees are listed per event with page-number pagination. All configured
//! events are fetched concurrently; any failed page aborts the whole fetch.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::EventbriteConfig;
use crate::ticket::{
    clean_field, is_primary_attending, normalize_referrer, NormalizedTicket, TicketOrigin,
};

use super::pagination::{collect_pages, Page};
use super::{truncate_body, SourceError, TicketSource};

/// Eventbrite API client producing primary tickets.
pub struct EventbriteSource {
    client: Client,
    config: EventbriteConfig,
    /// Lowercased referral question, matched as a substring.
    referral_question: String,
}

impl EventbriteSource {
    /// Create a new Eventbrite source. A missing token is accepted here and
    /// reported by [`TicketSource::fetch_tickets`].
    pub fn new(config: EventbriteConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let referral_question = config.referral_question.to_lowercase();

        Ok(Self {
            client,
            config,
            referral_question,
        })
    }

    /// Build the attendee listing URL for an event.
    fn attendees_url(&self, event_id: &str) -> String {
        format!(
            "{}/events/{}/attendees/",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(event_id)
        )
    }

    /// Fetch one page of attendees.
    async fn fetch_page(
        &self,
        token: &str,
        event_id: &str,
        page: u32,
    ) -> Result<Page<EventbriteAttendee>, SourceError> {
        let url = self.attendees_url(event_id);
        debug!(event_id = event_id, page = page, "Fetching Eventbrite attendees");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("page", page)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        let body: AttendeesResponse = response.json().await.map_err(|e| {
            SourceError::ParseError(format!("Failed to parse attendees response: {}", e))
        })?;

        let total = body.attendees.len();
        let attendees: Vec<EventbriteAttendee> = body
            .attendees
            .into_iter()
            .filter_map(|raw| match serde_json::from_value(raw) {
                Ok(attendee) => Some(attendee),
                Err(e) => {
                    debug!(event_id = event_id, error = %e, "Skipping malformed attendee record");
                    None
                }
            })
            .collect();

        debug!(
            event_id = event_id,
            page = page,
            attendees = attendees.len(),
            skipped = total - attendees.len(),
            "Eventbrite page received"
        );

        Ok(Page {
            items: attendees,
            has_more: body.pagination.map(|p| p.has_more_items).unwrap_or(false),
        })
    }

    /// Fetch every attendee of one event, following pagination.
    async fn fetch_event(
        &self,
        token: &str,
        event_id: &str,
    ) -> Result<Vec<EventbriteAttendee>, SourceError> {
        collect_pages(move |page| self.fetch_page(token, event_id, page)).await
    }

    /// Convert an attendee into a ticket, if they are attending and carry an order id.
    fn to_ticket(&self, attendee: EventbriteAttendee) -> Option<NormalizedTicket> {
        let status = attendee.status.as_deref().unwrap_or_default();
        if !is_primary_attending(status) {
            return None;
        }

        let Some(order_id) = clean_field(attendee.order_id.as_deref()) else {
            debug!(attendee_id = ?attendee.id, "Skipping attendee without order id");
            return None;
        };

        let referrer = extract_referrer(&attendee.answers, &self.referral_question);
        let seat = seat_identifier(&attendee);
        let profile = attendee.profile.unwrap_or_default();

        Some(NormalizedTicket {
            event_id: clean_field(attendee.event_id.as_deref()),
            order_id: Some(order_id),
            seat,
            first_name: clean_field(profile.first_name.as_deref()),
            last_name: clean_field(profile.last_name.as_deref()),
            email: clean_field(profile.email.as_deref()),
            status: status.trim().to_string(),
            referrer,
            origin: TicketOrigin::Primary,
        })
    }
}

#[async_trait]
impl TicketSource for EventbriteSource {
    fn name(&self) -> &str {
        "eventbrite"
    }

    fn is_configured(&self) -> bool {
        self.config.token_configured()
    }

    async fn fetch_tickets(&self) -> Result<Vec<NormalizedTicket>, SourceError> {
        let token = match self.config.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(SourceError::NotConfigured(
                    "Eventbrite token not configured".to_string(),
                ))
            }
        };

        let per_event = try_join_all(
            self.config
                .event_ids
                .iter()
                .map(|event_id| self.fetch_event(token, event_id)),
        )
        .await?;

        let attendees: Vec<EventbriteAttendee> = per_event.into_iter().flatten().collect();
        let total = attendees.len();
        let tickets: Vec<NormalizedTicket> = attendees
            .into_iter()
            .filter_map(|a| self.to_ticket(a))
            .collect();

        info!(
            events = self.config.event_ids.len(),
            attendees = total,
            tickets = tickets.len(),
            "Fetched tickets from Eventbrite"
        );

        Ok(tickets)
    }
}

/// Find the referrer among survey answers. When several answers match the
/// question, the last usable one wins.
fn extract_referrer(answers: &Option<Vec<EventbriteAnswer>>, question: &str) -> Option<String> {
    answers
        .iter()
        .flatten()
        .filter(|a| {
            a.question
                .as_deref()
                .is_some_and(|q| q.to_lowercase().contains(question))
        })
        .filter_map(|a| a.answer.as_deref().and_then(normalize_referrer))
        .last()
}

/// Assigned seat number, else the first barcode, else nothing.
fn seat_identifier(attendee: &EventbriteAttendee) -> Option<String> {
    let assigned = attendee.assigned_number.as_ref().and_then(|v| match v {
        serde_json::Value::String(s) => clean_field(Some(s.as_str())),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    assigned.or_else(|| {
        attendee
            .barcodes
            .iter()
            .flatten()
            .next()
            .and_then(|b| clean_field(b.barcode.as_deref()))
    })
}

// ============================================================================
// Eventbrite API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct AttendeesResponse {
    /// Kept raw so one malformed attendee does not fail the page.
    #[serde(default)]
    attendees: Vec<serde_json::Value>,
    #[serde(default)]
    pagination: Option<EventbritePagination>,
}

#[derive(Debug, Deserialize)]
struct EventbritePagination {
    #[serde(default)]
    has_more_items: bool,
}

#[derive(Debug, Deserialize)]
struct EventbriteAttendee {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    profile: Option<EventbriteProfile>,
    #[serde(default)]
    answers: Option<Vec<EventbriteAnswer>>,
    #[serde(default)]
    barcodes: Option<Vec<EventbriteBarcode>>,
    #[serde(default)]
    assigned_number: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct EventbriteProfile {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventbriteAnswer {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventbriteBarcode {
    #[serde(default)]
    barcode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> EventbriteSource {
        EventbriteSource::new(EventbriteConfig {
            token: Some("token".to_string()),
            event_ids: vec!["111".to_string()],
            base_url: "http://localhost:9999/v3/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn attendee(value: serde_json::Value) -> EventbriteAttendee {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_attendees_url() {
        let source = source();
        assert_eq!(
            source.attendees_url("111"),
            "http://localhost:9999/v3/events/111/attendees/"
        );
    }

    #[test]
    fn test_converts_attending_attendee() {
        let ticket = source()
            .to_ticket(attendee(json!({
                "id": "att-1",
                "event_id": "111",
                "order_id": "A1",
                "status": "Attending",
                "profile": {
                    "first_name": " Clara ",
                    "last_name": "Stahlbaum",
                    "email": "clara@example.com"
                },
                "answers": [
                    { "question": "Which company dancer referred you?", "answer": " Dancer X " }
                ],
                "barcodes": [{ "barcode": "BC-1" }],
                "assigned_number": 12
            })))
            .unwrap();

        assert_eq!(ticket.order_id.as_deref(), Some("A1"));
        assert_eq!(ticket.event_id.as_deref(), Some("111"));
        assert_eq!(ticket.first_name.as_deref(), Some("Clara"));
        assert_eq!(ticket.referrer.as_deref(), Some("Dancer X"));
        assert_eq!(ticket.seat.as_deref(), Some("12"));
        assert_eq!(ticket.origin, TicketOrigin::Primary);
    }

    #[test]
    fn test_skips_non_attending_statuses() {
        let source = source();
        for status in ["Not Attending", "Refunded", "Transferred"] {
            let result = source.to_ticket(attendee(json!({ "order_id": "A1", "status": status })));
            assert!(result.is_none(), "status {} should be skipped", status);
        }
        let checked_in =
            source.to_ticket(attendee(json!({ "order_id": "A1", "status": "Checked In" })));
        assert!(checked_in.is_some());
    }

    #[test]
    fn test_skips_attendee_without_order() {
        let result = source().to_ticket(attendee(json!({ "status": "Attending" })));
        assert!(result.is_none());
    }

    #[test]
    fn test_referrer_last_matching_answer_wins() {
        let answers: Option<Vec<EventbriteAnswer>> = serde_json::from_value(json!([
            { "question": "Which company dancer referred you?", "answer": "First" },
            { "question": "How did you hear about us?", "answer": "Radio" },
            { "question": "WHICH COMPANY DANCER REFERRED YOU", "answer": "Second" },
            { "question": "Which company dancer referred you?", "answer": "n/a" },
            { "question": "Which company dancer referred you?", "answer": "   " },
            { "question": "Which company dancer referred you?" }
        ]))
        .unwrap();

        assert_eq!(
            extract_referrer(&answers, "which company dancer referred you"),
            Some("Second".to_string())
        );
    }

    #[test]
    fn test_referrer_absent_without_answers() {
        assert_eq!(extract_referrer(&None, "which company dancer referred you"), None);
        let answers = Some(vec![EventbriteAnswer {
            question: None,
            answer: Some("Dancer".to_string()),
        }]);
        assert_eq!(extract_referrer(&answers, "which company dancer referred you"), None);
    }

    #[test]
    fn test_seat_falls_back_to_first_barcode() {
        let with_barcode = attendee(json!({
            "barcodes": [{ "barcode": "BC-9" }, { "barcode": "BC-10" }]
        }));
        assert_eq!(seat_identifier(&with_barcode), Some("BC-9".to_string()));

        let with_string_seat = attendee(json!({
            "assigned_number": "A-7",
            "barcodes": [{ "barcode": "BC-9" }]
        }));
        assert_eq!(seat_identifier(&with_string_seat), Some("A-7".to_string()));

        let nothing = attendee(json!({ "barcodes": [] }));
        assert_eq!(seat_identifier(&nothing), None);
    }

    #[tokio::test]
    async fn test_fetch_without_token_is_not_configured() {
        let source = EventbriteSource::new(EventbriteConfig::default()).unwrap();
        assert!(!source.is_configured());
        let result = source.fetch_tickets().await;
        assert!(matches!(result, Err(SourceError::NotConfigured(_))));
    }
}
