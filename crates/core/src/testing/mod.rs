//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the upstream ticket sources and the wall clock so the
//! engine and the HTTP layer can be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use referboard_core::testing::{fixtures, ManualClock, MockTicketSource};
//!
//! let primary = Arc::new(MockTicketSource::primary(vec![
//!     fixtures::primary_ticket("A1", Some("Dancer X")),
//! ]));
//! let clock = Arc::new(ManualClock::default());
//! let engine = TicketEngine::with_clock(primary, None, 300, clock.clone());
//!
//! clock.advance_secs(301); // expire the snapshot
//! ```

mod mock_source;

pub use mock_source::MockTicketSource;

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::engine::Clock;

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * 1000);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    /// Starts at 2024-12-01T12:00:00Z.
    fn default() -> Self {
        Self::new(DateTime::from_timestamp(1_733_054_400, 0).unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::ticket::{NormalizedTicket, TicketOrigin};

    /// An attending primary ticket for the given order.
    pub fn primary_ticket(order_id: &str, referrer: Option<&str>) -> NormalizedTicket {
        let mut ticket =
            NormalizedTicket::new(TicketOrigin::Primary, Some(order_id.to_string()), "Attending")
                .with_referrer(referrer);
        ticket.event_id = Some("1849540227609".to_string());
        ticket.first_name = Some("Clara".to_string());
        ticket.last_name = Some(format!("Guest {}", order_id));
        ticket.email = Some(format!("{}@example.com", order_id.to_lowercase()));
        ticket
    }

    /// An attending spreadsheet ticket for the given order and seat.
    pub fn secondary_ticket(
        order_id: &str,
        seat: Option<&str>,
        referrer: Option<&str>,
    ) -> NormalizedTicket {
        let mut ticket =
            NormalizedTicket::new(TicketOrigin::Secondary, Some(order_id.to_string()), "Attending")
                .with_referrer(referrer)
                .with_seat(seat.map(str::to_string));
        ticket.event_id = Some("1849540227609".to_string());
        ticket.first_name = Some("Fritz".to_string());
        ticket
    }
}
