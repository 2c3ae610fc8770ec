//! Types produced by reconciliation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ticket::{NormalizedTicket, TicketOrigin};

/// Where a secondary-only ticket sits within its order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecondarySlot {
    Seat(String),
    /// Row position, used when the row has no seat.
    Position(usize),
}

/// Dedup key of the canonical ticket set.
///
/// Primary tickets are unique per list position, so they never collapse into
/// each other. Secondary-only tickets collapse when order and seat repeat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TicketKey {
    Primary {
        order_id: String,
        position: usize,
    },
    Secondary {
        order_id: Option<String>,
        slot: SecondarySlot,
    },
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketKey::Primary { order_id, position } => {
                write!(f, "primary-{}-{}", order_id, position)
            }
            TicketKey::Secondary { order_id, slot } => {
                let order = order_id.as_deref().unwrap_or("");
                match slot {
                    SecondarySlot::Seat(seat) => write!(f, "secondary-{}-seat-{}", order, seat),
                    SecondarySlot::Position(i) => write!(f, "secondary-{}-row-{}", order, i),
                }
            }
        }
    }
}

/// Insertion-ordered mapping from [`TicketKey`] to ticket.
///
/// Re-inserting an existing key replaces the ticket in place, keeping its
/// original position.
#[derive(Debug, Clone, Default)]
pub struct CanonicalTicketSet {
    entries: Vec<(TicketKey, NormalizedTicket)>,
    positions: HashMap<TicketKey, usize>,
}

impl CanonicalTicketSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a ticket, returning the ticket it replaced, if any.
    pub fn insert(&mut self, key: TicketKey, ticket: NormalizedTicket) -> Option<NormalizedTicket> {
        match self.positions.get(&key) {
            Some(&index) => Some(std::mem::replace(&mut self.entries[index].1, ticket)),
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, ticket));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tickets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedTicket> {
        self.entries.iter().map(|(_, t)| t)
    }

    /// Number of tickets that came from the given source.
    pub fn count_origin(&self, origin: TicketOrigin) -> usize {
        self.iter().filter(|t| t.origin == origin).count()
    }
}

/// Provenance counters reported with every response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    /// Tickets taken from the primary source.
    pub from_primary: usize,
    /// Tickets present only in the secondary source.
    pub only_in_secondary: usize,
    /// Primary tickets whose referrer was replaced by secondary data.
    pub referrers_updated: usize,
}

/// Output of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub tickets: CanonicalTicketSet,
    pub stats: SourceStats,
}
