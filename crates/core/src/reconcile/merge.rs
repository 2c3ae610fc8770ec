//! Primary-authoritative merge of the two ticket streams.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ticket::{NormalizedTicket, TicketOrigin};

use super::{CanonicalTicketSet, Reconciliation, SecondarySlot, SourceStats, TicketKey};

/// Merge primary and secondary tickets into the canonical set.
///
/// - Every primary ticket is kept, keyed by order id and list position.
/// - A secondary referrer for the same order overwrites the primary referrer.
///   When an order repeats in the secondary list, its last non-null referrer wins.
/// - Secondary tickets whose order is unknown to the primary source are added,
///   keyed by order id and seat (or row position when there is no seat).
pub fn reconcile(
    primary: Vec<NormalizedTicket>,
    secondary: Vec<NormalizedTicket>,
) -> Reconciliation {
    let referrer_updates = secondary_referrers(&secondary);
    debug!(
        orders = referrer_updates.len(),
        "Collected referrer updates from secondary source"
    );

    let primary_orders: HashSet<String> = primary
        .iter()
        .filter_map(|t| t.match_key())
        .map(str::to_string)
        .collect();

    let mut tickets = CanonicalTicketSet::with_capacity(primary.len() + secondary.len());
    let mut referrers_updated = 0usize;

    for (position, mut ticket) in primary.into_iter().enumerate() {
        if let Some(update) = ticket.match_key().and_then(|order| referrer_updates.get(order)) {
            if ticket.referrer.as_deref() != Some(update.as_str()) {
                ticket.referrer = Some(update.clone());
                referrers_updated += 1;
            }
        }

        let key = TicketKey::Primary {
            order_id: ticket.order_id.clone().unwrap_or_default(),
            position,
        };
        tickets.insert(key, ticket);
    }

    for (position, ticket) in secondary.into_iter().enumerate() {
        if ticket
            .match_key()
            .is_some_and(|order| primary_orders.contains(order))
        {
            continue;
        }

        let slot = match &ticket.seat {
            Some(seat) => SecondarySlot::Seat(seat.clone()),
            None => SecondarySlot::Position(position),
        };
        let key = TicketKey::Secondary {
            order_id: ticket.match_key().map(str::to_string),
            slot,
        };
        if tickets.insert(key.clone(), ticket).is_some() {
            debug!(key = %key, "Duplicate secondary row replaced earlier row");
        }
    }

    let stats = SourceStats {
        from_primary: tickets.count_origin(TicketOrigin::Primary),
        only_in_secondary: tickets.count_origin(TicketOrigin::Secondary),
        referrers_updated,
    };

    debug!(
        total = tickets.len(),
        from_primary = stats.from_primary,
        only_in_secondary = stats.only_in_secondary,
        referrers_updated = stats.referrers_updated,
        "Reconciliation complete"
    );

    Reconciliation { tickets, stats }
}

/// Order id to referrer from secondary tickets; later rows overwrite earlier ones.
fn secondary_referrers(secondary: &[NormalizedTicket]) -> HashMap<String, String> {
    let mut updates = HashMap::new();
    for ticket in secondary {
        if let (Some(order), Some(referrer)) = (ticket.match_key(), ticket.referrer.as_deref()) {
            updates.insert(order.to_string(), referrer.to_string());
        }
    }
    updates
}
