//! Referrer leaderboard aggregation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::reconcile::CanonicalTicketSet;
use crate::ticket::normalize_referrer;

/// Number of tickets credited to one referrer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub tickets: u32,
}

/// Count tickets per referrer, most tickets first.
///
/// Ties keep the order in which names were first seen. Tickets without a
/// usable referrer are not credited to anyone.
pub fn build_leaderboard(tickets: &CanonicalTicketSet) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for ticket in tickets.iter() {
        let Some(name) = ticket.referrer.as_deref().and_then(normalize_referrer) else {
            continue;
        };

        match index.get(&name) {
            Some(&i) => entries[i].tickets += 1,
            None => {
                index.insert(name.clone(), entries.len());
                entries.push(LeaderboardEntry { name, tickets: 1 });
            }
        }
    }

    // sort_by is stable
    entries.sort_by(|a, b| b.tickets.cmp(&a.tickets));
    entries
}
