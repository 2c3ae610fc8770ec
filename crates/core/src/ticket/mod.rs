//! Ticket data model.
//!
//! Both source adapters emit [`NormalizedTicket`]s; everything downstream
//! (reconciliation, leaderboard) works on this shape only.

mod types;

pub use types::*;
