//! Reconciliation of primary and secondary tickets.
//!
//! The primary source decides which tickets exist. The secondary source can
//! only correct referrers of existing orders and contribute orders the
//! primary source does not know about.

mod merge;
mod types;

pub use merge::reconcile;
pub use types::*;
