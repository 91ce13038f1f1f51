//! Lifecycle of pending proposals.
//!
//! Friend invitations, party invitations and party requests share one state
//! machine: `Pending → {Accepted, Rejected, Cancelled}`. Every terminal state
//! deletes the pending row; only `Accepted` also mutates a friend or
//! participant set. No terminal row is ever kept.

use serde::{Deserialize, Serialize};

/// The terminal state a pending proposal was resolved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
  Accepted,
  /// Declined by the party the proposal was addressed to.
  Rejected,
  /// Withdrawn by the party that issued it.
  Cancelled,
}
