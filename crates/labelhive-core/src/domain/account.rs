//! Identity records: requesters and workers.
//!
//! Worker balances only move through the methods here, never by direct
//! field writes from other modules. Both amounts are `u64` base units and
//! stay non-negative by construction (credits add, locks move pending to
//! locked, settlement drains locked).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{RequesterId, WorkerId};
use super::payout::PayoutOutcome;

/// External address of an actor (opaque to the core; the auth
/// collaborator has already verified ownership at sign-in).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An actor who creates and funds labeling tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub id: RequesterId,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl Requester {
    pub fn new(id: RequesterId, address: Address, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            address,
            created_at,
        }
    }
}

/// An actor who answers tasks to earn reward.
///
/// Invariant: `pending_amount + locked_amount` equals the sum of this
/// worker's submission reward shares minus all completed payout amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub address: Address,

    /// Reward earned but not yet requested for payout.
    pub pending_amount: u64,

    /// Reward frozen mid-payout, not yet confirmed.
    pub locked_amount: u64,

    pub created_at: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: WorkerId, address: Address, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            address,
            pending_amount: 0,
            locked_amount: 0,
            created_at,
        }
    }

    /// Credit a submission's reward share into the pending balance.
    pub fn credit_reward(&mut self, amount: u64) {
        self.pending_amount = self.pending_amount.saturating_add(amount);
    }

    /// Freeze the full pending balance for a payout.
    ///
    /// Returns the amount moved into `locked_amount` (0 means there was
    /// nothing to pay out and the caller must not create a payout row).
    pub fn lock_pending_for_payout(&mut self) -> u64 {
        let amount = self.pending_amount;
        self.pending_amount = 0;
        self.locked_amount = self.locked_amount.saturating_add(amount);
        amount
    }

    /// Settle a resolved payout of `amount` (which must have been locked
    /// by `lock_pending_for_payout`).
    ///
    /// - Completed: the locked amount leaves the system.
    /// - Failed: the locked amount returns to pending, so a new payout
    ///   can be requested.
    pub fn settle_payout(&mut self, amount: u64, outcome: PayoutOutcome) {
        self.locked_amount = self.locked_amount.saturating_sub(amount);
        if outcome == PayoutOutcome::Failed {
            self.pending_amount = self.pending_amount.saturating_add(amount);
        }
    }
}
