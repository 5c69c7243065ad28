//! Payout records and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::Address;
use super::ids::{PayoutId, WorkerId};

/// Payout state.
///
/// State transitions:
/// - Processing -> Completed (network confirmed; locked amount leaves)
/// - Processing -> Failed (network rejected; locked amount returns to pending)
///
/// Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }
}

/// Resolution reported by the payment network, out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutOutcome {
    Completed,
    Failed,
}

/// One in-flight (or settled) withdrawal of a worker's pending balance.
///
/// The amount is frozen at creation time into the worker's
/// `locked_amount`; only `resolve` moves it out again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub worker_id: WorkerId,
    pub amount: u64,
    pub status: PayoutStatus,

    /// Transaction reference on the external payment network, attached
    /// once the dispatch call returns.
    pub external_ref: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(id: PayoutId, worker_id: WorkerId, amount: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            worker_id,
            amount,
            status: PayoutStatus::Processing,
            external_ref: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn attach_external_ref(&mut self, external_ref: String, now: DateTime<Utc>) {
        self.external_ref = Some(external_ref);
        self.updated_at = now;
    }

    /// Apply the network's resolution. Only valid from Processing; the
    /// store rejects double resolution before calling this.
    pub fn resolve(&mut self, outcome: PayoutOutcome, now: DateTime<Utc>) {
        self.status = match outcome {
            PayoutOutcome::Completed => PayoutStatus::Completed,
            PayoutOutcome::Failed => PayoutStatus::Failed,
        };
        self.updated_at = now;
    }
}

/// Everything the service layer needs to hand a freshly locked payout to
/// the payment network after the local transaction has committed.
#[derive(Debug, Clone)]
pub struct PayoutRequest {
    pub payout_id: PayoutId,
    pub worker_id: WorkerId,
    pub worker_address: Address,
    pub amount: u64,
}
