//! Payment-network ports.
//!
//! The payment network is an external collaborator; the core only
//! specifies its interface. Two concerns, two traits:
//! - verifying that a requester actually paid for a task before it is
//!   created, and
//! - instructing the network to move a locked payout to a worker.
//!
//! Neither call ever happens inside a store transaction. Verification
//! runs before the create-task transaction starts; payout dispatch runs
//! after the lock-pending transaction has committed.

use async_trait::async_trait;

use crate::domain::Address;
use crate::error::MarketError;

/// Verifies a claimed funding payment before task creation may proceed.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Check that `proof` references a real payment of `expected_amount`
    /// base units from `payer` to the platform. An unverifiable proof
    /// must abort task creation.
    async fn verify_funding(
        &self,
        payer: &Address,
        proof: &str,
        expected_amount: u64,
    ) -> Result<(), MarketError>;
}

/// Fire-and-forget payout instructions to the payment network.
#[async_trait]
pub trait PayoutNetwork: Send + Sync {
    /// Instruct the network to move `amount` base units to `recipient`.
    /// Returns the network's transaction reference. The payout row stays
    /// Processing until the network resolves it out of band.
    async fn dispatch(&self, recipient: &Address, amount: u64) -> Result<String, MarketError>;
}
