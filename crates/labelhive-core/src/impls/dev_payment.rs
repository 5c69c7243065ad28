//! Dev implementations of the payment-network ports.
//!
//! Good enough for local runs and tests: no real chain, but the same
//! contract shape, including replay rejection on funding proofs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::Address;
use crate::error::MarketError;
use crate::ports::{PaymentVerifier, PayoutNetwork};

/// Accepts any non-empty funding proof exactly once.
///
/// A proof that was already accepted is rejected, so the same payment
/// cannot fund two tasks.
#[derive(Default)]
pub struct DevPaymentVerifier {
    seen: Mutex<HashSet<String>>,
}

impl DevPaymentVerifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentVerifier for DevPaymentVerifier {
    async fn verify_funding(
        &self,
        _payer: &Address,
        proof: &str,
        _expected_amount: u64,
    ) -> Result<(), MarketError> {
        if proof.is_empty() {
            return Err(MarketError::Validation(
                "funding proof is required".to_string(),
            ));
        }

        let mut seen = self.seen.lock().await;
        if !seen.insert(proof.to_string()) {
            return Err(MarketError::Validation(
                "funding proof was already used".to_string(),
            ));
        }
        Ok(())
    }
}

/// Records payout instructions and hands out sequential transaction refs.
///
/// `set_fail(true)` makes the next dispatches fail, which is how tests
/// exercise the Failed payout path.
#[derive(Default)]
pub struct DevPayoutNetwork {
    next_ref: AtomicU64,
    fail: AtomicBool,
}

impl DevPayoutNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent dispatches fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PayoutNetwork for DevPayoutNetwork {
    async fn dispatch(&self, recipient: &Address, amount: u64) -> Result<String, MarketError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MarketError::External(
                "payout network unavailable".to_string(),
            ));
        }

        let n = self.next_ref.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%recipient, amount, txn = n, "dev payout dispatched");
        Ok(format!("txn-{n:08}"))
    }
}
