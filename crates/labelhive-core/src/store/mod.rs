//! MarketStore port and the in-memory transactional implementation.

mod memory;
mod selector;
mod state;

pub use memory::InMemoryMarket;

use async_trait::async_trait;

use crate::domain::{
    Address, BalanceView, OptionId, Payout, PayoutId, PayoutOutcome, PayoutRequest, RequesterId,
    SubmitReceipt, TaskDraft, TaskId, TaskResultsView, TaskSummary, TaskView, WorkerId,
};
use crate::error::MarketError;

/// Storage port for the marketplace.
///
/// Every method is one transaction: preconditions are checked before the
/// first mutation ("first failure wins"), and either all effects of a
/// call commit or none do. The in-memory implementation gets this from a
/// single lock per call; a database-backed implementation would use its
/// native transactions plus the (worker, task) uniqueness constraint.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Identity for a requester address, created on first sign-in.
    async fn signin_requester(&self, address: Address) -> Result<RequesterId, MarketError>;

    /// Identity for a worker address, created on first sign-in.
    async fn signin_worker(&self, address: Address) -> Result<WorkerId, MarketError>;

    /// External address behind a requester identity.
    async fn requester_address(&self, requester: RequesterId) -> Result<Address, MarketError>;

    /// Shape-check a draft against this store's quota without creating
    /// anything. Lets callers reject malformed input before consuming
    /// one-shot resources such as a funding proof.
    async fn validate_draft(&self, draft: &TaskDraft) -> Result<(), MarketError>;

    /// Atomically create one task row plus its option rows.
    /// The funding proof must already be verified by the caller.
    async fn create_task(
        &self,
        requester: RequesterId,
        draft: TaskDraft,
    ) -> Result<TaskId, MarketError>;

    /// The worker's next eligible task, with all options. Pure read;
    /// `Ok(None)` means "no tasks left", which is not an error.
    async fn next_task(&self, worker: WorkerId) -> Result<Option<TaskView>, MarketError>;

    /// Record an answer: verifies the task is the worker's current next
    /// task, then atomically inserts the submission and credits the
    /// reward share. Returns the share plus the following next task.
    async fn submit(
        &self,
        worker: WorkerId,
        task: TaskId,
        option: OptionId,
    ) -> Result<SubmitReceipt, MarketError>;

    /// Pure read of a worker's balances.
    async fn balance(&self, worker: WorkerId) -> Result<BalanceView, MarketError>;

    /// Atomically move the full pending balance into locked and create a
    /// Processing payout row. `Ok(None)` when there is nothing pending
    /// (a safe no-op, never an error).
    async fn request_payout(&self, worker: WorkerId)
    -> Result<Option<PayoutRequest>, MarketError>;

    /// Record the payment network's transaction reference on a payout.
    async fn attach_payout_ref(
        &self,
        payout: PayoutId,
        external_ref: String,
    ) -> Result<(), MarketError>;

    /// Apply the network's out-of-band resolution: Completed drains the
    /// locked amount, Failed returns it to pending. Atomic with the
    /// payout's state transition.
    async fn resolve_payout(
        &self,
        payout: PayoutId,
        outcome: PayoutOutcome,
    ) -> Result<(), MarketError>;

    /// Read one payout row.
    async fn get_payout(&self, payout: PayoutId) -> Result<Payout, MarketError>;

    /// Per-option submission counts for the requester's own task.
    async fn task_results(
        &self,
        requester: RequesterId,
        task: TaskId,
    ) -> Result<TaskResultsView, MarketError>;

    /// All tasks owned by the requester.
    async fn task_list(&self, requester: RequesterId) -> Result<Vec<TaskSummary>, MarketError>;
}
