//! Marketplace service: store + external collaborators.
//!
//! The store guarantees per-operation atomicity; this layer adds the
//! ordering rules around external calls. Funding is verified before the
//! create-task transaction starts, and payout dispatch happens strictly
//! after the lock-pending transaction has committed; an external call
//! never runs inside a transaction boundary, so local consistency never
//! waits on external liveness.

use std::sync::Arc;

use crate::domain::{
    Address, BalanceView, OptionId, Payout, PayoutId, PayoutOutcome, RequesterId, SubmitReceipt,
    TaskDraft, TaskId, TaskResultsView, TaskSummary, TaskView, WorkerId,
};
use crate::error::MarketError;
use crate::ports::{PaymentVerifier, PayoutNetwork, UploadAuthorizer, UploadGrant};
use crate::store::MarketStore;

pub struct Marketplace {
    store: Arc<dyn MarketStore>,
    payments: Arc<dyn PaymentVerifier>,
    payout_network: Arc<dyn PayoutNetwork>,
    uploads: Arc<dyn UploadAuthorizer>,
}

impl Marketplace {
    pub fn new(
        store: Arc<dyn MarketStore>,
        payments: Arc<dyn PaymentVerifier>,
        payout_network: Arc<dyn PayoutNetwork>,
        uploads: Arc<dyn UploadAuthorizer>,
    ) -> Self {
        Self {
            store,
            payments,
            payout_network,
            uploads,
        }
    }

    /// Sign a requester in (identity created on first sign-in). The auth
    /// collaborator has already verified address ownership; the core
    /// trusts the presented address.
    pub async fn signin_requester(&self, address: Address) -> Result<RequesterId, MarketError> {
        self.store.signin_requester(address).await
    }

    /// Sign a worker in (identity created on first sign-in).
    pub async fn signin_worker(&self, address: Address) -> Result<WorkerId, MarketError> {
        self.store.signin_worker(address).await
    }

    /// Time-boxed, size-bounded upload authorization for task images.
    pub async fn presign_upload(&self, requester: RequesterId) -> Result<UploadGrant, MarketError> {
        // Resolve the identity first so unknown requesters get NotFound
        // instead of a grant.
        let _ = self.store.requester_address(requester).await?;
        self.uploads.authorize(requester).await
    }

    /// Create a funded task. The funding proof is verified with the
    /// payment collaborator before the store transaction; an
    /// unverifiable proof means no task.
    ///
    /// The draft is validated before the verifier is consulted. The
    /// verifier is stateful (replay protection marks the proof as used),
    /// so a malformed draft must fail first, leaving the proof intact
    /// for the corrected retry.
    pub async fn create_task(
        &self,
        requester: RequesterId,
        draft: TaskDraft,
    ) -> Result<TaskId, MarketError> {
        let payer = self.store.requester_address(requester).await?;
        self.store.validate_draft(&draft).await?;
        self.payments
            .verify_funding(&payer, &draft.funding_ref, draft.reward_budget)
            .await?;

        self.store.create_task(requester, draft).await
    }

    /// Per-option results for the requester's own task.
    pub async fn task_results(
        &self,
        requester: RequesterId,
        task: TaskId,
    ) -> Result<TaskResultsView, MarketError> {
        self.store.task_results(requester, task).await
    }

    /// All tasks owned by the requester.
    pub async fn task_list(&self, requester: RequesterId) -> Result<Vec<TaskSummary>, MarketError> {
        self.store.task_list(requester).await
    }

    /// The worker's next eligible task; `Ok(None)` means no tasks left.
    pub async fn next_task(&self, worker: WorkerId) -> Result<Option<TaskView>, MarketError> {
        self.store.next_task(worker).await
    }

    /// Record a worker's answer and credit the reward share.
    pub async fn submit(
        &self,
        worker: WorkerId,
        task: TaskId,
        option: OptionId,
    ) -> Result<SubmitReceipt, MarketError> {
        self.store.submit(worker, task, option).await
    }

    /// The worker's balances.
    pub async fn balance(&self, worker: WorkerId) -> Result<BalanceView, MarketError> {
        self.store.balance(worker).await
    }

    /// Lock the worker's full pending balance and hand it to the payment
    /// network. Returns the amount now processing; 0 when nothing was
    /// pending (calling repeatedly is always safe).
    ///
    /// Dispatch runs only after the locking transaction has committed.
    /// If the network rejects the instruction outright, the payout is
    /// resolved Failed on the spot and the funds return to pending.
    pub async fn request_payout(&self, worker: WorkerId) -> Result<u64, MarketError> {
        let Some(request) = self.store.request_payout(worker).await? else {
            return Ok(0);
        };

        match self
            .payout_network
            .dispatch(&request.worker_address, request.amount)
            .await
        {
            Ok(external_ref) => {
                self.store
                    .attach_payout_ref(request.payout_id, external_ref)
                    .await?;
                Ok(request.amount)
            }
            Err(err) => {
                tracing::warn!(
                    payout_id = %request.payout_id,
                    worker_id = %worker,
                    error = %err,
                    "payout dispatch failed, returning funds to pending"
                );
                self.store
                    .resolve_payout(request.payout_id, PayoutOutcome::Failed)
                    .await?;
                Err(err)
            }
        }
    }

    /// Apply the payment network's out-of-band resolution callback.
    pub async fn resolve_payout(
        &self,
        payout: PayoutId,
        outcome: PayoutOutcome,
    ) -> Result<(), MarketError> {
        self.store.resolve_payout(payout, outcome).await
    }

    /// Read one payout row.
    pub async fn payout(&self, payout: PayoutId) -> Result<Payout, MarketError> {
        self.store.get_payout(payout).await
    }
}
