//! In-memory MarketStore implementation.
//!
//! All tables live behind one `tokio::sync::Mutex`. A lock acquisition is
//! a transaction boundary: preconditions run first, mutations run only
//! after every check has passed, and no `await` happens while the lock is
//! held, so concurrent callers always observe either all effects of an
//! operation or none of them.
//! （ロック取得＝トランザクション境界。ロックを跨いで await しない。）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::task::SUBMISSION_QUOTA;
use crate::domain::{
    Address, BalanceView, OptionId, OptionTally, Payout, PayoutId, PayoutOutcome, PayoutRequest,
    RequesterId, SubmitReceipt, TaskDraft, TaskId, TaskResultsView, TaskSummary, TaskView,
    WorkerId,
};
use crate::error::MarketError;
use crate::ports::Clock;
use crate::store::MarketStore;

use super::selector;
use super::state::MarketState;

/// In-memory marketplace store.
pub struct InMemoryMarket {
    state: Arc<Mutex<MarketState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMarket {
    /// Store with the production quota ([`SUBMISSION_QUOTA`]).
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_quota(clock, SUBMISSION_QUOTA)
    }

    /// Store with a custom quota. Tests that exercise task retirement
    /// use a small quota instead of filing 100 submissions.
    pub fn with_quota(clock: Arc<dyn Clock>, quota: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MarketState::new(quota))),
            clock,
        }
    }
}

#[async_trait]
impl MarketStore for InMemoryMarket {
    async fn signin_requester(&self, address: Address) -> Result<RequesterId, MarketError> {
        if address.is_empty() {
            return Err(MarketError::Validation("address is required".to_string()));
        }

        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let (id, created) = state.get_or_create_requester(address.clone(), now);
        if created {
            tracing::info!(requester_id = %id, %address, "requester created");
        }
        Ok(id)
    }

    async fn signin_worker(&self, address: Address) -> Result<WorkerId, MarketError> {
        if address.is_empty() {
            return Err(MarketError::Validation("address is required".to_string()));
        }

        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let (id, created) = state.get_or_create_worker(address.clone(), now);
        if created {
            tracing::info!(worker_id = %id, %address, "worker created");
        }
        Ok(id)
    }

    async fn requester_address(&self, requester: RequesterId) -> Result<Address, MarketError> {
        let state = self.state.lock().await;
        state
            .requesters
            .get(&requester)
            .map(|r| r.address.clone())
            .ok_or(MarketError::NotFound("requester"))
    }

    async fn validate_draft(&self, draft: &TaskDraft) -> Result<(), MarketError> {
        let state = self.state.lock().await;
        draft.validate(state.quota)
    }

    async fn create_task(
        &self,
        requester: RequesterId,
        draft: TaskDraft,
    ) -> Result<TaskId, MarketError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        // Re-checked here so the invariant holds even for callers that
        // skip the service layer.
        draft.validate(state.quota)?;
        if !state.requesters.contains_key(&requester) {
            return Err(MarketError::NotFound("requester"));
        }

        let task_id = state.insert_task(requester, &draft, now);
        tracing::info!(
            %task_id,
            requester_id = %requester,
            reward_budget = draft.reward_budget,
            options = draft.image_urls.len(),
            "task created"
        );
        Ok(task_id)
    }

    async fn next_task(&self, worker: WorkerId) -> Result<Option<TaskView>, MarketError> {
        let state = self.state.lock().await;
        if !state.workers.contains_key(&worker) {
            return Err(MarketError::NotFound("worker"));
        }

        Ok(selector::next_task_for(&state, worker).and_then(|id| state.task_view(id)))
    }

    async fn submit(
        &self,
        worker: WorkerId,
        task: TaskId,
        option: OptionId,
    ) -> Result<SubmitReceipt, MarketError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        // Preconditions, first failure wins; nothing below mutates until
        // all of them have passed.
        if !state.workers.contains_key(&worker) {
            return Err(MarketError::NotFound("worker"));
        }

        // The client-supplied task must be the task the selector would
        // hand this worker right now. A stale or forged id (including
        // "no tasks left") is a mismatch, not a mutation.
        let expected = selector::next_task_for(state, worker);
        if expected != Some(task) {
            return Err(MarketError::TaskMismatch);
        }

        let belongs = state
            .options_by_task
            .get(&task)
            .is_some_and(|ids| ids.contains(&option));
        if !belongs {
            return Err(MarketError::InvalidOption);
        }

        // Schema-level uniqueness backstop on (worker, task). Unreachable
        // while the selector and the index share this lock, but a store
        // with weaker isolation relies on it.
        if state.submission_index.contains(&(worker, task)) {
            return Err(MarketError::Conflict("submission already exists"));
        }

        let amount = state
            .tasks
            .get(&task)
            .map(|t| t.reward_share(state.quota))
            .ok_or(MarketError::NotFound("task"))?;

        // The transaction: submission row + pending-balance credit,
        // together under the same lock acquisition.
        let submission_id = state.apply_submission(worker, task, option, amount, now);

        let next_task = selector::next_task_for(state, worker).and_then(|id| state.task_view(id));

        tracing::info!(
            %submission_id,
            worker_id = %worker,
            task_id = %task,
            option_id = %option,
            amount,
            "submission recorded"
        );

        Ok(SubmitReceipt {
            reward_share: amount,
            next_task,
        })
    }

    async fn balance(&self, worker: WorkerId) -> Result<BalanceView, MarketError> {
        let state = self.state.lock().await;
        state
            .workers
            .get(&worker)
            .map(|w| BalanceView {
                pending_amount: w.pending_amount,
                locked_amount: w.locked_amount,
            })
            .ok_or(MarketError::NotFound("worker"))
    }

    async fn request_payout(
        &self,
        worker: WorkerId,
    ) -> Result<Option<PayoutRequest>, MarketError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let pending = state
            .workers
            .get(&worker)
            .map(|w| w.pending_amount)
            .ok_or(MarketError::NotFound("worker"))?;

        // Nothing pending: a no-op, so blind retries are always safe.
        // This runs before the in-flight check on purpose: a second
        // concurrent request sees pending == 0 and returns quietly.
        if pending == 0 {
            return Ok(None);
        }

        // One in-flight payout per worker. Only reachable when the
        // worker earned more while a payout is still Processing.
        if state.has_open_payout(worker) {
            return Err(MarketError::Conflict("a payout is already processing"));
        }

        let worker_record = state
            .workers
            .get_mut(&worker)
            .ok_or(MarketError::NotFound("worker"))?;
        let amount = worker_record.lock_pending_for_payout();
        let worker_address = worker_record.address.clone();

        let payout_id = state.create_payout(worker, amount, now);

        tracing::info!(%payout_id, worker_id = %worker, amount, "pending balance locked for payout");

        Ok(Some(PayoutRequest {
            payout_id,
            worker_id: worker,
            worker_address,
            amount,
        }))
    }

    async fn attach_payout_ref(
        &self,
        payout: PayoutId,
        external_ref: String,
    ) -> Result<(), MarketError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let record = state
            .payouts
            .get_mut(&payout)
            .ok_or(MarketError::NotFound("payout"))?;
        record.attach_external_ref(external_ref, now);
        Ok(())
    }

    async fn resolve_payout(
        &self,
        payout: PayoutId,
        outcome: PayoutOutcome,
    ) -> Result<(), MarketError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let record = state
            .payouts
            .get(&payout)
            .ok_or(MarketError::NotFound("payout"))?;
        if record.status.is_terminal() {
            return Err(MarketError::Conflict("payout already resolved"));
        }
        let amount = record.amount;
        let worker_id = record.worker_id;

        if !state.workers.contains_key(&worker_id) {
            return Err(MarketError::NotFound("worker"));
        }

        // Transition + settlement under the same lock acquisition.
        if let Some(record) = state.payouts.get_mut(&payout) {
            record.resolve(outcome, now);
        }
        if let Some(worker) = state.workers.get_mut(&worker_id) {
            worker.settle_payout(amount, outcome);
        }

        tracing::info!(payout_id = %payout, worker_id = %worker_id, amount, ?outcome, "payout resolved");
        Ok(())
    }

    async fn get_payout(&self, payout: PayoutId) -> Result<Payout, MarketError> {
        let state = self.state.lock().await;
        state
            .payouts
            .get(&payout)
            .cloned()
            .ok_or(MarketError::NotFound("payout"))
    }

    async fn task_results(
        &self,
        requester: RequesterId,
        task: TaskId,
    ) -> Result<TaskResultsView, MarketError> {
        let state = self.state.lock().await;

        if !state.requesters.contains_key(&requester) {
            return Err(MarketError::NotFound("requester"));
        }
        let task_record = state.tasks.get(&task).ok_or(MarketError::NotFound("task"))?;
        if task_record.requester_id != requester {
            return Err(MarketError::Forbidden("task belongs to another requester"));
        }

        let mut counts: HashMap<OptionId, u32> = HashMap::new();
        for submission in state.submissions.values() {
            if submission.task_id == task {
                *counts.entry(submission.option_id).or_insert(0) += 1;
            }
        }

        let tallies = state
            .options_by_task
            .get(&task)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.options.get(id))
                    .map(|opt| OptionTally {
                        option_id: opt.id,
                        image_url: opt.image_url.clone(),
                        count: counts.get(&opt.id).copied().unwrap_or(0),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(TaskResultsView {
            task_id: task,
            title: task_record.title.clone(),
            tallies,
        })
    }

    async fn task_list(&self, requester: RequesterId) -> Result<Vec<TaskSummary>, MarketError> {
        let state = self.state.lock().await;

        if !state.requesters.contains_key(&requester) {
            return Err(MarketError::NotFound("requester"));
        }

        Ok(state
            .tasks
            .values()
            .filter(|t| t.requester_id == requester)
            .map(|t| TaskSummary {
                id: t.id,
                title: t.title.clone(),
                reward_budget: t.reward_budget,
                submission_count: state.submission_count(t.id),
                created_at: t.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SystemClock;

    fn market() -> InMemoryMarket {
        InMemoryMarket::new(Arc::new(SystemClock))
    }

    fn draft() -> TaskDraft {
        TaskDraft::new(1_000_000, format!("sig-{}", rand::random::<u64>()))
            .with_image("https://img.example/a.jpg")
            .with_image("https://img.example/b.jpg")
    }

    #[tokio::test]
    async fn signin_is_get_or_create() {
        let market = market();

        let first = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let again = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let other = market
            .signin_worker(Address::new("other-addr"))
            .await
            .unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn empty_address_is_rejected() {
        let market = market();
        let err = market.signin_worker(Address::new("")).await.unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn create_task_requires_known_requester() {
        let market = market();
        let err = market
            .create_task(RequesterId::new(99), draft())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound("requester")));
    }

    #[tokio::test]
    async fn next_task_requires_known_worker() {
        let market = market();
        let err = market.next_task(WorkerId::new(99)).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound("worker")));
    }

    #[tokio::test]
    async fn submit_credits_reward_and_returns_the_following_task() {
        let market = market();
        let requester = market
            .signin_requester(Address::new("req-addr"))
            .await
            .unwrap();
        let t1 = market.create_task(requester, draft()).await.unwrap();
        let t2 = market.create_task(requester, draft()).await.unwrap();

        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let view = market.next_task(worker).await.unwrap().unwrap();
        assert_eq!(view.id, t1);

        let receipt = market
            .submit(worker, view.id, view.options[0].id)
            .await
            .unwrap();
        assert_eq!(receipt.reward_share, 10_000);
        assert_eq!(receipt.next_task.as_ref().map(|t| t.id), Some(t2));

        let balance = market.balance(worker).await.unwrap();
        assert_eq!(balance.pending_amount, 10_000);
        assert_eq!(balance.locked_amount, 0);
    }

    #[tokio::test]
    async fn stale_task_submission_leaves_no_trace() {
        let market = market();
        let requester = market
            .signin_requester(Address::new("req-addr"))
            .await
            .unwrap();
        market.create_task(requester, draft()).await.unwrap();
        market.create_task(requester, draft()).await.unwrap();

        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let answered = market.next_task(worker).await.unwrap().unwrap();
        market
            .submit(worker, answered.id, answered.options[0].id)
            .await
            .unwrap();

        // Re-submitting the already answered task is a mismatch: the
        // selector now points at the second task.
        let err = market
            .submit(worker, answered.id, answered.options[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::TaskMismatch));

        let balance = market.balance(worker).await.unwrap();
        assert_eq!(balance.pending_amount, 10_000);
    }

    #[tokio::test]
    async fn submit_rejects_option_from_another_task() {
        let market = market();
        let requester = market
            .signin_requester(Address::new("req-addr"))
            .await
            .unwrap();
        market.create_task(requester, draft()).await.unwrap();
        let t2 = market.create_task(requester, draft()).await.unwrap();

        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let view = market.next_task(worker).await.unwrap().unwrap();

        // Option ids 3/4 belong to the second task.
        let foreign_option = market
            .task_results(requester, t2)
            .await
            .unwrap()
            .tallies[0]
            .option_id;
        let err = market
            .submit(worker, view.id, foreign_option)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidOption));
    }

    #[tokio::test]
    async fn payout_with_nothing_pending_is_a_noop() {
        let market = market();
        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();

        assert!(market.request_payout(worker).await.unwrap().is_none());
        assert!(market.request_payout(worker).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_payout_while_one_is_processing_conflicts() {
        let market = market();
        let requester = market
            .signin_requester(Address::new("req-addr"))
            .await
            .unwrap();
        market.create_task(requester, draft()).await.unwrap();
        market.create_task(requester, draft()).await.unwrap();

        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let view = market.next_task(worker).await.unwrap().unwrap();
        market
            .submit(worker, view.id, view.options[0].id)
            .await
            .unwrap();

        let request = market.request_payout(worker).await.unwrap().unwrap();
        assert_eq!(request.amount, 10_000);

        // Earn more while the payout is still Processing, then try again.
        let view = market.next_task(worker).await.unwrap().unwrap();
        market
            .submit(worker, view.id, view.options[0].id)
            .await
            .unwrap();

        let err = market.request_payout(worker).await.unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }

    #[tokio::test]
    async fn resolving_twice_is_rejected() {
        let market = market();
        let requester = market
            .signin_requester(Address::new("req-addr"))
            .await
            .unwrap();
        market.create_task(requester, draft()).await.unwrap();

        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let view = market.next_task(worker).await.unwrap().unwrap();
        market
            .submit(worker, view.id, view.options[0].id)
            .await
            .unwrap();
        let request = market.request_payout(worker).await.unwrap().unwrap();

        market
            .resolve_payout(request.payout_id, PayoutOutcome::Completed)
            .await
            .unwrap();
        let err = market
            .resolve_payout(request.payout_id, PayoutOutcome::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }

    #[tokio::test]
    async fn external_ref_lands_on_the_payout_row() {
        let market = market();
        let requester = market
            .signin_requester(Address::new("req-addr"))
            .await
            .unwrap();
        market.create_task(requester, draft()).await.unwrap();

        let worker = market
            .signin_worker(Address::new("wrk-addr"))
            .await
            .unwrap();
        let view = market.next_task(worker).await.unwrap().unwrap();
        market
            .submit(worker, view.id, view.options[0].id)
            .await
            .unwrap();
        let request = market.request_payout(worker).await.unwrap().unwrap();

        market
            .attach_payout_ref(request.payout_id, "txn-7".to_string())
            .await
            .unwrap();

        let payout = market.get_payout(request.payout_id).await.unwrap();
        assert_eq!(payout.external_ref.as_deref(), Some("txn-7"));
        assert_eq!(payout.status, crate::domain::PayoutStatus::Processing);
    }

    #[tokio::test]
    async fn task_list_shows_only_own_tasks() {
        let market = market();
        let alice = market.signin_requester(Address::new("alice")).await.unwrap();
        let bob = market.signin_requester(Address::new("bob")).await.unwrap();
        market.create_task(alice, draft()).await.unwrap();
        market.create_task(bob, draft()).await.unwrap();
        market.create_task(alice, draft()).await.unwrap();

        let list = market.task_list(alice).await.unwrap();
        assert_eq!(list.len(), 2);
    }
}
