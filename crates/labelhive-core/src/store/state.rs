//! Persisted-state layout: the marketplace tables.
//!
//! `MarketState` is the single source of truth. It only offers primitive
//! lookups and mutations with no validation; precondition checks and
//! transaction boundaries live in `store::memory`, which owns the lock.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::domain::{
    Address, OptionId, OptionView, Payout, PayoutId, Requester, RequesterId, Submission,
    SubmissionId, Task, TaskDraft, TaskId, TaskOption, TaskView, Worker, WorkerId,
};

pub(crate) struct MarketState {
    /// Submissions per task before it is retired.
    pub(crate) quota: u32,

    pub(crate) requesters: HashMap<RequesterId, Requester>,
    pub(crate) requesters_by_address: HashMap<Address, RequesterId>,

    pub(crate) workers: HashMap<WorkerId, Worker>,
    pub(crate) workers_by_address: HashMap<Address, WorkerId>,

    /// BTreeMap so scans run in ascending task-id order, which is what
    /// the selector's "lowest eligible identifier" policy needs.
    pub(crate) tasks: BTreeMap<TaskId, Task>,

    pub(crate) options: HashMap<OptionId, TaskOption>,

    /// Option ids per task, in creation (display) order.
    pub(crate) options_by_task: HashMap<TaskId, Vec<OptionId>>,

    pub(crate) submissions: HashMap<SubmissionId, Submission>,

    /// Uniqueness constraint on (worker, task): the schema-level backstop
    /// behind "at most one submission per worker per task".
    pub(crate) submission_index: HashSet<(WorkerId, TaskId)>,

    /// Denormalized per-task submission totals for the quota check.
    pub(crate) submission_counts: HashMap<TaskId, u32>,

    pub(crate) payouts: HashMap<PayoutId, Payout>,

    next_requester_id: u64,
    next_worker_id: u64,
    next_task_id: u64,
    next_option_id: u64,
    next_submission_id: u64,
    next_payout_id: u64,
}

impl MarketState {
    pub(crate) fn new(quota: u32) -> Self {
        Self {
            quota,
            requesters: HashMap::new(),
            requesters_by_address: HashMap::new(),
            workers: HashMap::new(),
            workers_by_address: HashMap::new(),
            tasks: BTreeMap::new(),
            options: HashMap::new(),
            options_by_task: HashMap::new(),
            submissions: HashMap::new(),
            submission_index: HashSet::new(),
            submission_counts: HashMap::new(),
            payouts: HashMap::new(),
            next_requester_id: 1,
            next_worker_id: 1,
            next_task_id: 1,
            next_option_id: 1,
            next_submission_id: 1,
            next_payout_id: 1,
        }
    }

    fn allocate_requester_id(&mut self) -> RequesterId {
        let id = RequesterId::new(self.next_requester_id);
        self.next_requester_id += 1;
        id
    }

    fn allocate_worker_id(&mut self) -> WorkerId {
        let id = WorkerId::new(self.next_worker_id);
        self.next_worker_id += 1;
        id
    }

    fn allocate_task_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        id
    }

    fn allocate_option_id(&mut self) -> OptionId {
        let id = OptionId::new(self.next_option_id);
        self.next_option_id += 1;
        id
    }

    fn allocate_submission_id(&mut self) -> SubmissionId {
        let id = SubmissionId::new(self.next_submission_id);
        self.next_submission_id += 1;
        id
    }

    fn allocate_payout_id(&mut self) -> PayoutId {
        let id = PayoutId::new(self.next_payout_id);
        self.next_payout_id += 1;
        id
    }

    /// Identity for an address, created on first sign-in.
    /// Returns (id, created_now).
    pub(crate) fn get_or_create_requester(
        &mut self,
        address: Address,
        now: DateTime<Utc>,
    ) -> (RequesterId, bool) {
        if let Some(id) = self.requesters_by_address.get(&address) {
            return (*id, false);
        }
        let id = self.allocate_requester_id();
        self.requesters_by_address.insert(address.clone(), id);
        self.requesters.insert(id, Requester::new(id, address, now));
        (id, true)
    }

    /// Identity for an address, created on first sign-in.
    /// Returns (id, created_now).
    pub(crate) fn get_or_create_worker(
        &mut self,
        address: Address,
        now: DateTime<Utc>,
    ) -> (WorkerId, bool) {
        if let Some(id) = self.workers_by_address.get(&address) {
            return (*id, false);
        }
        let id = self.allocate_worker_id();
        self.workers_by_address.insert(address.clone(), id);
        self.workers.insert(id, Worker::new(id, address, now));
        (id, true)
    }

    /// Insert one task row plus its option rows. The caller has already
    /// validated the draft and verified the funding proof.
    pub(crate) fn insert_task(
        &mut self,
        requester_id: RequesterId,
        draft: &TaskDraft,
        now: DateTime<Utc>,
    ) -> TaskId {
        let task_id = self.allocate_task_id();
        self.tasks.insert(
            task_id,
            Task {
                id: task_id,
                requester_id,
                title: draft.title_or_default(),
                reward_budget: draft.reward_budget,
                funding_ref: draft.funding_ref.clone(),
                created_at: now,
            },
        );

        let mut option_ids = Vec::with_capacity(draft.image_urls.len());
        for image_url in &draft.image_urls {
            let option_id = self.allocate_option_id();
            self.options.insert(
                option_id,
                TaskOption {
                    id: option_id,
                    task_id,
                    image_url: image_url.clone(),
                },
            );
            option_ids.push(option_id);
        }
        self.options_by_task.insert(task_id, option_ids);

        task_id
    }

    /// Record a submission and credit the worker in one step, so the two
    /// effects can never be observed apart.
    pub(crate) fn apply_submission(
        &mut self,
        worker_id: WorkerId,
        task_id: TaskId,
        option_id: OptionId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> SubmissionId {
        let id = self.allocate_submission_id();
        self.submissions.insert(
            id,
            Submission {
                id,
                worker_id,
                task_id,
                option_id,
                amount,
                created_at: now,
            },
        );
        self.submission_index.insert((worker_id, task_id));
        *self.submission_counts.entry(task_id).or_insert(0) += 1;

        if let Some(worker) = self.workers.get_mut(&worker_id) {
            worker.credit_reward(amount);
        }

        id
    }

    pub(crate) fn create_payout(
        &mut self,
        worker_id: WorkerId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> PayoutId {
        let id = self.allocate_payout_id();
        self.payouts.insert(id, Payout::new(id, worker_id, amount, now));
        id
    }

    /// Does this worker have a payout still Processing?
    pub(crate) fn has_open_payout(&self, worker_id: WorkerId) -> bool {
        self.payouts
            .values()
            .any(|p| p.worker_id == worker_id && !p.status.is_terminal())
    }

    pub(crate) fn submission_count(&self, task_id: TaskId) -> u32 {
        self.submission_counts.get(&task_id).copied().unwrap_or(0)
    }

    /// Project a task with all its options for a worker.
    pub(crate) fn task_view(&self, task_id: TaskId) -> Option<TaskView> {
        let task = self.tasks.get(&task_id)?;
        let options = self
            .options_by_task
            .get(&task_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.options.get(id))
                    .map(|opt| OptionView {
                        id: opt.id,
                        image_url: opt.image_url.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(TaskView {
            id: task.id,
            title: task.title.clone(),
            options,
        })
    }
}
