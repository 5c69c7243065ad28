//! Serializable views for API responses.
//!
//! These are read-only projections of the internal records; callers never
//! see (or mutate) the records themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{OptionId, TaskId};

/// One selectable option, as shown to a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
    pub id: OptionId,
    pub image_url: String,
}

/// A task handed to a worker: everything needed to answer it in one
/// round trip (all options with image references included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub options: Vec<OptionView>,
}

/// Result of a successful submission: the reward credited plus the
/// freshly computed next task (None when the worker has run dry), so the
/// client needs no second request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub reward_share: u64,
    pub next_task: Option<TaskView>,
}

/// A worker's balances, in base units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalanceView {
    pub pending_amount: u64,
    pub locked_amount: u64,
}

/// Submission count for one option (zero-count options included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionTally {
    pub option_id: OptionId,
    pub image_url: String,
    pub count: u32,
}

/// Per-option aggregation of a task's submissions, for its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultsView {
    pub task_id: TaskId,
    pub title: String,

    /// Tallies in option creation order.
    pub tallies: Vec<OptionTally>,
}

/// One row in a requester's task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub reward_budget: u64,
    pub submission_count: u32,
    pub created_at: DateTime<Utc>,
}
