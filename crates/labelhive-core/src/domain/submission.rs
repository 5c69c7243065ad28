//! Submission ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{OptionId, SubmissionId, TaskId, WorkerId};

/// A worker's recorded answer to a task.
///
/// Append-only: once created it is never mutated, and at most one exists
/// per (worker, task) pair. The submission ledger is the source of truth
/// for "has this worker already answered this task".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub worker_id: WorkerId,
    pub task_id: TaskId,
    pub option_id: OptionId,

    /// Reward share credited for this answer, in base units. Frozen at
    /// submission time so later policy changes never rewrite history.
    pub amount: u64,

    pub created_at: DateTime<Utc>,
}
