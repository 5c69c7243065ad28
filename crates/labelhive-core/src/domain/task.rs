//! Tasks, options, and the reward-share policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{OptionId, RequesterId, TaskId};
use crate::error::MarketError;

/// Number of submissions after which a task is retired from circulation.
///
/// The reward budget is divided per expected submission, not per option:
/// a task is fully paid for once this many submissions exist, regardless
/// of how the votes spread across options.
pub const SUBMISSION_QUOTA: u32 = 100;

/// Title used when a requester does not provide one.
pub const DEFAULT_TITLE: &str = "Select the most clickable thumbnail";

/// A labeling job with a fixed option set and reward budget.
///
/// Immutable after creation; completion is derived from the submission
/// count, never written back here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub requester_id: RequesterId,
    pub title: String,

    /// Total reward budget in base units, supplied (and externally paid)
    /// by the requester.
    pub reward_budget: u64,

    /// Opaque proof that the budget was actually paid to the platform.
    /// Verified by the payment collaborator before creation.
    pub funding_ref: String,

    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Reward credited per accepted submission: `reward_budget / quota`,
    /// integer division in base units.
    pub fn reward_share(&self, quota: u32) -> u64 {
        self.reward_budget / u64::from(quota)
    }
}

/// One selectable choice within a task. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOption {
    pub id: OptionId,
    pub task_id: TaskId,
    pub image_url: String,
}

/// Input spec for task creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Human-readable title (falls back to [`DEFAULT_TITLE`]).
    pub title: Option<String>,

    /// Total reward budget in base units.
    pub reward_budget: u64,

    /// Opaque funding proof from the payment network. Required: a task
    /// without one must never be created.
    pub funding_ref: String,

    /// Image references for the options, in display order.
    pub image_urls: Vec<String>,
}

impl TaskDraft {
    pub fn new(reward_budget: u64, funding_ref: impl Into<String>) -> Self {
        Self {
            title: None,
            reward_budget,
            funding_ref: funding_ref.into(),
            image_urls: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    pub fn title_or_default(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    /// Shape validation, run before anything touches the store.
    pub fn validate(&self, quota: u32) -> Result<(), MarketError> {
        if self.funding_ref.is_empty() {
            return Err(MarketError::Validation(
                "funding proof is required".to_string(),
            ));
        }
        if self.image_urls.is_empty() {
            return Err(MarketError::Validation(
                "a task needs at least one option".to_string(),
            ));
        }
        if self.image_urls.iter().any(|url| url.is_empty()) {
            return Err(MarketError::Validation(
                "every option needs an image reference".to_string(),
            ));
        }
        if self.reward_budget < u64::from(quota) {
            // Integer division would make the per-submission share zero.
            return Err(MarketError::Validation(format!(
                "reward budget must fund at least one share per {quota} submissions"
            )));
        }
        Ok(())
    }
}
