//! Domain model (IDs, accounts, tasks, submissions, payouts, views).

pub mod account;
pub mod ids;
pub mod payout;
pub mod submission;
pub mod task;
pub mod views;

pub use account::{Address, Requester, Worker};
pub use ids::{OptionId, PayoutId, RequesterId, SubmissionId, TaskId, WorkerId};
pub use payout::{Payout, PayoutOutcome, PayoutRequest, PayoutStatus};
pub use submission::Submission;
pub use task::{DEFAULT_TITLE, SUBMISSION_QUOTA, Task, TaskDraft, TaskOption};
pub use views::{
    BalanceView, OptionTally, OptionView, SubmitReceipt, TaskResultsView, TaskSummary, TaskView,
};
