//! Domain identifiers (strongly-typed IDs).
//!
//! A single generic `Id<T>` wraps a store-allocated sequential `u64`.
//! The phantom marker `T` keeps the six entity IDs distinct at compile
//! time (a `WorkerId` can never be passed where a `TaskId` is expected),
//! while the shared implementation stays in one place.
//!
//! Sequential allocation matters here: the task selector offers the task
//! with the *lowest* identifier first, so IDs must be totally ordered by
//! creation. The store owns the counters (see `store::state`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Marker trait for ID types.
///
/// Provides the prefix used by Display ("req-", "wrk-", "task-", ...).
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ID type.
///
/// `T` is PhantomData: zero runtime cost, compile-time type safety.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl<T: IdMarker> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// Marker types
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requester {}

impl IdMarker for Requester {
    fn prefix() -> &'static str {
        "req-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Worker {}

impl IdMarker for Worker {
    fn prefix() -> &'static str {
        "wrk-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskOption {}

impl IdMarker for TaskOption {
    fn prefix() -> &'static str {
        "opt-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Submission {}

impl IdMarker for Submission {
    fn prefix() -> &'static str {
        "sub-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Payout {}

impl IdMarker for Payout {
    fn prefix() -> &'static str {
        "pay-"
    }
}

// ========================================
// Type aliases
// ========================================

/// Identifier of a Requester (task creator).
pub type RequesterId = Id<Requester>;

/// Identifier of a Worker (task answerer).
pub type WorkerId = Id<Worker>;

/// Identifier of a Task (one labeling job).
pub type TaskId = Id<Task>;

/// Identifier of an Option (one selectable choice within a Task).
pub type OptionId = Id<TaskOption>;

/// Identifier of a Submission (a worker's answer to a task).
pub type SubmissionId = Id<Submission>;

/// Identifier of a Payout (one in-flight balance withdrawal).
pub type PayoutId = Id<Payout>;
