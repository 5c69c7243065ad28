use thiserror::Error;

/// Error taxonomy for marketplace operations.
///
/// Precondition failures are detected before any mutation, so a caller
/// that sees any of these can assume the store is unchanged.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Malformed input, rejected before touching the store.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unknown identity / task / option / payout.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The actor requested data it does not own.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// The submitted task is not the worker's current next task
    /// (stale or forged task reference).
    #[error("submitted task does not match the worker's current next task")]
    TaskMismatch,

    /// The submitted option does not belong to the submitted task.
    #[error("option does not belong to the submitted task")]
    InvalidOption,

    /// Uniqueness violation or an operation already in flight.
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// An external collaborator (payment network, object storage)
    /// failed. Retryable; no partial state was retained.
    #[error("external dependency failed: {0}")]
    External(String),
}

impl MarketError {
    /// Should the client fetch a fresh next task and retry?
    ///
    /// TaskMismatch and Conflict are equivalent from the worker's point
    /// of view: the task they were holding is no longer theirs to answer.
    pub fn retry_with_fresh_task(&self) -> bool {
        matches!(self, MarketError::TaskMismatch | MarketError::Conflict(_))
    }
}
