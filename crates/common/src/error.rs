use thiserror::Error;

/// Top-level error type for scheduler operations.
///
/// Variants map onto the error kinds in the error handling design: a
/// `TransientStore` error is retried with backoff at the nearest loop
/// boundary, `LeadershipLost` ends the current epoch, `BadState` is an
/// idempotent no-op, and `ExecutionFailure`/`Poison` are job-terminal outcomes
/// rather than process-level faults.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Network/timeout error against the coordination store, submission log,
    /// worker inbox, heartbeat store, or Job Store. Always retryable.
    #[error("Transient store error: {0}")]
    TransientStore(String),

    /// This leadership epoch has ended (lease refresh failed or was
    /// preempted). Leader-only tasks must stop.
    #[error("Leadership lost")]
    LeadershipLost,

    /// A row was found in a status that makes the requested transition
    /// invalid. Callers treat this as an idempotent no-op, not a failure.
    #[error("Job {job_id} is in unexpected state {actual}, expected one of {expected}")]
    BadState {
        job_id: String,
        actual: String,
        expected: String,
    },

    /// The container runtime ran but the job's own command/script failed
    /// (non-zero exit) or the runtime itself could not be invoked.
    #[error("Execution failed: {0}")]
    ExecutionFailure(String),

    /// A job that has exhausted `max_retries` without ever succeeding.
    #[error("Job {0} is poisoned: every attempt failed")]
    Poison(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl SchedulerError {
    /// Whether this error should be retried with backoff rather than
    /// propagated as a terminal failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStore(_))
    }

    /// Whether this error means the current leadership epoch must end.
    pub fn is_leadership_loss(&self) -> bool {
        matches!(self, Self::LeadershipLost)
    }
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
