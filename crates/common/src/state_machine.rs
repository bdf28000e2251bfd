use crate::types::JobStatus;

/// Events that drive a job between statuses (§4, §9 Design Notes).
///
/// Every caller that wants to move a job between statuses does so through
/// [`apply`] rather than writing the target status directly — this is the
/// single place invariant I5 (no edge skips a status) is enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobEvent {
    /// Scheduler claimed a PENDING job off the submission log and handed it
    /// to a live worker.
    Scheduled,
    /// Worker picked the assignment off its inbox and started the
    /// container.
    Started,
    /// Container exited zero.
    Succeeded,
    /// Container exited non-zero, or the worker died mid-run and a retry
    /// budget remains.
    Failed,
    /// `retry_count` has reached `max_retries`; no further retry is
    /// possible. `requeue_dead_worker_jobs` encodes this edge directly in
    /// its `UPDATE ... CASE` rather than calling [`apply`], since the
    /// increment and the status decision have to happen in the same
    /// statement; the variant stays here as the canonical description of
    /// the edge.
    Exhausted,
    /// Reconciler observed a dead worker (heartbeat expired) or a QUEUED
    /// row stuck past its grace period, and is returning the job to the
    /// front of the line.
    Requeued,
    /// Operator or caller canceled the job. Valid from any non-terminal
    /// status.
    Canceled,
}

/// Apply `event` to a job currently in `from`. Returns `Some(to)` for a
/// valid edge, `None` for a disallowed one — callers treat `None` as a
/// no-op rather than an error, since a disallowed edge usually means a
/// concurrent writer already moved the row (idempotency, §4.2 step 6;
/// §9 Open Question b).
pub fn apply(from: JobStatus, event: JobEvent) -> Option<JobStatus> {
    use JobStatus::{Failed as StatusFailed, Pending, Queued, Running};

    match (from, event) {
        (Pending, JobEvent::Scheduled) => Some(Queued),
        (Queued, JobEvent::Started) => Some(Running),
        (Running, JobEvent::Succeeded) => Some(JobStatus::Succeeded),
        (Running, JobEvent::Failed) => Some(StatusFailed),
        (Running, JobEvent::Exhausted) => Some(StatusFailed),

        // Reconciler Pass A/B: a stuck QUEUED or RUNNING job, or a FAILED
        // job with retry budget remaining, goes back to PENDING.
        (Queued, JobEvent::Requeued) => Some(Pending),
        (Running, JobEvent::Requeued) => Some(Pending),
        (StatusFailed, JobEvent::Requeued) => Some(Pending),

        // CANCELED is reachable from any non-terminal status (§9 Open
        // Question d).
        (Pending, JobEvent::Canceled) => Some(JobStatus::Canceled),
        (Queued, JobEvent::Canceled) => Some(JobStatus::Canceled),
        (Running, JobEvent::Canceled) => Some(JobStatus::Canceled),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobEvent::{Canceled, Exhausted, Failed, Requeued, Scheduled, Started, Succeeded};
    use JobStatus::{Pending, Queued, Running};

    #[test]
    fn pending_to_queued_on_scheduled() {
        assert_eq!(apply(Pending, Scheduled), Some(Queued));
    }

    #[test]
    fn queued_to_running_on_started() {
        assert_eq!(apply(Queued, Started), Some(Running));
    }

    #[test]
    fn running_terminal_transitions() {
        assert_eq!(apply(Running, Succeeded), Some(JobStatus::Succeeded));
        assert_eq!(apply(Running, Failed), Some(JobStatus::Failed));
    }

    #[test]
    fn retry_returns_to_pending() {
        assert_eq!(apply(JobStatus::Failed, Requeued), Some(Pending));
        assert_eq!(apply(Running, Requeued), Some(Pending));
        assert_eq!(apply(Queued, Requeued), Some(Pending));
    }

    #[test]
    fn cancel_from_any_nonterminal_status() {
        assert_eq!(apply(Pending, Canceled), Some(JobStatus::Canceled));
        assert_eq!(apply(Queued, Canceled), Some(JobStatus::Canceled));
        assert_eq!(apply(Running, Canceled), Some(JobStatus::Canceled));
    }

    #[test]
    fn terminal_statuses_reject_every_event() {
        for status in [JobStatus::Succeeded, JobStatus::Canceled] {
            for event in [Scheduled, Started, Succeeded, Failed, Exhausted, Requeued, Canceled] {
                assert_eq!(apply(status, event), None, "{:?} + {:?} should be a no-op", status, event);
            }
        }
    }

    #[test]
    fn disallowed_edges_are_noop() {
        assert_eq!(apply(Pending, Started), None);
        assert_eq!(apply(Queued, Succeeded), None);
        assert_eq!(apply(JobStatus::Failed, Canceled), None);
    }
}
