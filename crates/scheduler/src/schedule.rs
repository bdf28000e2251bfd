use std::sync::Arc;
use std::time::Duration;

use jobsched_common::ids::WorkerId;
use jobsched_common::types::AssignmentMessage;
use jobsched_common::{Result, SchedulerError};
use jobsched_queue::QueueClient;
use jobsched_store::StoreClient;

use crate::placement::PlacementPolicy;

/// One iteration of the scheduler's inner loop (§4.2).
///
/// Ordering guarantee: the Job Store assignment (step 4) commits before the
/// worker inbox push (step 5), and the submission log entry is only
/// acknowledged after the inbox push (step 6) — so a crash between any two
/// steps leaves recoverable state rather than a silently dropped job:
/// a committed-but-unpushed assignment is picked up by the reconciler's
/// stale-QUEUED sweep (§4.3), and an unacked log entry is simply redelivered
/// (§4.2 step 3 idempotency).
pub async fn schedule_one(
    store: &Arc<StoreClient>,
    queue: &Arc<QueueClient>,
    policy: &dyn PlacementPolicy,
    consumer_name: &str,
    submission_block_ms: u64,
    empty_pool_backoff: Duration,
) -> Result<()> {
    // 1. Membership hygiene: live_members() lazily drops any member whose
    // heartbeat key has expired.
    let live = queue.live_members().await.map_err(SchedulerError::from)?;

    // 2. No live worker — back off rather than draining the submission log
    // into redelivery churn.
    let Some(worker) = policy.choose(&live) else {
        tokio::time::sleep(empty_pool_backoff).await;
        return Ok(());
    };

    // 3. Pull the next submission (or redeliver our own unacked one).
    let Some((entry_id, msg)) = queue
        .dequeue_submission(consumer_name, Some(submission_block_ms))
        .await
        .map_err(SchedulerError::from)?
    else {
        return Ok(());
    };

    // 4. Claim the job in the Job Store. An already-QUEUED/RUNNING row (or a
    // missing one) is an idempotent no-op (§9 Open Question b): the entry is
    // a duplicate or late delivery, so we ack and return without touching any
    // worker's inbox.
    let assigned = assign_to_worker(store, &worker, msg.job_id).await?;
    if !assigned {
        queue.ack_submission(&entry_id).await.map_err(SchedulerError::from)?;
        tracing::debug!(job_id = %msg.job_id, "duplicate or stale delivery, ack-only no-op");
        return Ok(());
    }

    // 5. Hand the assignment to the worker's inbox.
    queue
        .push_assignment(&worker, &AssignmentMessage { job_id: msg.job_id })
        .await
        .map_err(SchedulerError::from)?;

    // 6. Only now acknowledge the submission log entry.
    queue.ack_submission(&entry_id).await.map_err(SchedulerError::from)?;

    metrics::counter!("jobs.scheduled").increment(1);
    tracing::info!(job_id = %msg.job_id, worker = %worker, "scheduled job");

    Ok(())
}

async fn assign_to_worker(store: &Arc<StoreClient>, worker: &WorkerId, job_id: jobsched_common::ids::JobId) -> Result<bool> {
    store.assign_job(job_id, worker).await.map_err(SchedulerError::from)
}
