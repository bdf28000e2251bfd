use std::sync::Arc;

use jobsched_common::types::SubmissionMessage;
use jobsched_common::{Result, SchedulerError};
use jobsched_queue::QueueClient;
use jobsched_store::StoreClient;

/// One reconciler sweep (§4.3). Runs Pass A, then Pass B, then Pass C, in
/// that order — each pass commits its own rows independently (one
/// transaction per row), so a crash mid-sweep just leaves the remainder for
/// the next interval rather than corrupting state.
pub async fn reconcile_once(store: &Arc<StoreClient>, queue: &Arc<QueueClient>, heartbeat_ttl_seconds: u64, queued_grace_multiplier: u64, outbox_stale_seconds: u64) -> Result<()> {
    pass_a_dead_workers(store, queue).await?;
    pass_a_stale_queued(store, heartbeat_ttl_seconds, queued_grace_multiplier).await?;
    pass_b_retryable_failed(store).await?;
    pass_c_outbox_sweep(store, queue, outbox_stale_seconds).await?;
    Ok(())
}

/// Pass A (part 1): RUNNING jobs assigned to a worker no longer in the
/// membership set — the worker died without finishing. `retry_count` is
/// incremented (§9 Open Question a: shares the execution retry budget) and
/// the job returns to PENDING, unless that increment exceeds `max_retries`,
/// in which case it is terminally FAILED with a synthetic "worker lost"
/// result instead (§4.3, I4).
async fn pass_a_dead_workers(store: &Arc<StoreClient>, queue: &Arc<QueueClient>) -> Result<()> {
    let live = queue.live_members().await.map_err(SchedulerError::from)?;
    let requeued = store.requeue_dead_worker_jobs(&live).await.map_err(SchedulerError::from)?;

    if !requeued.is_empty() {
        tracing::info!(count = requeued.len(), "requeued jobs from dead workers");
        metrics::counter!("jobs.completed", "status" => "dead_worker_requeue").increment(requeued.len() as u64);
    }
    Ok(())
}

/// Pass A (part 2): QUEUED jobs stuck past the grace period `G = queued_grace_multiplier * H`
/// — the scheduler assigned them but the worker never picked up the inbox
/// message within a reasonable window.
async fn pass_a_stale_queued(store: &Arc<StoreClient>, heartbeat_ttl_seconds: u64, queued_grace_multiplier: u64) -> Result<()> {
    let grace = (heartbeat_ttl_seconds * queued_grace_multiplier) as i64;
    let requeued = store.requeue_stale_queued_jobs(grace).await.map_err(SchedulerError::from)?;

    if !requeued.is_empty() {
        tracing::info!(count = requeued.len(), grace_seconds = grace, "requeued stale QUEUED jobs");
    }
    Ok(())
}

/// Pass B: FAILED jobs with retry budget remaining. `finish_job` only ever
/// records a terminal-for-this-attempt FAILED (§4.4); this is the sole place
/// that increments `retry_count` for an execution failure and decides
/// retryable (back to PENDING) versus exhausted (left FAILED) (§4.3).
async fn pass_b_retryable_failed(store: &Arc<StoreClient>) -> Result<()> {
    // Re-queuing resets the job's outbox row in the same transaction as the
    // PENDING transition (see `requeue_retryable_failed_jobs`); the outbox
    // relay and pass C pick it up from there, same as a freshly submitted job.
    let requeued = store.requeue_retryable_failed_jobs().await.map_err(SchedulerError::from)?;

    if !requeued.is_empty() {
        tracing::info!(count = requeued.len(), "requeued retryable failed jobs");
    }
    Ok(())
}

/// Pass C: outbox rows that have sat unrelayed longer than
/// `outbox_stale_seconds` — backstop for a crashed or backed-up relay task
/// (§9 Design Notes).
async fn pass_c_outbox_sweep(store: &Arc<StoreClient>, queue: &Arc<QueueClient>, outbox_stale_seconds: u64) -> Result<()> {
    let stale = store
        .fetch_stale_unrelayed_outbox(outbox_stale_seconds as i64)
        .await
        .map_err(SchedulerError::from)?;

    for row in &stale {
        let job_id = row.job_id();
        let msg = SubmissionMessage { job_id };

        match queue.enqueue_submission(&msg).await {
            Ok(_) => {
                if let Err(e) = store.mark_outbox_relayed(job_id).await {
                    tracing::warn!(job_id = %job_id, error = %e, "failed to mark outbox row relayed after re-publish");
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "pass C re-publish failed, will retry next sweep");
            }
        }
    }

    if !stale.is_empty() {
        tracing::info!(count = stale.len(), "reconciler pass C re-published stale outbox rows");
    }
    Ok(())
}
