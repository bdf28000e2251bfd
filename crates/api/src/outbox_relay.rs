use std::sync::Arc;
use std::time::Duration;

use jobsched_common::types::SubmissionMessage;
use jobsched_queue::QueueClient;
use jobsched_store::StoreClient;

/// Background relay that drains the submission outbox into the submission
/// log (§4.6, §9). Runs on a fixed poll interval rather than a push
/// notification, matching the teacher's periodic-background-task pattern
/// (e.g. its embedding backfill loop).
pub fn spawn(store: Arc<StoreClient>, queue: Arc<QueueClient>, poll_interval: Duration, batch_size: i64) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(poll_interval).await;

            let rows = match store.fetch_unrelayed_outbox(batch_size).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(error = %e, "outbox relay failed to fetch unrelayed rows");
                    continue;
                }
            };

            for row in rows {
                let job_id = row.job_id();
                let msg = SubmissionMessage { job_id };

                match queue.enqueue_submission(&msg).await {
                    Ok(_) => {
                        if let Err(e) = store.mark_outbox_relayed(job_id).await {
                            tracing::warn!(job_id = %job_id, error = %e, "failed to mark outbox row relayed");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %job_id, error = %e, "outbox relay failed to publish, will retry next poll");
                    }
                }
            }
        }
    });
}
