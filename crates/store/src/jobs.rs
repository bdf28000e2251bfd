use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use jobsched_common::ids::{JobId, WorkerId};
use jobsched_common::state_machine::{apply, JobEvent};
use jobsched_common::types::{Job, JobStatus};

use crate::{StoreClient, StoreError};

impl StoreClient {
    /// Create a job row and its outbox row in a single transaction (§9).
    pub async fn create_job(&self, job: &Job) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, status, command, image, script, assigned_worker,
                               retry_count, max_retries, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(job.id.0)
        .bind(job.status.as_db_str())
        .bind(sqlx::types::Json(&job.command))
        .bind(&job.image)
        .bind(&job.script)
        .bind(job.assigned_worker.as_ref().map(WorkerId::as_str))
        .bind(job.retry_count as i32)
        .bind(job.max_retries as i32)
        .bind(job.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        sqlx::query("INSERT INTO submission_outbox (job_id) VALUES ($1)")
            .bind(job.id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    pub async fn get_job(&self, id: JobId) -> Result<Job, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, status, command, image, script, assigned_worker,
                   retry_count, max_retries, created_at, started_at, finished_at, result
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?
        .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;

        Ok(row.into())
    }

    /// Scheduler claims a PENDING job for `worker` (§4.2 step 5). Idempotent:
    /// a row already past PENDING is left untouched and `Ok(false)` is
    /// returned rather than an error (§9 Open Question b).
    pub async fn assign_job(&self, id: JobId, worker: &WorkerId) -> Result<bool, StoreError> {
        let to = apply(JobStatus::Pending, JobEvent::Scheduled).expect("Pending+Scheduled is a valid edge");

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2, assigned_worker = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.0)
        .bind(to.as_db_str())
        .bind(worker.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Worker marks an assigned job as started (§4.4). Idempotent no-op if
    /// the row isn't QUEUED.
    pub async fn mark_running(&self, id: JobId) -> Result<bool, StoreError> {
        let to = apply(JobStatus::Queued, JobEvent::Started).expect("Queued+Started is a valid edge");

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2, started_at = now()
            WHERE id = $1 AND status = 'queued'
            "#,
        )
        .bind(id.0)
        .bind(to.as_db_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Worker reports a terminal-for-this-attempt container outcome (§4.4,
    /// §4.5). Always a straight RUNNING→{SUCCEEDED,FAILED} transition with
    /// `result_text` recorded — the worker does not decide retries (§4.4:
    /// "the worker ... reports terminal-for-this-attempt outcomes and the
    /// reconciler decides"). `retry_count` is owned entirely by reconciler
    /// Pass B (`requeue_retryable_failed_jobs`), which increments it exactly
    /// once per failure cycle and decides PENDING-vs-FAILED-exhausted (§4.3).
    pub async fn finish_job(&self, id: JobId, succeeded: bool, result_text: &str) -> Result<(), StoreError> {
        let event = if succeeded { JobEvent::Succeeded } else { JobEvent::Failed };
        let to = apply(JobStatus::Running, event).expect("valid edge");

        sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2, finished_at = now(), result = $3
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id.0)
        .bind(to.as_db_str())
        .bind(result_text)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Reconciler Pass A: RUNNING jobs whose `assigned_worker` is no longer
    /// in the live membership set. Increments `retry_count`; if that exceeds
    /// `max_retries` the job is terminally FAILED with a synthetic "worker
    /// lost" result instead of being returned to PENDING (§4.3, I4 — a
    /// worker that keeps dying must not cycle a job's `retry_count` past its
    /// budget forever).
    pub async fn requeue_dead_worker_jobs(&self, live_workers: &[WorkerId]) -> Result<Vec<JobId>, StoreError> {
        let live: Vec<&str> = live_workers.iter().map(WorkerId::as_str).collect();

        let rows = sqlx::query(
            r#"
            UPDATE jobs
            SET retry_count = retry_count + 1,
                status = CASE WHEN retry_count + 1 > max_retries THEN 'failed' ELSE 'pending' END,
                assigned_worker = CASE WHEN retry_count + 1 > max_retries THEN assigned_worker ELSE NULL END,
                started_at = CASE WHEN retry_count + 1 > max_retries THEN started_at ELSE NULL END,
                finished_at = CASE WHEN retry_count + 1 > max_retries THEN now() ELSE finished_at END,
                result = CASE WHEN retry_count + 1 > max_retries THEN 'worker lost' ELSE result END
            WHERE status = 'running' AND assigned_worker IS NOT NULL
              AND NOT (assigned_worker = ANY($1))
            RETURNING id
            "#,
        )
        .bind(&live as &[&str])
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(|r| JobId::from_uuid(r.get::<Uuid, _>("id"))).collect())
    }

    /// Reconciler Pass A (cont.): QUEUED jobs stuck past the grace period
    /// `G` — the scheduler assigned them but the worker never picked up the
    /// inbox message. Returns them to PENDING for reassignment.
    pub async fn requeue_stale_queued_jobs(&self, grace_seconds: i64) -> Result<Vec<JobId>, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', assigned_worker = NULL
            WHERE status = 'queued' AND created_at < now() - ($1 || ' seconds')::interval
            RETURNING id
            "#,
        )
        .bind(grace_seconds.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(|r| JobId::from_uuid(r.get::<Uuid, _>("id"))).collect())
    }

    /// Reconciler Pass B: FAILED jobs with retry budget remaining (§4.3).
    /// `finish_job` only ever records a terminal-for-this-attempt FAILED —
    /// it never decides whether to retry — so this is the *only* place
    /// `retry_count` is incremented for an execution failure, and the only
    /// place that decides a FAILED row is retryable (`retry_count <
    /// max_retries`, checked before the increment) versus exhausted (left
    /// FAILED, untouched, if the budget was already spent).
    ///
    /// Re-publishing to the submission log goes through the same outbox row
    /// each job was created with rather than a direct `enqueue_submission`
    /// call: resetting `relayed_at` to NULL inside the same transaction as
    /// the PENDING transition means a crash or Redis outage right after this
    /// commit still leaves the job visible to the outbox relay and to
    /// reconciler Pass C, instead of stranding it in PENDING with no log
    /// entry at all.
    pub async fn requeue_retryable_failed_jobs(&self) -> Result<Vec<JobId>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| StoreError::Query(e.to_string()))?;

        let rows = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', assigned_worker = NULL, retry_count = retry_count + 1
            WHERE status = 'failed' AND retry_count < max_retries
            RETURNING id
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        for row in &rows {
            let id: Uuid = row.get("id");
            sqlx::query(
                r#"
                INSERT INTO submission_outbox (job_id) VALUES ($1)
                ON CONFLICT (job_id) DO UPDATE SET relayed_at = NULL, created_at = now()
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(|r| JobId::from_uuid(r.get::<Uuid, _>("id"))).collect())
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    status: String,
    command: sqlx::types::Json<Vec<String>>,
    image: String,
    script: Option<String>,
    assigned_worker: Option<String>,
    retry_count: i32,
    max_retries: i32,
    created_at: chrono::DateTime<Utc>,
    started_at: Option<chrono::DateTime<Utc>>,
    finished_at: Option<chrono::DateTime<Utc>>,
    result: Option<String>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: JobId::from_uuid(row.id),
            status: JobStatus::from_db_str(&row.status),
            command: row.command.0,
            image: row.image,
            script: row.script,
            assigned_worker: row.assigned_worker.map(WorkerId::new),
            retry_count: row.retry_count as u32,
            max_retries: row.max_retries as u32,
            created_at: row.created_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
            result: row.result,
        }
    }
}
