use chrono::{DateTime, Utc};
use uuid::Uuid;

use jobsched_common::ids::JobId;

use crate::{StoreClient, StoreError};

/// One row of the submission outbox (§9 Design Notes).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxRow {
    pub job_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub relayed_at: Option<DateTime<Utc>>,
}

impl OutboxRow {
    pub fn job_id(&self) -> JobId {
        JobId::from_uuid(self.job_id)
    }
}

impl StoreClient {
    /// Outbox relay: fetch a batch of rows not yet relayed, oldest first.
    pub async fn fetch_unrelayed_outbox(&self, limit: i64) -> Result<Vec<OutboxRow>, StoreError> {
        sqlx::query_as::<_, OutboxRow>(
            r#"
            SELECT job_id, created_at, relayed_at
            FROM submission_outbox
            WHERE relayed_at IS NULL
            ORDER BY created_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))
    }

    pub async fn mark_outbox_relayed(&self, job_id: JobId) -> Result<(), StoreError> {
        sqlx::query("UPDATE submission_outbox SET relayed_at = now() WHERE job_id = $1")
            .bind(job_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Reconciler Pass C: rows that have sat unrelayed longer than
    /// `stale_seconds` — the relay task either missed them or died.
    pub async fn fetch_stale_unrelayed_outbox(&self, stale_seconds: i64) -> Result<Vec<OutboxRow>, StoreError> {
        sqlx::query_as::<_, OutboxRow>(
            r#"
            SELECT job_id, created_at, relayed_at
            FROM submission_outbox
            WHERE relayed_at IS NULL AND created_at < now() - ($1 || ' seconds')::interval
            ORDER BY created_at
            "#,
        )
        .bind(stale_seconds.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))
    }
}
