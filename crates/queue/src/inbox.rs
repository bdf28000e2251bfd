use jobsched_common::ids::WorkerId;
use jobsched_common::types::AssignmentMessage;

use crate::{QueueClient, QueueError};

fn inbox_key(worker: &WorkerId) -> String {
    format!("worker_queue:{}", worker.as_str())
}

impl QueueClient {
    /// Push an assignment onto `worker`'s personal inbox list (§4.2 step 5).
    pub async fn push_assignment(&self, worker: &WorkerId, msg: &AssignmentMessage) -> Result<(), QueueError> {
        let mut conn = self.connection();
        let data = serde_json::to_string(msg).map_err(|e| QueueError::Command(e.to_string()))?;

        let _: i64 = redis::cmd("RPUSH")
            .arg(inbox_key(worker))
            .arg(&data)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        Ok(())
    }

    /// Block up to `timeout_seconds` waiting for an assignment on this
    /// worker's own inbox (§4.4). Returns `None` on timeout, not an error.
    pub async fn pop_assignment(
        &self,
        worker: &WorkerId,
        timeout_seconds: u64,
    ) -> Result<Option<AssignmentMessage>, QueueError> {
        let mut conn = self.connection();

        let result: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(inbox_key(worker))
            .arg(timeout_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        let Some((_, raw)) = result else { return Ok(None) };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| QueueError::Command(format!("malformed inbox entry: {}", e)))
    }
}
