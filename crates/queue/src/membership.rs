use jobsched_common::ids::WorkerId;

use crate::{QueueClient, QueueError};

const MEMBERS_SET: &str = "available_workers";

fn heartbeat_key(worker: &WorkerId) -> String {
    format!("worker:heartbeat:{}", worker.as_str())
}

impl QueueClient {
    /// Add a worker to the membership set (§3, §4.4). Idempotent.
    pub async fn register_worker(&self, worker: &WorkerId) -> Result<(), QueueError> {
        let mut conn = self.connection();
        let _: i64 = redis::cmd("SADD")
            .arg(MEMBERS_SET)
            .arg(worker.as_str())
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;
        Ok(())
    }

    pub async fn remove_worker(&self, worker: &WorkerId) -> Result<(), QueueError> {
        let mut conn = self.connection();
        let _: i64 = redis::cmd("SREM")
            .arg(MEMBERS_SET)
            .arg(worker.as_str())
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;
        Ok(())
    }

    /// Refresh this worker's heartbeat key with TTL `ttl_seconds` (§4.4).
    pub async fn heartbeat(&self, worker: &WorkerId, ttl_seconds: u64) -> Result<(), QueueError> {
        let mut conn = self.connection();
        redis::cmd("SET")
            .arg(heartbeat_key(worker))
            .arg("alive")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;
        Ok(())
    }

    pub async fn is_alive(&self, worker: &WorkerId) -> Result<bool, QueueError> {
        let mut conn = self.connection();
        let exists: bool = redis::cmd("EXISTS")
            .arg(heartbeat_key(worker))
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;
        Ok(exists)
    }

    /// Membership hygiene (§4.2 step 1, §4.3): the set is the candidate
    /// pool, but it's only pruned lazily — a member with an expired
    /// heartbeat is dropped here rather than removed proactively when its
    /// key expires, since Redis gives no expiry callback.
    pub async fn live_members(&self) -> Result<Vec<WorkerId>, QueueError> {
        let mut conn = self.connection();
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(MEMBERS_SET)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        let mut live = Vec::with_capacity(members.len());
        for raw in members {
            let worker = WorkerId::new(raw);
            if self.is_alive(&worker).await? {
                live.push(worker);
            } else {
                self.remove_worker(&worker).await?;
            }
        }
        Ok(live)
    }
}
