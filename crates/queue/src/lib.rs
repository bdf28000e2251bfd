mod inbox;
mod membership;
mod submission_log;

pub use submission_log::{CONSUMER_GROUP, SUBMISSION_STREAM};

use redis::aio::MultiplexedConnection;

/// Redis client shared by the submission log, worker inboxes, and the
/// membership/heartbeat set (§4.1, §4.2, §4.4). A single multiplexed
/// connection is reused across all three, matching how the teacher's
/// queue module shares one connection per client instance.
pub struct QueueClient {
    conn: MultiplexedConnection,
}

impl QueueClient {
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        tracing::info!("connecting to redis");

        let client = redis::Client::open(redis_url).map_err(|e| QueueError::Connection(e.to_string()))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        let queue_client = Self { conn };
        queue_client.health_check().await?;
        tracing::info!("redis connection established");

        Ok(queue_client)
    }

    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        if pong != "PONG" {
            return Err(QueueError::Command(format!("unexpected PING response: {}", pong)));
        }
        Ok(())
    }

    pub(crate) fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("redis connection error: {0}")]
    Connection(String),

    #[error("redis command error: {0}")]
    Command(String),
}

impl From<QueueError> for jobsched_common::SchedulerError {
    fn from(e: QueueError) -> Self {
        jobsched_common::SchedulerError::TransientStore(e.to_string())
    }
}
