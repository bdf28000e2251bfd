use jobsched_common::types::SubmissionMessage;

use crate::{QueueClient, QueueError};

/// The single submission log stream (§4.2). Unlike the teacher's
/// priority-tiered streams, job submission has no priority concept (§1
/// Non-goals), so there is exactly one stream and one consumer group shared
/// by every scheduler replica.
pub const SUBMISSION_STREAM: &str = "jobs_stream";
pub const CONSUMER_GROUP: &str = "scheduler_group";

impl QueueClient {
    /// Create the stream and consumer group if they don't exist yet. Safe to
    /// call on every startup.
    pub async fn initialize_submission_log(&self) -> Result<(), QueueError> {
        let mut conn = self.connection();

        let result: Result<String, redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(SUBMISSION_STREAM)
            .arg(CONSUMER_GROUP)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(stream = SUBMISSION_STREAM, "created consumer group");
            }
            Err(e) => {
                if e.to_string().contains("BUSYGROUP") {
                    tracing::debug!(stream = SUBMISSION_STREAM, "consumer group already exists");
                } else {
                    return Err(QueueError::Command(format!(
                        "failed to create consumer group for {}: {}",
                        SUBMISSION_STREAM, e
                    )));
                }
            }
        }

        Ok(())
    }

    /// Append a job to the submission log (§4.2, outbox relay / reconciler
    /// Pass C call this).
    pub async fn enqueue_submission(&self, msg: &SubmissionMessage) -> Result<String, QueueError> {
        let mut conn = self.connection();
        let data = serde_json::to_string(msg).map_err(|e| QueueError::Command(e.to_string()))?;

        let entry_id: String = redis::cmd("XADD")
            .arg(SUBMISSION_STREAM)
            .arg("*")
            .arg("data")
            .arg(&data)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        tracing::debug!(entry_id = %entry_id, job_id = %msg.job_id, "enqueued submission");
        Ok(entry_id)
    }

    /// Read the next unclaimed submission, or re-read this consumer's own
    /// unacknowledged entries first (at-least-once delivery, §4.2). Blocks
    /// up to `block_ms` if nothing is available.
    pub async fn dequeue_submission(
        &self,
        consumer_name: &str,
        block_ms: Option<u64>,
    ) -> Result<Option<(String, SubmissionMessage)>, QueueError> {
        let mut conn = self.connection();

        let pending_result: Option<redis::Value> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(CONSUMER_GROUP)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(1)
            .arg("STREAMS")
            .arg(SUBMISSION_STREAM)
            .arg("0")
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        if let Some(item) = parse_xreadgroup_response(pending_result)? {
            return Ok(Some(item));
        }

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP").arg(CONSUMER_GROUP).arg(consumer_name);
        if let Some(ms) = block_ms {
            cmd.arg("BLOCK").arg(ms);
        }
        cmd.arg("COUNT").arg(1).arg("STREAMS").arg(SUBMISSION_STREAM).arg(">");

        let result: Option<redis::Value> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        parse_xreadgroup_response(result)
    }

    pub async fn ack_submission(&self, entry_id: &str) -> Result<(), QueueError> {
        let mut conn = self.connection();
        let _: i64 = redis::cmd("XACK")
            .arg(SUBMISSION_STREAM)
            .arg(CONSUMER_GROUP)
            .arg(entry_id)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;
        Ok(())
    }

    /// Reclaim entries idle longer than `min_idle_ms` from dead schedulers
    /// (§4.3 — the new leader's first duty after winning an election).
    pub async fn reclaim_stale_submissions(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
    ) -> Result<Vec<(String, SubmissionMessage)>, QueueError> {
        let mut conn = self.connection();

        let pending: redis::Value = redis::cmd("XPENDING")
            .arg(SUBMISSION_STREAM)
            .arg(CONSUMER_GROUP)
            .arg("IDLE")
            .arg(min_idle_ms)
            .arg("-")
            .arg("+")
            .arg(100)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        let entry_ids = extract_pending_ids(&pending);
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut claim_cmd = redis::cmd("XCLAIM");
        claim_cmd
            .arg(SUBMISSION_STREAM)
            .arg(CONSUMER_GROUP)
            .arg(consumer_name)
            .arg(min_idle_ms);
        for id in &entry_ids {
            claim_cmd.arg(id.as_str());
        }

        let claimed: redis::Value = claim_cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        Ok(parse_xclaim_response(&claimed).unwrap_or_default())
    }
}

fn parse_xreadgroup_response(
    value: Option<redis::Value>,
) -> Result<Option<(String, SubmissionMessage)>, QueueError> {
    let value = match value {
        Some(v) => v,
        None => return Ok(None),
    };

    let streams = match value {
        redis::Value::Array(arr) => arr,
        redis::Value::Nil => return Ok(None),
        _ => return Ok(None),
    };

    for stream_pair in streams {
        let pair = match stream_pair {
            redis::Value::Array(p) => p,
            _ => continue,
        };
        if pair.len() < 2 {
            continue;
        }

        let entries = match &pair[1] {
            redis::Value::Array(e) => e,
            _ => continue,
        };

        for entry in entries {
            let entry_pair = match entry {
                redis::Value::Array(ep) => ep,
                _ => continue,
            };
            if entry_pair.len() < 2 {
                continue;
            }

            let entry_id = match &entry_pair[0] {
                redis::Value::BulkString(b) => String::from_utf8_lossy(b).to_string(),
                _ => continue,
            };

            let fields = match &entry_pair[1] {
                redis::Value::Array(f) => f,
                _ => continue,
            };

            if let Some(msg) = extract_data_field(fields) {
                return Ok(Some((entry_id, msg)));
            }
        }
    }

    Ok(None)
}

fn extract_data_field(fields: &[redis::Value]) -> Option<SubmissionMessage> {
    let mut i = 0;
    while i + 1 < fields.len() {
        let key = match &fields[i] {
            redis::Value::BulkString(b) => String::from_utf8_lossy(b).to_string(),
            _ => {
                i += 2;
                continue;
            }
        };

        if key == "data" {
            let data = match &fields[i + 1] {
                redis::Value::BulkString(b) => String::from_utf8_lossy(b).to_string(),
                _ => return None,
            };
            return match serde_json::from_str(&data) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    tracing::error!(error = %e, data = %data, "failed to deserialize submission message");
                    None
                }
            };
        }

        i += 2;
    }
    None
}

fn extract_pending_ids(value: &redis::Value) -> Vec<String> {
    let mut ids = Vec::new();
    if let redis::Value::Array(entries) = value {
        for entry in entries {
            if let redis::Value::Array(fields) = entry {
                if let Some(redis::Value::BulkString(id_bytes)) = fields.first() {
                    ids.push(String::from_utf8_lossy(id_bytes).to_string());
                }
            }
        }
    }
    ids
}

fn parse_xclaim_response(value: &redis::Value) -> Option<Vec<(String, SubmissionMessage)>> {
    let entries = match value {
        redis::Value::Array(arr) => arr,
        _ => return None,
    };

    let mut results = Vec::new();
    for entry in entries {
        let entry_pair = match entry {
            redis::Value::Array(ep) => ep,
            _ => continue,
        };
        if entry_pair.len() < 2 {
            continue;
        }

        let entry_id = match &entry_pair[0] {
            redis::Value::BulkString(b) => String::from_utf8_lossy(b).to_string(),
            _ => continue,
        };

        let fields = match &entry_pair[1] {
            redis::Value::Array(f) => f,
            _ => continue,
        };

        if let Some(msg) = extract_data_field(fields) {
            results.push((entry_id, msg));
        }
    }

    Some(results)
}
