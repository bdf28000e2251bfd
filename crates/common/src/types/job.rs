use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ids::{JobId, WorkerId};

/// Job lifecycle states (§3). Transitions are centralized in
/// [`crate::state_machine::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    pub fn from_db_str(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "queued" => Self::Queued,
            "running" => Self::Running,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            other => {
                warn!(status = other, "unknown job status in store row, defaulting to failed");
                Self::Failed
            }
        }
    }

    /// Whether this status is a terminal state (no further transitions
    /// except nothing — terminal states never transition further, since
    /// CANCELED is itself terminal and retry re-enters via a fresh PENDING
    /// assignment of the same row, not a new status class).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled)
    }
}

/// A container execution job (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Command to run inside the container, as an ordered argv. Mutually
    /// informative with `script`: exactly one of the two selects how the
    /// container is invoked (§4.5). May be empty; never null.
    #[serde(default)]
    pub command: Vec<String>,
    /// Container image reference, e.g. `python:3.12-slim`.
    pub image: String,
    /// Inline script piped to the image's interpreter instead of `command`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Worker currently holding (or that last held) this job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_worker: Option<WorkerId>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Combined, possibly-truncated stdout+stderr once terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Job {
    pub fn new(image: String, command: Vec<String>, script: Option<String>, max_retries: u32) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            command,
            image,
            script,
            assigned_worker: None,
            retry_count: 0,
            max_retries,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
        }
    }
}

/// Submission log message payload (§4.2, §6). Deliberately thinner than
/// [`Job`]: the scheduler re-reads the authoritative row from the Job Store
/// before acting, so this only needs to carry enough to find that row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionMessage {
    pub job_id: JobId,
}

impl From<&Job> for SubmissionMessage {
    fn from(job: &Job) -> Self {
        Self { job_id: job.id }
    }
}

/// Worker inbox message payload (§4.2, §4.4): the scheduler's assignment of
/// one job to one worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentMessage {
    pub job_id: JobId,
}
