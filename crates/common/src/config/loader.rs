use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub leader: LeaderConfig,
    pub heartbeat: HeartbeatConfig,
    pub reconcile: ReconcileConfig,
    pub scheduler: SchedulerLoopConfig,
    pub worker: WorkerLoopConfig,
    pub executor: ExecutorConfig,
    pub retry: RetryDefaults,
}

/// Leader election timing (§4.1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaderConfig {
    /// Lease TTL in seconds (`L`). Default 10.
    pub lease_ttl_seconds: i64,
    /// Keepalive interval in seconds, typically `L/3`.
    pub keepalive_interval_seconds: u64,
    /// Backoff between acquisition attempts after losing/failing to acquire.
    pub acquire_retry_seconds: u64,
}

/// Worker heartbeat timing (§3, §4.4).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Heartbeat key TTL in seconds (`H`). Default 10.
    pub ttl_seconds: u64,
    /// Refresh interval in seconds, typically `H/2`.
    pub refresh_interval_seconds: u64,
}

/// Reconciler cadence (§4.3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Reconcile interval in seconds (`R`). Default 10.
    pub interval_seconds: u64,
    /// Multiplier applied to heartbeat TTL to derive the QUEUED grace period
    /// `G` (default `G = 3 * H`).
    pub queued_grace_multiplier: u64,
    /// Outbox rows older than this (seconds) with `relayed_at IS NULL` are
    /// re-relayed inline by reconciler Pass C.
    pub outbox_stale_seconds: u64,
}

/// Scheduler loop timing (§4.2, §5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerLoopConfig {
    /// Backoff when no live workers are available. Default 2s.
    pub empty_pool_backoff_seconds: u64,
    /// Block duration for the submission log read. Default 2s.
    pub submission_log_block_ms: u64,
}

/// Worker loop timing (§4.4, §5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerLoopConfig {
    /// Blocking inbox pop timeout in seconds (`T`). Default 5.
    pub inbox_block_seconds: u64,
    /// Backoff after a transient store error. Default 5s.
    pub quiescent_retry_backoff_seconds: u64,
}

/// Executor configuration (§4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Container runtime binary to invoke (e.g. "docker", "podman").
    pub container_runtime: String,
    /// Cap, in bytes, on the combined stdout+stderr captured into `result`.
    pub result_truncate_bytes: usize,
    /// Wall-clock timeout for a single container run, in seconds.
    pub run_timeout_seconds: u64,
}

/// Default retry parameters for transient store errors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryDefaults {
    pub store: RetryConfig,
}

/// Retry configuration for a specific target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            leader: LeaderConfig {
                lease_ttl_seconds: 10,
                keepalive_interval_seconds: 3,
                acquire_retry_seconds: 5,
            },
            heartbeat: HeartbeatConfig {
                ttl_seconds: 10,
                refresh_interval_seconds: 5,
            },
            reconcile: ReconcileConfig {
                interval_seconds: 10,
                queued_grace_multiplier: 3,
                outbox_stale_seconds: 60,
            },
            scheduler: SchedulerLoopConfig {
                empty_pool_backoff_seconds: 2,
                submission_log_block_ms: 2000,
            },
            worker: WorkerLoopConfig {
                inbox_block_seconds: 5,
                quiescent_retry_backoff_seconds: 5,
            },
            executor: ExecutorConfig {
                container_runtime: "docker".to_string(),
                result_truncate_bytes: 64 * 1024,
                run_timeout_seconds: 3600,
            },
            retry: RetryDefaults {
                store: RetryConfig {
                    max_attempts: 5,
                    initial_backoff_ms: 200,
                    max_backoff_ms: 5_000,
                    backoff_multiplier: 2.0,
                    jitter: true,
                },
            },
        }
    }
}

impl ReconcileConfig {
    /// The QUEUED grace period `G`, in seconds.
    pub fn queued_grace_seconds(&self, heartbeat_ttl_seconds: u64) -> u64 {
        heartbeat_ttl_seconds * self.queued_grace_multiplier
    }
}

/// Load `system.toml` from `config_dir`, then validate it. Missing file
/// falls back to [`SystemConfig::default`] (every role binary ships a
/// working default); a present-but-malformed or semantically invalid file
/// is a startup-refusing error (§6).
pub fn load_config(config_dir: &std::path::Path) -> Result<SystemConfig, ConfigError> {
    let path = config_dir.join("system.toml");

    let config = if !path.exists() {
        tracing::warn!(path = %path.display(), "no system.toml found, using built-in defaults");
        SystemConfig::default()
    } else {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            detail: e.to_string(),
        })?
    };

    super::validation::validate(&config)?;
    Ok(config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {detail}")]
    Parse { path: std::path::PathBuf, detail: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}
