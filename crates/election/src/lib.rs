use std::future::Future;
use std::time::Duration;

use etcd_client::{Client, Compare, CompareOp, PutOptions, Txn, TxnOp};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Leader election configuration (§4.1).
#[derive(Debug, Clone)]
pub struct LeaderElectionConfig {
    /// Identifier for this candidate (the scheduler replica's hostname/pod name).
    pub name: String,
    /// etcd key the leader record is stored under.
    pub leader_key: String,
    /// Lease TTL in seconds (`L`). If the leader dies, the key expires after this.
    pub lease_ttl: i64,
    /// How often to send keepalive pings, typically `L/3`.
    pub keepalive_interval: Duration,
    /// How long to wait before retrying after failing to acquire leadership.
    pub retry_interval: Duration,
}

/// Written to the leader key while held (§4.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderRecord {
    pub holder: String,
    pub lease_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    #[error("etcd error: {0}")]
    Etcd(#[from] etcd_client::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("leadership lost")]
    LeadershipLost,
}

impl From<ElectionError> for jobsched_common::SchedulerError {
    fn from(e: ElectionError) -> Self {
        match e {
            ElectionError::LeadershipLost => jobsched_common::SchedulerError::LeadershipLost,
            other => jobsched_common::SchedulerError::TransientStore(other.to_string()),
        }
    }
}

/// Run a closure as leader indefinitely (§4.1, §5).
///
/// Continuously attempts to acquire leadership via an etcd CAS write. When
/// elected, runs `work_fn` with a child cancellation token that fires the
/// instant leadership ends — the token IS the epoch boundary (§5): every
/// leader-only task created inside `work_fn` must select on it and stop.
/// If `work_fn` returns (leadership lost, error, or clean shutdown), waits
/// `retry_interval` and tries again.
///
/// The outer `cancel` token stops the entire election loop, including
/// mid-attempt.
pub async fn run_as_leader<F, Fut>(
    client: Client,
    config: LeaderElectionConfig,
    cancel: CancellationToken,
    work_fn: F,
) -> Result<(), ElectionError>
where
    F: Fn(CancellationToken) -> Fut,
    Fut: Future<Output = Result<(), ElectionError>>,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            result = try_lead(&client, &config, &cancel, &work_fn) => {
                match result {
                    Ok(()) => {
                        tracing::info!(name = %config.name, "leadership epoch ended normally");
                    }
                    Err(e) => {
                        tracing::warn!(name = %config.name, error = %e, "leadership epoch ended with error");
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(config.retry_interval) => {}
                }
            }
        }
    }
}

async fn try_lead<F, Fut>(
    client: &Client,
    config: &LeaderElectionConfig,
    cancel: &CancellationToken,
    work_fn: &F,
) -> Result<(), ElectionError>
where
    F: Fn(CancellationToken) -> Fut,
    Fut: Future<Output = Result<(), ElectionError>>,
{
    let lease_id = client.clone().lease_grant(config.lease_ttl, None).await?.id();

    let acquired = try_acquire(client, &config.leader_key, &config.name, lease_id).await?;
    if !acquired {
        tracing::debug!(name = %config.name, "another candidate holds leadership, standing by");
        drop(client.clone().lease_revoke(lease_id).await);
        return Ok(());
    }

    tracing::info!(name = %config.name, lease_id, "acquired leadership");
    metrics::gauge!("leader.epoch").increment(1.0);

    let leadership_cancel = cancel.child_token();
    let keepalive_handle = {
        let client = client.clone();
        let interval = config.keepalive_interval;
        let token = leadership_cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = run_lease_keepalive(client, lease_id, interval, token.clone()).await {
                tracing::error!(error = %e, "lease keepalive failed, ending leadership epoch");
                token.cancel();
            }
        })
    };

    let result = work_fn(leadership_cancel.clone()).await;

    leadership_cancel.cancel();
    drop(keepalive_handle.await);
    drop(client.clone().lease_revoke(lease_id).await);
    metrics::gauge!("leader.epoch").decrement(1.0);

    result
}

/// CAS: succeed only if the leader key does not currently exist
/// (`version == 0`). This is the whole of the coordination primitive the
/// rest of the scheduler relies on for I1 (single active leader per epoch).
async fn try_acquire(client: &Client, key: &str, holder: &str, lease_id: i64) -> Result<bool, ElectionError> {
    let record = LeaderRecord {
        holder: holder.to_string(),
        lease_id,
    };
    let value = serde_json::to_vec(&record)?;

    let txn = Txn::new()
        .when(vec![Compare::version(key, CompareOp::Equal, 0)])
        .and_then(vec![TxnOp::put(key, value, Some(PutOptions::new().with_lease(lease_id)))])
        .or_else(vec![TxnOp::get(key, None)]);

    let resp = client.clone().txn(txn).await?;
    Ok(resp.succeeded())
}

async fn run_lease_keepalive(
    mut client: Client,
    lease_id: i64,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<(), ElectionError> {
    let (mut keeper, mut stream) = client.lease_keep_alive(lease_id).await?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(interval) => {
                keeper.keep_alive().await?;
                if stream.message().await?.is_none() {
                    return Err(ElectionError::LeadershipLost);
                }
            }
        }
    }
}

/// Read the current leader record from etcd, if any (diagnostics / `/health`).
pub async fn get_leader(client: &Client, key: &str) -> Result<Option<LeaderRecord>, ElectionError> {
    let resp = client.clone().get(key, None).await?;
    match resp.kvs().first() {
        Some(kv) => Ok(Some(serde_json::from_slice(kv.value())?)),
        None => Ok(None),
    }
}
