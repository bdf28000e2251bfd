use super::loader::ConfigError;
use super::{RetryConfig, SystemConfig};

/// Validate the complete system configuration. Every role binary refuses
/// to start on a validation failure (§6) rather than run with a
/// nonsensical timing parameter.
pub fn validate(config: &SystemConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_leader(config, &mut errors);
    validate_heartbeat(config, &mut errors);
    validate_reconcile(config, &mut errors);
    validate_scheduler(config, &mut errors);
    validate_worker(config, &mut errors);
    validate_executor(config, &mut errors);
    validate_retry(&config.retry.store, "store", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_leader(config: &SystemConfig, errors: &mut Vec<String>) {
    let l = &config.leader;

    if l.lease_ttl_seconds <= 0 {
        errors.push("leader.lease_ttl_seconds must be > 0".into());
    }
    if l.keepalive_interval_seconds == 0 {
        errors.push("leader.keepalive_interval_seconds must be > 0".into());
    }
    if i64::try_from(l.keepalive_interval_seconds).unwrap_or(i64::MAX) >= l.lease_ttl_seconds {
        errors.push("leader.keepalive_interval_seconds must be < leader.lease_ttl_seconds".into());
    }
    if l.acquire_retry_seconds == 0 {
        errors.push("leader.acquire_retry_seconds must be > 0".into());
    }
}

fn validate_heartbeat(config: &SystemConfig, errors: &mut Vec<String>) {
    let h = &config.heartbeat;

    if h.ttl_seconds < 5 {
        errors.push("heartbeat.ttl_seconds must be >= 5".into());
    }
    if h.refresh_interval_seconds == 0 {
        errors.push("heartbeat.refresh_interval_seconds must be > 0".into());
    }
    if h.refresh_interval_seconds >= h.ttl_seconds {
        errors.push("heartbeat.refresh_interval_seconds must be < heartbeat.ttl_seconds".into());
    }
}

fn validate_reconcile(config: &SystemConfig, errors: &mut Vec<String>) {
    let r = &config.reconcile;

    if r.interval_seconds == 0 {
        errors.push("reconcile.interval_seconds must be > 0".into());
    }
    if r.queued_grace_multiplier == 0 {
        errors.push("reconcile.queued_grace_multiplier must be > 0".into());
    }
    if r.outbox_stale_seconds == 0 {
        errors.push("reconcile.outbox_stale_seconds must be > 0".into());
    }
}

fn validate_scheduler(config: &SystemConfig, errors: &mut Vec<String>) {
    let s = &config.scheduler;

    if s.empty_pool_backoff_seconds == 0 {
        errors.push("scheduler.empty_pool_backoff_seconds must be > 0".into());
    }
    if s.submission_log_block_ms == 0 {
        errors.push("scheduler.submission_log_block_ms must be > 0".into());
    }
}

fn validate_worker(config: &SystemConfig, errors: &mut Vec<String>) {
    let w = &config.worker;

    if w.inbox_block_seconds == 0 {
        errors.push("worker.inbox_block_seconds must be > 0".into());
    }
    if w.quiescent_retry_backoff_seconds == 0 {
        errors.push("worker.quiescent_retry_backoff_seconds must be > 0".into());
    }
}

fn validate_executor(config: &SystemConfig, errors: &mut Vec<String>) {
    let e = &config.executor;

    if e.container_runtime.trim().is_empty() {
        errors.push("executor.container_runtime must not be empty".into());
    }
    if e.result_truncate_bytes == 0 {
        errors.push("executor.result_truncate_bytes must be > 0".into());
    }
    if e.run_timeout_seconds == 0 {
        errors.push("executor.run_timeout_seconds must be > 0".into());
    }
}

fn validate_retry(rc: &RetryConfig, name: &str, errors: &mut Vec<String>) {
    if rc.max_attempts == 0 {
        errors.push(format!("retry.{}.max_attempts must be > 0", name));
    }
    if rc.initial_backoff_ms == 0 {
        errors.push(format!("retry.{}.initial_backoff_ms must be > 0", name));
    }
    if rc.max_backoff_ms < rc.initial_backoff_ms {
        errors.push(format!("retry.{}.max_backoff_ms must be >= initial_backoff_ms", name));
    }
    if rc.backoff_multiplier < 1.0 {
        errors.push(format!("retry.{}.backoff_multiplier must be >= 1.0", name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&SystemConfig::default()).is_ok());
    }

    #[test]
    fn zero_heartbeat_ttl_is_rejected() {
        let mut config = SystemConfig::default();
        config.heartbeat.ttl_seconds = 0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn keepalive_must_be_shorter_than_lease() {
        let mut config = SystemConfig::default();
        config.leader.keepalive_interval_seconds = config.leader.lease_ttl_seconds as u64;
        assert!(validate(&config).is_err());
    }
}
