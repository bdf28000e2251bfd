mod loader;
mod validation;

pub use loader::{load_config, ConfigError, SystemConfig};
pub use loader::{
    ExecutorConfig, HeartbeatConfig, LeaderConfig, ReconcileConfig, RetryConfig, RetryDefaults,
    SchedulerLoopConfig, WorkerLoopConfig,
};
