mod jobs;
mod outbox;

pub use outbox::OutboxRow;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// PostgreSQL client for the Job Store (§4.1 "source of truth").
///
/// Every status transition in the system — scheduler assignment, worker
/// start/finish, reconciler recovery — goes through a method on this type,
/// each wrapped in a transaction so a crash mid-write never leaves a job in
/// an intermediate state (§7).
pub struct StoreClient {
    pool: PgPool,
}

impl StoreClient {
    /// Connect to PostgreSQL and return a client with a connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        tracing::info!("connecting to postgres job store");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let client = Self { pool };
        client.health_check().await?;
        tracing::info!("postgres job store connection established");

        Ok(client)
    }

    /// Verify the connection is alive.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("running job store migrations");

        sqlx::migrate!("src/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("job store migrations complete");
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("postgres connection error: {0}")]
    Connection(String),

    #[error("postgres query error: {0}")]
    Query(String),

    #[error("postgres migration error: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for jobsched_common::SchedulerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => jobsched_common::SchedulerError::NotFound(msg),
            other => jobsched_common::SchedulerError::TransientStore(other.to_string()),
        }
    }
}
