use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Alias for the pooled connection handed to every service.
pub type DbPool = DatabaseConnection;

// Pool timeouts that never vary per deployment; the per-deployment knobs
// (url, pool size, connect timeout) live in AppConfig.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(8);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Opens the connection pool described by the loaded configuration.
/// Works against SQLite and Postgres URLs alike.
#[instrument(skip(cfg), fields(max_connections = cfg.db_max_connections))]
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let mut options = ConnectOptions::new(cfg.database_url.clone());
    options
        .max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections)
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .sqlx_logging(false);

    let pool = Database::connect(options).await.map_err(|e| {
        error!(error = %e, "Could not connect to database");
        ServiceError::DatabaseError(e)
    })?;

    info!("Database pool ready");
    Ok(pool)
}

/// Reports whether an error is a unique constraint violation, across backends.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Brings the schema up to date with the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let started = std::time::Instant::now();
    crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(|e| {
            error!(error = %e, "Migration run failed");
            ServiceError::DatabaseError(e)
        })?;

    info!(elapsed = ?started.elapsed(), "Migrations applied");
    Ok(())
}
