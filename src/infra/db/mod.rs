//! Postgres connection and job storage bootstrap.

use apalis_sql::postgres::PostgresStorage;
use sqlx::{
    query,
    postgres::{PgPool, PgPoolOptions},
};
use tracing::info;

use crate::config::DatabaseSettings;

use super::error::InfraError;

/// Open a pool against the configured database.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, InfraError> {
    let url = settings.url.as_deref().ok_or_else(|| {
        InfraError::configuration("`database.url` is required for queued regeneration")
    })?;

    PgPoolOptions::new()
        .max_connections(settings.max_connections.get())
        .connect(url)
        .await
        .map_err(|err| InfraError::database(format!("failed to connect: {err}")))
}

/// Create or upgrade the job queue tables.
pub async fn prepare_job_storage(pool: &PgPool) -> Result<(), InfraError> {
    PostgresStorage::setup(pool)
        .await
        .map_err(InfraError::JobStorage)?;
    info!(target = "infra::db", "job storage ready");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> Result<(), InfraError> {
    query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|err| InfraError::database(err.to_string()))
}
