//! Postgres-backed job queue for path updates.

use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use async_trait::async_trait;
use sqlx::postgres::PgPool;

use crate::{
    application::jobs::{QueueError, RenderQueue, UpdatePathsJobPayload},
    domain::paths::StaticPath,
};

/// Job type under which path updates are stored and polled.
pub const UPDATE_PATHS_JOB_TYPE: &str = "medusa::update_paths";

const DEFAULT_PRIORITY: i32 = 0;

/// Storage polled by the update-paths worker.
pub fn update_paths_storage(pool: PgPool) -> PostgresStorage<UpdatePathsJobPayload> {
    PostgresStorage::new_with_config(pool, ApalisSqlConfig::new(UPDATE_PATHS_JOB_TYPE))
}

#[derive(Clone)]
pub struct PostgresRenderQueue {
    pool: PgPool,
    max_attempts: i32,
}

impl PostgresRenderQueue {
    pub fn new(pool: PgPool, max_attempts: i32) -> Self {
        Self { pool, max_attempts }
    }
}

#[async_trait]
impl RenderQueue for PostgresRenderQueue {
    async fn enqueue(&self, paths: Vec<StaticPath>) -> Result<String, QueueError> {
        let payload = serde_json::to_value(UpdatePathsJobPayload { paths })?;

        sqlx::query_scalar::<_, String>(
            r#"
            SELECT (apalis.push_job($1, $2::json, 'Pending', now(), $3, $4)).id
            "#,
        )
        .bind(UPDATE_PATHS_JOB_TYPE)
        .bind(payload)
        .bind(self.max_attempts)
        .bind(DEFAULT_PRIORITY)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| QueueError::storage(err.to_string()))
    }
}

/// Queue used when no job storage is configured; every enqueue fails.
#[derive(Debug, Clone, Default)]
pub struct DisabledRenderQueue;

#[async_trait]
impl RenderQueue for DisabledRenderQueue {
    async fn enqueue(&self, _paths: Vec<StaticPath>) -> Result<String, QueueError> {
        Err(QueueError::unavailable(
            "no job storage configured; set `database.url`",
        ))
    }
}
