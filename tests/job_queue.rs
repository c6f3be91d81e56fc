use std::str::FromStr;

use apalis::prelude::{Storage, TaskId};
use medusa::{
    application::jobs::{RenderQueue, UpdatePathsJobPayload},
    domain::paths::static_paths,
    infra::{
        db,
        queue::{PostgresRenderQueue, UPDATE_PATHS_JOB_TYPE, update_paths_storage},
    },
};
use sqlx::PgPool;

#[sqlx::test(migrations = false)]
async fn enqueue_stores_exact_paths_for_the_worker(pool: PgPool) {
    db::prepare_job_storage(&pool)
        .await
        .expect("job storage should be prepared");

    let queue = PostgresRenderQueue::new(pool.clone(), 7);
    let job_id = queue
        .enqueue(static_paths(["/a/1", "/a/2"]))
        .await
        .expect("enqueue succeeds");

    let (job_type, status, max_attempts, job): (String, String, i32, serde_json::Value) =
        sqlx::query_as(
            "SELECT job_type, status, max_attempts, job FROM apalis.jobs WHERE id = $1",
        )
        .bind(&job_id)
        .fetch_one(&pool)
        .await
        .expect("job row exists");

    assert_eq!(job_type, UPDATE_PATHS_JOB_TYPE);
    assert_eq!(status, "Pending");
    assert_eq!(max_attempts, 7);
    assert_eq!(job, serde_json::json!({ "paths": ["/a/1", "/a/2"] }));

    let mut storage = update_paths_storage(pool);
    let task_id = TaskId::from_str(&job_id).expect("job id is a task id");
    let request = storage
        .fetch_by_id(&task_id)
        .await
        .expect("storage lookup succeeds")
        .expect("worker storage sees the job");

    assert_eq!(
        request.args,
        UpdatePathsJobPayload {
            paths: static_paths(["/a/1", "/a/2"]),
        }
    );
    assert_eq!(request.parts.context.max_attempts(), 7);
}

#[sqlx::test(migrations = false)]
async fn empty_path_list_is_still_enqueued(pool: PgPool) {
    db::prepare_job_storage(&pool)
        .await
        .expect("job storage should be prepared");

    let queue = PostgresRenderQueue::new(pool.clone(), 25);
    let job_id = queue.enqueue(Vec::new()).await.expect("enqueue succeeds");

    let job: serde_json::Value = sqlx::query_scalar("SELECT job FROM apalis.jobs WHERE id = $1")
        .bind(&job_id)
        .fetch_one(&pool)
        .await
        .expect("job row exists");

    assert_eq!(job, serde_json::json!({ "paths": [] }));
}
