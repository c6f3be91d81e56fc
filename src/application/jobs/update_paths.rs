use apalis::prelude::{Data, Error as ApalisError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::paths::StaticPath;

use super::context::{JobWorkerContext, job_failed};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePathsJobPayload {
    pub paths: Vec<StaticPath>,
}

/// Worker entry point: regenerate the queued paths.
///
/// Failures are surfaced to the queue unchanged so its retry policy applies.
pub async fn process_update_paths_job(
    payload: UpdatePathsJobPayload,
    context: Data<JobWorkerContext>,
) -> Result<(), ApalisError> {
    let ctx = &*context;

    info!(
        target = "application::jobs::process_update_paths_job",
        path_count = payload.paths.len(),
        "processing queued path update"
    );

    ctx.dispatcher
        .update_paths(payload.paths)
        .await
        .map_err(job_failed)
}
