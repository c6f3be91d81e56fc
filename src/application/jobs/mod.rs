mod context;
mod queue;
mod update_paths;

pub use context::{JobWorkerContext, job_failed};
pub use queue::{QueueError, RenderQueue};
pub use update_paths::{UpdatePathsJobPayload, process_update_paths_job};
