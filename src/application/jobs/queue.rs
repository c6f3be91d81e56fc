use async_trait::async_trait;
use thiserror::Error;

use crate::domain::paths::StaticPath;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to encode job payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("job storage rejected the job: {message}")]
    Storage { message: String },
    #[error("queued dispatch is unavailable: {reason}")]
    Unavailable { reason: String },
}

impl QueueError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Hands path batches to a background worker.
#[async_trait]
pub trait RenderQueue: Send + Sync {
    /// Schedule regeneration of exactly `paths`, returning the queue's job id.
    async fn enqueue(&self, paths: Vec<StaticPath>) -> Result<String, QueueError>;
}
