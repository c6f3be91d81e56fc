//! Renderer seam driven by [`RenderDispatcher`](super::dispatcher::RenderDispatcher).
//!
//! A renderer owns one output destination. The dispatcher prepares it once per
//! run, hands a fresh instance the paths to regenerate, and finalizes it.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::paths::StaticPath;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("io error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("path `{path}` cannot be written: {reason}")]
    InvalidPath {
        path: StaticPath,
        reason: &'static str,
    },
    #[error("failed to fetch `{path}`: {message}")]
    Fetch { path: StaticPath, message: String },
    #[error("origin answered {status} for `{path}`")]
    Status { path: StaticPath, status: u16 },
    #[error("output error: {message}")]
    Output { message: String },
}

impl RenderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }
}

/// Process-wide side of a renderer: the shared output destination.
#[async_trait]
pub trait StaticSiteRenderer: Send + Sync {
    /// Prepare the output destination before any instance generates.
    async fn initialize_output(&self) -> Result<(), RenderError>;

    /// Construct a renderer instance with an empty scope of work.
    fn instance(&self) -> Box<dyn RendererInstance>;

    /// Publish whatever the instances generated since the last initialize.
    async fn finalize_output(&self) -> Result<(), RenderError>;
}

/// One unit of generation, scoped to the paths assigned to it.
#[async_trait]
pub trait RendererInstance: Send {
    fn assign_paths(&mut self, paths: Vec<StaticPath>);

    /// Render only the assigned paths.
    async fn generate(&mut self) -> Result<(), RenderError>;
}
