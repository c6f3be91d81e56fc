//! Disk renderer: writes pages fetched from a [`PageSource`] into a deploy
//! directory using [`StagedOutput`].

mod layout;
mod source;
mod staging;

pub use layout::output_file_for;
pub use source::{HttpPageSource, PageSource};
pub use staging::StagedOutput;

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use futures::{TryStreamExt, stream};
use tokio::fs;
use tracing::debug;

use crate::{
    application::renderer::{RenderError, RendererInstance, StaticSiteRenderer},
    domain::paths::StaticPath,
};

const SOURCE: &str = "infra::disk";

pub struct DiskStaticSiteRenderer {
    output: StagedOutput,
    source: Arc<dyn PageSource>,
    concurrency: NonZeroUsize,
}

impl DiskStaticSiteRenderer {
    pub fn new(
        deploy_dir: impl Into<PathBuf>,
        source: Arc<dyn PageSource>,
        concurrency: NonZeroUsize,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            output: StagedOutput::new(deploy_dir)?,
            source,
            concurrency,
        })
    }
}

#[async_trait]
impl StaticSiteRenderer for DiskStaticSiteRenderer {
    async fn initialize_output(&self) -> Result<(), RenderError> {
        self.output.prepare().await
    }

    fn instance(&self) -> Box<dyn RendererInstance> {
        Box::new(DiskRendererInstance {
            staging_dir: self.output.staging_dir().to_path_buf(),
            source: Arc::clone(&self.source),
            concurrency: self.concurrency,
            paths: Vec::new(),
        })
    }

    async fn finalize_output(&self) -> Result<(), RenderError> {
        self.output.publish().await
    }
}

struct DiskRendererInstance {
    staging_dir: PathBuf,
    source: Arc<dyn PageSource>,
    concurrency: NonZeroUsize,
    paths: Vec<StaticPath>,
}

#[async_trait]
impl RendererInstance for DiskRendererInstance {
    fn assign_paths(&mut self, paths: Vec<StaticPath>) {
        self.paths = paths;
    }

    async fn generate(&mut self) -> Result<(), RenderError> {
        let staging_dir = self.staging_dir.as_path();
        let source = self.source.as_ref();

        stream::iter(self.paths.iter().map(Ok::<_, RenderError>))
            .try_for_each_concurrent(Some(self.concurrency.get()), |path| async move {
                write_page(source, staging_dir, path).await
            })
            .await
    }
}

async fn write_page(
    source: &dyn PageSource,
    staging_dir: &Path,
    path: &StaticPath,
) -> Result<(), RenderError> {
    let target = staging_dir.join(output_file_for(path)?);
    let body = source.fetch(path).await?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| RenderError::io(parent, err))?;
    }
    fs::write(&target, &body)
        .await
        .map_err(|err| RenderError::io(&target, err))?;

    debug!(
        target = SOURCE,
        path = %path,
        file = %target.display(),
        bytes = body.len(),
        "page written"
    );
    Ok(())
}
