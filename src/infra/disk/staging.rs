//! Stage-then-swap handling of the deploy directory.
//!
//! Generation never writes into the published tree. [`StagedOutput::prepare`]
//! seeds a sibling staging tree from the current deploy directory, the
//! renderer writes into it, and [`StagedOutput::publish`] swaps it into place
//! with two renames. A run that fails before publishing leaves the deploy
//! directory as it was; its staging tree is discarded by the next prepare.
//!
//! Between the two renames the published tree only exists as the retired
//! sibling. If the process dies there, the next prepare or publish moves it
//! back before doing anything else.

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::application::renderer::RenderError;

const SOURCE: &str = "infra::disk::staging";
const STAGING_SUFFIX: &str = ".staging";
const RETIRED_SUFFIX: &str = ".previous";

#[derive(Debug, Clone)]
pub struct StagedOutput {
    deploy_dir: PathBuf,
    staging_dir: PathBuf,
    retired_dir: PathBuf,
}

impl StagedOutput {
    pub fn new(deploy_dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let deploy_dir = deploy_dir.into();
        let Some(name) = deploy_dir.file_name().map(|name| name.to_os_string()) else {
            return Err(RenderError::output(format!(
                "deploy directory `{}` must name a directory",
                deploy_dir.display()
            )));
        };

        let staging_dir = deploy_dir.with_file_name(suffixed(&name, STAGING_SUFFIX));
        let retired_dir = deploy_dir.with_file_name(suffixed(&name, RETIRED_SUFFIX));

        Ok(Self {
            deploy_dir,
            staging_dir,
            retired_dir,
        })
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Reset the staging tree to a copy of the published output.
    pub async fn prepare(&self) -> Result<(), RenderError> {
        self.recover_interrupted_publish().await?;
        remove_tree(&self.staging_dir).await?;

        if exists(&self.deploy_dir).await? {
            copy_tree(&self.deploy_dir, &self.staging_dir).await?;
        } else {
            fs::create_dir_all(&self.staging_dir)
                .await
                .map_err(|err| RenderError::io(&self.staging_dir, err))?;
        }

        debug!(
            target = SOURCE,
            staging = %self.staging_dir.display(),
            "staging tree prepared"
        );
        Ok(())
    }

    /// Swap the staging tree into the deploy location.
    pub async fn publish(&self) -> Result<(), RenderError> {
        if !exists(&self.staging_dir).await? {
            return Err(RenderError::output(format!(
                "staging tree `{}` is missing; output was not initialized",
                self.staging_dir.display()
            )));
        }

        self.recover_interrupted_publish().await?;
        remove_tree(&self.retired_dir).await?;

        let had_previous = exists(&self.deploy_dir).await?;
        if had_previous {
            fs::rename(&self.deploy_dir, &self.retired_dir)
                .await
                .map_err(|err| RenderError::io(&self.deploy_dir, err))?;
        }

        if let Err(err) = fs::rename(&self.staging_dir, &self.deploy_dir).await {
            if had_previous {
                if let Err(restore_err) = fs::rename(&self.retired_dir, &self.deploy_dir).await {
                    error!(
                        target = SOURCE,
                        retired = %self.retired_dir.display(),
                        error = %restore_err,
                        "failed to restore published tree; it remains in the retired directory"
                    );
                }
            }
            return Err(RenderError::io(&self.staging_dir, err));
        }

        // The new tree is live; a leftover retired tree is cleared next time.
        if let Err(err) = remove_tree(&self.retired_dir).await {
            warn!(
                target = SOURCE,
                retired = %self.retired_dir.display(),
                error = %err,
                "failed to remove retired tree"
            );
        }

        info!(
            target = SOURCE,
            deploy = %self.deploy_dir.display(),
            "static output published"
        );
        Ok(())
    }

    /// Move the retired tree back when a publish stopped between its renames.
    async fn recover_interrupted_publish(&self) -> Result<(), RenderError> {
        if exists(&self.deploy_dir).await? || !exists(&self.retired_dir).await? {
            return Ok(());
        }

        fs::rename(&self.retired_dir, &self.deploy_dir)
            .await
            .map_err(|err| RenderError::io(&self.retired_dir, err))?;

        warn!(
            target = SOURCE,
            deploy = %self.deploy_dir.display(),
            "restored published tree left behind by an interrupted publish"
        );
        Ok(())
    }
}

fn suffixed(name: &OsString, suffix: &str) -> OsString {
    let mut value = name.clone();
    value.push(suffix);
    value
}

async fn exists(path: &Path) -> Result<bool, RenderError> {
    fs::try_exists(path)
        .await
        .map_err(|err| RenderError::io(path, err))
}

async fn remove_tree(path: &Path) -> Result<(), RenderError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(RenderError::io(path, err)),
    }
}

async fn copy_tree(from: &Path, to: &Path) -> Result<(), RenderError> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((source_dir, target_dir)) = pending.pop() {
        fs::create_dir_all(&target_dir)
            .await
            .map_err(|err| RenderError::io(&target_dir, err))?;

        let mut entries = fs::read_dir(&source_dir)
            .await
            .map_err(|err| RenderError::io(&source_dir, err))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| RenderError::io(&source_dir, err))?
        {
            let source = entry.path();
            let target = target_dir.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| RenderError::io(&source, err))?;

            if file_type.is_dir() {
                pending.push((source, target));
            } else {
                fs::copy(&source, &target)
                    .await
                    .map_err(|err| RenderError::io(&source, err))?;
            }
        }
    }

    Ok(())
}
