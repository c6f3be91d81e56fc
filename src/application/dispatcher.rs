//! Render dispatcher: the unit of work that regenerates a set of paths.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::paths::StaticPath;

use super::renderer::{RenderError, StaticSiteRenderer};

const SOURCE: &str = "application::dispatcher";
const METRIC_UPDATE_PATHS_MS: &str = "medusa_update_paths_ms";
const METRIC_PATHS_RENDERED: &str = "medusa_paths_rendered_total";

/// Runs the renderer protocol for one batch of paths.
///
/// The four steps always run in order: initialize output, assign paths,
/// generate, finalize output. A failing step ends the run; nothing already
/// done is undone here. Runs sharing a dispatcher never interleave.
#[derive(Clone)]
pub struct RenderDispatcher {
    renderer: Arc<dyn StaticSiteRenderer>,
    gate: Arc<Mutex<()>>,
}

impl RenderDispatcher {
    pub fn new(renderer: Arc<dyn StaticSiteRenderer>) -> Self {
        Self {
            renderer,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Regenerate exactly `paths`. An empty list still runs every step.
    #[instrument(skip_all, fields(path_count = paths.len()))]
    pub async fn update_paths(&self, paths: Vec<StaticPath>) -> Result<(), RenderError> {
        let _guard = self.gate.lock().await;
        let started_at = Instant::now();
        let path_count = paths.len();

        let result = self.run(paths).await;

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(()) => {
                counter!(METRIC_PATHS_RENDERED).increment(path_count as u64);
                info!(
                    target = SOURCE,
                    path_count, elapsed_ms, "static paths regenerated"
                );
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    path_count,
                    error = %err,
                    "static regeneration failed"
                );
            }
        }

        histogram!(
            METRIC_UPDATE_PATHS_MS,
            "result" => if result.is_ok() { "ok" } else { "error" }
        )
        .record(elapsed_ms);

        result
    }

    async fn run(&self, paths: Vec<StaticPath>) -> Result<(), RenderError> {
        debug!(target = SOURCE, step = "initialize_output");
        self.renderer.initialize_output().await?;

        let mut instance = self.renderer.instance();
        debug!(target = SOURCE, step = "assign_paths", paths = ?paths);
        instance.assign_paths(paths);

        debug!(target = SOURCE, step = "generate");
        instance.generate().await?;

        debug!(target = SOURCE, step = "finalize_output");
        self.renderer.finalize_output().await
    }
}
