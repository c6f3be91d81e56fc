//! Change notifier: turns model saves into static regeneration.
//!
//! The notifier is wired explicitly. Model types opt in with
//! [`ChangeNotifier::subscribe`]; the persistence layer calls
//! [`ChangeNotifier::post_save`] after every save, and saves of types that
//! were never subscribed fall through as a no-op.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{error::DomainError, paths::StaticPath};

use super::{
    dispatcher::RenderDispatcher,
    jobs::{QueueError, RenderQueue},
    renderable::Renderable,
    renderer::RenderError,
};

const SOURCE: &str = "application::notifier";
const METRIC_SAVE_NOTIFICATIONS: &str = "medusa_save_notifications_total";

/// Dispatch configuration injected at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierSettings {
    /// Enqueue renders on the job queue instead of running them inline.
    pub update_async: bool,
}

/// What a save notification led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The saved type is not subscribed.
    Skipped,
    /// The paths were regenerated before returning.
    Rendered { paths: Vec<StaticPath> },
    /// The paths were handed to the job queue.
    Enqueued {
        job_id: String,
        paths: Vec<StaticPath>,
    },
}

impl NotifyOutcome {
    fn label(&self) -> &'static str {
        match self {
            NotifyOutcome::Skipped => "skipped",
            NotifyOutcome::Rendered { .. } => "rendered",
            NotifyOutcome::Enqueued { .. } => "enqueued",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("`{model}` failed to produce static paths")]
    Paths {
        model: &'static str,
        #[source]
        source: DomainError,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

type ProbeResult = Option<(&'static str, Result<Vec<StaticPath>, DomainError>)>;
type PathsProbe = fn(&(dyn Any + 'static)) -> ProbeResult;

fn probe<M: Renderable + 'static>(instance: &(dyn Any + 'static)) -> ProbeResult {
    instance
        .downcast_ref::<M>()
        .map(|model| (model.model_name(), model.render_static()))
}

pub struct ChangeNotifier {
    settings: NotifierSettings,
    dispatcher: RenderDispatcher,
    queue: Arc<dyn RenderQueue>,
    subscriptions: HashMap<TypeId, PathsProbe>,
}

impl ChangeNotifier {
    pub fn new(
        settings: NotifierSettings,
        dispatcher: RenderDispatcher,
        queue: Arc<dyn RenderQueue>,
    ) -> Self {
        Self {
            settings,
            dispatcher,
            queue,
            subscriptions: HashMap::new(),
        }
    }

    /// Register `M` so that its saves trigger regeneration.
    pub fn subscribe<M: Renderable + 'static>(mut self) -> Self {
        debug!(
            target = SOURCE,
            model = type_name::<M>(),
            "subscribed to saves"
        );
        self.subscriptions.insert(TypeId::of::<M>(), probe::<M>);
        self
    }

    pub fn is_subscribed<M: 'static>(&self) -> bool {
        self.subscriptions.contains_key(&TypeId::of::<M>())
    }

    /// Handle a save of any model type.
    pub async fn post_save<M: Any>(&self, instance: &M) -> Result<NotifyOutcome, NotifyError> {
        let Some((model, paths)) = self
            .subscriptions
            .get(&TypeId::of::<M>())
            .and_then(|probe_paths| probe_paths(instance))
        else {
            debug!(
                target = SOURCE,
                model = type_name::<M>(),
                "save ignored: model is not subscribed"
            );
            return Ok(record(NotifyOutcome::Skipped));
        };

        let paths = paths.map_err(|source| NotifyError::Paths { model, source })?;
        self.dispatch(model, paths).await
    }

    /// Handle a save of a statically known renderable model, bypassing the
    /// subscription table.
    pub async fn post_save_renderable<M: Renderable + ?Sized>(
        &self,
        instance: &M,
    ) -> Result<NotifyOutcome, NotifyError> {
        let model = instance.model_name();
        let paths = instance
            .render_static()
            .map_err(|source| NotifyError::Paths { model, source })?;
        self.dispatch(model, paths).await
    }

    async fn dispatch(
        &self,
        model: &'static str,
        paths: Vec<StaticPath>,
    ) -> Result<NotifyOutcome, NotifyError> {
        let outcome = if self.settings.update_async {
            let job_id = self.queue.enqueue(paths.clone()).await?;
            info!(
                target = SOURCE,
                model,
                job_id = %job_id,
                path_count = paths.len(),
                "static regeneration enqueued"
            );
            NotifyOutcome::Enqueued { job_id, paths }
        } else {
            info!(
                target = SOURCE,
                model,
                path_count = paths.len(),
                "static regeneration running inline"
            );
            self.dispatcher.update_paths(paths.clone()).await?;
            NotifyOutcome::Rendered { paths }
        };

        Ok(record(outcome))
    }
}

fn record(outcome: NotifyOutcome) -> NotifyOutcome {
    counter!(METRIC_SAVE_NOTIFICATIONS, "outcome" => outcome.label()).increment(1);
    outcome
}
