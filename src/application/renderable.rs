//! Opt-in capability for models whose saves affect static output.

use crate::domain::{error::DomainError, paths::StaticPath};

/// A model type that can name the static paths a save invalidates.
///
/// Register implementors with
/// [`ChangeNotifier::subscribe`](crate::application::notifier::ChangeNotifier::subscribe)
/// at startup; saves of any other type are ignored by the notifier.
pub trait Renderable {
    /// Paths that must be regenerated after this instance was saved.
    fn render_static(&self) -> Result<Vec<StaticPath>, DomainError>;

    /// Label used in logs.
    fn model_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Paths supplied directly by an operator rather than derived from a model.
#[derive(Debug, Clone, Default)]
pub struct ManualUpdate {
    paths: Vec<StaticPath>,
}

impl ManualUpdate {
    pub fn new(paths: Vec<StaticPath>) -> Self {
        Self { paths }
    }
}

impl Renderable for ManualUpdate {
    fn render_static(&self) -> Result<Vec<StaticPath>, DomainError> {
        Ok(self.paths.clone())
    }

    fn model_name(&self) -> &'static str {
        "manual_update"
    }
}
