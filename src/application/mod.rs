//! Application services: save notifications, render dispatch and job wiring.

pub mod dispatcher;
pub mod error;
pub mod jobs;
pub mod notifier;
pub mod renderable;
pub mod renderer;
