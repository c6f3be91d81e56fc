//! Static-site regeneration driven by model saves.
//!
//! Models implement [`application::renderable::Renderable`] and are
//! subscribed on an [`application::notifier::ChangeNotifier`]. Each save then
//! regenerates the affected paths inline or through the Postgres-backed job
//! queue, as configured.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
