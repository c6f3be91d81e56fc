//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod disk;
pub mod error;
pub mod queue;
pub mod telemetry;
