use thiserror::Error;

/// Failures while bootstrapping Postgres, telemetry or the worker runtime.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("database unavailable: {message}")]
    Database { message: String },
    #[error("job storage could not be prepared")]
    JobStorage(#[source] sqlx::Error),
    #[error("failed to install telemetry: {message}")]
    Telemetry { message: String },
    #[error("infrastructure misconfigured: {message}")]
    Configuration { message: String },
    #[error("failed to wait for the shutdown signal")]
    Signal(#[source] std::io::Error),
}

impl InfraError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry {
            message: message.into(),
        }
    }
}
