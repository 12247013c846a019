use reactorsim_config::ConfigError;
use reactorsim_core::{LayoutError, ReactorError};
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Reactor(#[from] ReactorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation worker failed: {0}")]
    Worker(String),

    #[error("Simulation runtime is shutting down")]
    Closed,
}

impl From<JoinError> for RuntimeError {
    fn from(err: JoinError) -> Self {
        RuntimeError::Worker(err.to_string())
    }
}

impl From<AcquireError> for RuntimeError {
    fn from(_: AcquireError) -> Self {
        RuntimeError::Closed
    }
}
