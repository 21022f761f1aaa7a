use std::time::Duration;
use thiserror::Error;
use redis::RedisError;

#[derive(Error, Debug)]
pub enum AutomationError {
    // Backends report their own message; it is recorded on the task verbatim
    #[error("{0}")]
    Backend(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Task timed out after {0:?}")]
    Timeout(Duration),

    #[error("Task panicked: {0}")]
    TaskPanic(String),

    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AutomationError {
    pub fn backend(msg: impl Into<String>) -> Self {
        AutomationError::Backend(msg.into())
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;
