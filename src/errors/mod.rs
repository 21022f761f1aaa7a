use thiserror::Error;

pub mod response;
pub mod automation;

// Re-export commonly used types
pub use automation::{AutomationError, AutomationResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Automation error: {0}")]
    Automation(#[from] AutomationError),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
