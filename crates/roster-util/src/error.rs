//! Error types for rosterd

use thiserror::Error;

use crate::TimerId;

/// Core error type for rosterd operations
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Timer not found: {0}")]
    TimerNotFound(TimerId),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RosterError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
