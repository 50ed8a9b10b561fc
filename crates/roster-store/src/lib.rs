//! Persistence layer for rosterd
//!
//! Provides:
//! - Document validation and repair (total, idempotent)
//! - One-time legacy schema migrations
//! - The cache-backed JSON file store

mod store;
mod validate;

pub use store::*;
pub use validate::*;

use thiserror::Error;

/// Store errors. These stay inside the store boundary: `read` degrades to
/// the default document instead of propagating, and `save` reports failure
/// as a boolean.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
