//! Shared utilities for rosterd
//!
//! This crate provides:
//! - ID types (TimerId)
//! - Time utilities (epoch-millisecond clock, duration clamping)
//! - Error types
//! - Default paths for the data file

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
