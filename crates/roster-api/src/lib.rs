//! Shared types for the rosterd API
//!
//! This crate defines:
//! - The persisted document model (one JSON file, camelCase keys)
//! - Timer entries and their client-facing projections
//! - Push events broadcast on the in-process update bus

mod document;
mod events;
mod timer;

pub use document::*;
pub use events::*;
pub use timer::*;

/// Current API version
pub const API_VERSION: u32 = 1;
