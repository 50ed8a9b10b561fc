//! Core services for rosterd
//!
//! Provides:
//! - The countdown timer engine (lazy reconciliation, no per-timer tasks)
//! - Ephemeral interaction state with bounded capacity and expiry

mod selections;
mod timers;

pub use selections::*;
pub use timers::*;
