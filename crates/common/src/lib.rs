//! # Arb Scan Common Crate
//!
//! This crate provides common data types, error definitions, and the
//! performance counters used across the `arb-scan` workspace.

/// Module for common error types.
pub mod errors;

/// Module for atomic performance statistics.
pub mod stats;

/// Module for common data structures and types.
pub mod types;

// Re-export key items for easier access.
pub use errors::EngineError;
pub use stats::{PerformanceStats, StatsSnapshot};
pub use types::{ArbitrageOpportunity, MarketTick, VenueId};
