//! Prelude for the detector crate.

// Re-export commonly used types and traits from this crate.
pub use crate::bellman_ford::{CycleDetector, DetectorParams};
pub use crate::engine::ArbitrageEngine;
pub use crate::graph::PriceGraph;
pub use crate::publisher::{OpportunityPublisher, OpportunitySink};
pub use crate::queue::TickQueue;
pub use crate::symbols::{parse_symbol, SymbolIndex};

// Re-export relevant items from the workspace crates.
pub use common::{
    ArbitrageOpportunity, EngineError, MarketTick, PerformanceStats, StatsSnapshot, VenueId,
};
pub use config_lib::EngineConfig;
