//! Market-tick ingress, the log-price graph, and negative-cycle search.
//!
//! The pipeline: venue producers push ticks into per-venue SPSC queues;
//! the graph updater drains them into a dense matrix of negated log
//! prices; the cycle detector runs Bellman-Ford over the matrix on a
//! fixed cadence and hands profitable cycles to the rate-limited
//! publisher.

pub mod bellman_ford;
pub mod engine;
pub mod graph;
pub mod prelude;
pub mod publisher;
pub mod queue;
pub mod symbols;
pub mod updater;

pub use engine::ArbitrageEngine;
pub use publisher::{OpportunityPublisher, OpportunitySink};
