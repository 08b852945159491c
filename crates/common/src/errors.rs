use thiserror::Error;

/// Typed errors raised inside the detection core.
///
/// A full ingress queue is not an error value: `submit` reports it as a
/// `false` return. A failing subscriber sink surfaces as an `anyhow::Error`
/// from the sink itself and is logged by the publisher.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The symbol could not be parsed into a BASE/QUOTE pair.
    #[error("bad symbol: {0:?}")]
    BadSymbol(String),

    /// The node index is full; no id can be assigned for a new
    /// (currency, venue) pair.
    #[error("node capacity exceeded: all {max} node ids in use")]
    CapacityExceeded { max: usize },
}
