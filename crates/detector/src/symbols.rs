//! Symbol parsing and the (currency, venue) → node id index.

use common::{EngineError, VenueId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Longest accepted symbol, in bytes ("BASE/QUOTE").
pub const MAX_SYMBOL_BYTES: usize = 16;

/// Splits a "BASE/QUOTE" symbol at the first slash. Both sides must be
/// non-empty and the whole symbol must fit the wire bound.
pub fn parse_symbol(symbol: &str) -> Result<(&str, &str), EngineError> {
    if symbol.len() > MAX_SYMBOL_BYTES {
        return Err(EngineError::BadSymbol(symbol.to_string()));
    }
    match symbol.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok((base, quote)),
        _ => Err(EngineError::BadSymbol(symbol.to_string())),
    }
}

/// Result of interning a (currency, venue) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned {
    pub id: usize,
    pub is_new: bool,
}

/// Maps (currency, venue) pairs to dense node ids in `[0, V)`.
///
/// Ids are assigned on first observation and never recycled, so a reader
/// that captures `len()` sees a stable prefix: every id below the captured
/// value resolves for the rest of the process. Only the updater task
/// interns; the detector reads names when it renders a path.
pub struct SymbolIndex {
    inner: RwLock<Inner>,
    len: AtomicUsize,
    max_nodes: usize,
}

struct Inner {
    ids: HashMap<(String, VenueId), usize>,
    names: Vec<String>,
}

impl SymbolIndex {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                ids: HashMap::new(),
                names: Vec::new(),
            }),
            len: AtomicUsize::new(0),
            max_nodes,
        }
    }

    /// Returns the id for the pair, assigning the next free one on first
    /// observation. Fails once all `max_nodes` ids are in use.
    pub fn intern(&self, currency: &str, venue: VenueId) -> Result<Interned, EngineError> {
        let mut inner = self.inner.write().unwrap();

        let key = (currency.to_string(), venue);
        if let Some(&id) = inner.ids.get(&key) {
            return Ok(Interned { id, is_new: false });
        }

        if inner.names.len() >= self.max_nodes {
            return Err(EngineError::CapacityExceeded {
                max: self.max_nodes,
            });
        }

        let id = inner.names.len();
        inner.names.push(format!("{}@{}", currency, venue));
        inner.ids.insert(key, id);
        // Publish the extended prefix only after the entry is in place.
        self.len.store(id + 1, Ordering::Release);

        Ok(Interned { id, is_new: true })
    }

    /// Current node count V. Ids in `[0, len)` are stable.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display name for a node, "UNKNOWN" for ids never assigned.
    pub fn name_of(&self, id: usize) -> String {
        self.inner
            .read()
            .unwrap()
            .names
            .get(id)
            .cloned()
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }

    /// Node ids carrying the same currency on any other venue.
    pub fn venue_peers(&self, currency: &str, exclude: usize) -> Vec<usize> {
        let inner = self.inner.read().unwrap();
        inner
            .ids
            .iter()
            .filter(|((peer_currency, _), id)| peer_currency == currency && **id != exclude)
            .map(|(_, id)| *id)
            .collect()
    }
}
