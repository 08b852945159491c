//! Consumer side of the ingress path: drains venue queues into the graph.

use crate::graph::PriceGraph;
use crate::queue::TickQueue;
use crate::symbols::{parse_symbol, SymbolIndex};
use common::{EngineError, MarketTick, PerformanceStats, VenueId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sleep between polls when every ingress queue is empty.
const IDLE_POLL: Duration = Duration::from_micros(100);

/// Dequeues ticks, interns their endpoints, and writes log-price edges.
///
/// Exactly one updater exists per engine; it is the sole writer of both the
/// graph and the symbol index.
#[derive(Clone)]
pub struct GraphUpdater {
    queues: Arc<Vec<TickQueue>>,
    graph: Arc<PriceGraph>,
    symbols: Arc<SymbolIndex>,
    stats: Arc<PerformanceStats>,
    epoch: Instant,
    link_cross_venue: bool,
}

impl GraphUpdater {
    pub fn new(
        queues: Arc<Vec<TickQueue>>,
        graph: Arc<PriceGraph>,
        symbols: Arc<SymbolIndex>,
        stats: Arc<PerformanceStats>,
        epoch: Instant,
        link_cross_venue: bool,
    ) -> Self {
        Self {
            queues,
            graph,
            symbols,
            stats,
            epoch,
            link_cross_venue,
        }
    }

    /// One fair round: at most one tick from each venue queue.
    pub fn drain_pass(&self) -> usize {
        let mut drained = 0;
        for queue in self.queues.iter() {
            if let Some(tick) = queue.try_pop() {
                self.apply_tick(&tick);
                drained += 1;
            }
        }
        drained
    }

    /// Drains every queue to empty, returning the number of ticks applied.
    pub fn drain(&self) -> usize {
        let mut total = 0;
        loop {
            let drained = self.drain_pass();
            if drained == 0 {
                return total;
            }
            total += drained;
        }
    }

    /// Main consumer loop; exits when the running flag clears.
    pub async fn run(self, running: Arc<AtomicBool>) {
        info!("graph updater started");
        while running.load(Ordering::Relaxed) {
            if self.drain_pass() == 0 {
                tokio::time::sleep(IDLE_POLL).await;
            }
        }
        info!("graph updater stopped");
    }

    /// Parses one tick and commits its edges.
    ///
    /// Bad symbols and index exhaustion discard the tick; a non-positive
    /// bid or ask skips only the corresponding edge.
    pub fn apply_tick(&self, tick: &MarketTick) {
        let (base, quote) = match parse_symbol(&tick.symbol) {
            Ok(pair) => pair,
            Err(error) => {
                debug!(symbol = %tick.symbol, %error, "discarding tick");
                return;
            }
        };

        let base_id = match self.intern_node(base, tick.venue) {
            Ok(id) => id,
            Err(error) => {
                warn!(symbol = %tick.symbol, %error, "discarding tick");
                return;
            }
        };
        let quote_id = match self.intern_node(quote, tick.venue) {
            Ok(id) => id,
            Err(error) => {
                warn!(symbol = %tick.symbol, %error, "discarding tick");
                return;
            }
        };

        // A pair like "BTC/BTC" would clobber the liveness diagonal.
        if base_id == quote_id {
            debug!(symbol = %tick.symbol, "self-referential pair ignored");
            return;
        }

        // Forward edge: selling base for quote at the bid.
        if tick.bid > 0.0 {
            self.graph.set_weight(base_id, quote_id, -tick.bid.ln());
        }
        // Reverse edge: buying base with quote at the ask; -ln(1/ask) = ln(ask).
        if tick.ask > 0.0 {
            self.graph.set_weight(quote_id, base_id, tick.ask.ln());
        }

        if tick.bid > 0.0 || tick.ask > 0.0 {
            self.stats
                .set_last_update(self.epoch.elapsed().as_micros() as u64);
        }
    }

    fn intern_node(&self, currency: &str, venue: VenueId) -> Result<usize, EngineError> {
        let interned = self.symbols.intern(currency, venue)?;
        if interned.is_new {
            self.graph.mark_live(interned.id);
            if self.link_cross_venue {
                // Same currency elsewhere converts 1:1 in both directions.
                for peer in self.symbols.venue_peers(currency, interned.id) {
                    self.graph.set_weight(interned.id, peer, 0.0);
                    self.graph.set_weight(peer, interned.id, 0.0);
                }
            }
        }
        Ok(interned.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updater(max_nodes: usize, link_cross_venue: bool) -> GraphUpdater {
        GraphUpdater::new(
            Arc::new(Vec::new()),
            Arc::new(PriceGraph::new(max_nodes)),
            Arc::new(SymbolIndex::new(max_nodes)),
            Arc::new(PerformanceStats::new()),
            Instant::now(),
            link_cross_venue,
        )
    }

    fn tick(symbol: &str, bid: f64, ask: f64) -> MarketTick {
        MarketTick::new(VenueId(0), symbol.to_string(), bid, ask, 1.0, 0)
    }

    #[test]
    fn test_edges_are_exact_log_prices() {
        let updater = updater(8, false);
        updater.apply_tick(&tick("BTC/USDT", 2.0, 2.01));

        // BTC interned first, USDT second.
        assert_eq!(updater.graph.weight(0, 1), -(2.0f64).ln());
        assert_eq!(updater.graph.weight(1, 0), (2.01f64).ln());
        assert!(updater.graph.is_live(0));
        assert!(updater.graph.is_live(1));
    }

    #[test]
    fn test_unit_prices_give_zero_weights() {
        let updater = updater(8, false);
        updater.apply_tick(&tick("A/B", 1.0, 1.0));
        assert_eq!(updater.graph.weight(0, 1), 0.0);
        assert_eq!(updater.graph.weight(1, 0), 0.0);
    }

    #[test]
    fn test_applying_same_tick_twice_is_idempotent() {
        let updater = updater(8, false);
        let tick = tick("BTC/USDT", 2.0, 2.01);
        updater.apply_tick(&tick);
        let forward = updater.graph.weight(0, 1);
        let reverse = updater.graph.weight(1, 0);

        updater.apply_tick(&tick);
        assert_eq!(updater.graph.weight(0, 1), forward);
        assert_eq!(updater.graph.weight(1, 0), reverse);
        assert_eq!(updater.symbols.len(), 2);
    }

    #[test]
    fn test_non_positive_sides_skip_only_their_edge() {
        let updater = updater(8, false);
        updater.apply_tick(&tick("A/B", 0.0, 2.01));
        assert!(updater.graph.weight(0, 1).is_infinite());
        assert_eq!(updater.graph.weight(1, 0), (2.01f64).ln());

        updater.apply_tick(&tick("C/D", 2.0, -1.0));
        assert_eq!(updater.graph.weight(2, 3), -(2.0f64).ln());
        assert!(updater.graph.weight(3, 2).is_infinite());
    }

    #[test]
    fn test_bad_symbol_is_discarded() {
        let updater = updater(8, false);
        updater.apply_tick(&tick("BTCUSDT", 2.0, 2.01));
        assert_eq!(updater.symbols.len(), 0);
    }

    #[test]
    fn test_capacity_exhaustion_discards_tick() {
        let updater = updater(2, false);
        updater.apply_tick(&tick("A/B", 2.0, 2.01));
        // Index is full; C cannot be interned and the edge is not written.
        updater.apply_tick(&tick("C/B", 3.0, 3.01));
        assert_eq!(updater.symbols.len(), 2);
        assert!(updater.graph.weight(1, 0).is_finite()); // A/B reverse intact
    }

    #[test]
    fn test_self_referential_pair_preserves_diagonal() {
        let updater = updater(8, false);
        updater.apply_tick(&tick("BTC/BTC", 2.0, 2.01));
        let id = updater.symbols.intern("BTC", VenueId(0)).unwrap().id;
        assert_eq!(updater.graph.weight(id, id), 0.0);
    }

    #[test]
    fn test_cross_venue_links() {
        let updater = updater(8, true);
        updater.apply_tick(&tick("BTC/USDT", 100.0, 100.1));
        let cross = MarketTick::new(VenueId(1), "BTC/USDT".to_string(), 101.0, 101.1, 1.0, 1);
        updater.apply_tick(&cross);

        let btc0 = updater.symbols.intern("BTC", VenueId(0)).unwrap().id;
        let btc1 = updater.symbols.intern("BTC", VenueId(1)).unwrap().id;
        assert_eq!(updater.graph.weight(btc0, btc1), 0.0);
        assert_eq!(updater.graph.weight(btc1, btc0), 0.0);
    }

    #[test]
    fn test_last_update_timestamp_advances() {
        let updater = updater(8, false);
        std::thread::sleep(Duration::from_millis(2));
        updater.apply_tick(&tick("A/B", 2.0, 2.01));
        assert!(updater.stats.last_update_us() > 0);
    }
}
