//! Negative-cycle search over the log-price graph.

use crate::graph::PriceGraph;
use crate::symbols::SymbolIndex;
use common::{ArbitrageOpportunity, PerformanceStats};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Detection thresholds, taken from configuration at construction.
#[derive(Debug, Clone)]
pub struct DetectorParams {
    /// Minimum cycle profit to emit, e.g. 0.001 = 0.1%.
    pub min_profit_threshold: f64,
    /// Notional cap spread across the cycle for the volume estimate.
    pub max_position_size: f64,
}

/// Runs Bellman-Ford from every live node and extracts profitable cycles.
///
/// The detector only reads: the graph through relaxed atomic loads, the
/// node count as a captured prefix, and names for path rendering. An edge
/// updated mid-iteration is tolerated; the scan reruns every interval.
#[derive(Clone)]
pub struct CycleDetector {
    graph: Arc<PriceGraph>,
    symbols: Arc<SymbolIndex>,
    stats: Arc<PerformanceStats>,
    params: DetectorParams,
    epoch: Instant,
}

impl CycleDetector {
    pub fn new(
        graph: Arc<PriceGraph>,
        symbols: Arc<SymbolIndex>,
        stats: Arc<PerformanceStats>,
        params: DetectorParams,
        epoch: Instant,
    ) -> Self {
        Self {
            graph,
            symbols,
            stats,
            params,
            epoch,
        }
    }

    /// One full detection iteration.
    ///
    /// 1. Capture V and treat `[0, V)` as the node set.
    /// 2. For each live source, run a single-source Bellman-Ford with
    ///    freshly initialised `dist`/`parent` arrays.
    /// 3. Scan all edges for a remaining relaxation; each hit proves a
    ///    reachable negative cycle, which is extracted and deduplicated.
    ///
    /// Overlapping cycles tie-break by source order: the lowest source
    /// index claims the canonical form first.
    pub fn scan(&self) -> Vec<ArbitrageOpportunity> {
        let node_count = self.symbols.len().min(self.graph.max_nodes());
        if node_count < 3 {
            return Vec::new();
        }

        let mut dist = vec![f64::INFINITY; node_count];
        let mut parent: Vec<Option<usize>> = vec![None; node_count];
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut found = Vec::new();

        for source in 0..node_count {
            if !self.graph.is_live(source) {
                continue;
            }

            dist.fill(f64::INFINITY);
            parent.fill(None);
            dist[source] = 0.0;

            // Relax all edges up to V-1 times; stop early on a fixed point.
            for _ in 1..node_count {
                let mut updated = false;
                for from in 0..node_count {
                    if dist[from].is_infinite() {
                        continue;
                    }
                    for to in 0..node_count {
                        let weight = self.graph.weight(from, to);
                        if weight.is_infinite() {
                            continue;
                        }
                        let candidate = dist[from] + weight;
                        if candidate < dist[to] {
                            dist[to] = candidate;
                            parent[to] = Some(from);
                            updated = true;
                        }
                    }
                }
                if !updated {
                    break;
                }
            }

            // Any edge that still relaxes proves a reachable negative cycle.
            for from in 0..node_count {
                if dist[from].is_infinite() {
                    continue;
                }
                for to in 0..node_count {
                    let weight = self.graph.weight(from, to);
                    if weight.is_infinite() {
                        continue;
                    }
                    if dist[from] + weight < dist[to] {
                        if let Some(opportunity) = self.extract_cycle(to, &parent, &mut seen) {
                            found.push(opportunity);
                        }
                    }
                }
            }
        }

        found
    }

    /// Walks `parent` back from `start` until a node repeats, recovers the
    /// cycle, and turns it into an opportunity if it survives validation.
    fn extract_cycle(
        &self,
        start: usize,
        parent: &[Option<usize>],
        seen: &mut HashSet<Vec<usize>>,
    ) -> Option<ArbitrageOpportunity> {
        let mut visited = HashSet::new();
        let mut walk = Vec::new();
        let mut node = start;
        while visited.insert(node) {
            walk.push(node);
            node = parent[node]?;
        }

        // `node` is the first repeat: the cycle's entry point.
        let entry = walk.iter().position(|&candidate| candidate == node)?;
        let mut cycle = walk[entry..].to_vec();
        // Parent pointers run against the trade direction.
        cycle.reverse();

        if cycle.len() < 3 {
            return None;
        }

        // Canonical form: lowest node id first, so the same cycle reached
        // from different sources deduplicates.
        let lowest = cycle
            .iter()
            .enumerate()
            .min_by_key(|&(_, &node)| node)
            .map(|(position, _)| position)
            .unwrap_or(0);
        cycle.rotate_left(lowest);
        if !seen.insert(cycle.clone()) {
            return None;
        }

        // Recompute from the live graph before anything is published.
        let mut total = 0.0;
        for position in 0..cycle.len() {
            let weight = self
                .graph
                .weight(cycle[position], cycle[(position + 1) % cycle.len()]);
            if weight.is_infinite() {
                return None;
            }
            total += weight;
        }

        let profit = (-total).exp() - 1.0;
        if profit <= 0.0 {
            self.stats.record_false_positive();
            return None;
        }
        if profit <= self.params.min_profit_threshold {
            return None;
        }

        let confidence = self.confidence(total, cycle.len());
        let max_volume = self.params.max_position_size / cycle.len() as f64;
        let path = cycle
            .iter()
            .map(|&node| self.symbols.name_of(node))
            .collect::<Vec<_>>()
            .join(" -> ");

        Some(ArbitrageOpportunity {
            cycle,
            path,
            profit_percentage: profit,
            max_volume,
            confidence,
            detected_at: Instant::now(),
        })
    }

    /// Score in [0, 100] from profit magnitude, path length, and data age.
    /// The terms can exceed 100 together and are clipped.
    fn confidence(&self, total_log_return: f64, path_len: usize) -> u32 {
        let profit_term = (total_log_return.abs() * 100.0).min(50.0);
        let length_term = (50.0 - 10.0 * path_len as f64).max(0.0);

        let age_us = (self.epoch.elapsed().as_micros() as u64)
            .saturating_sub(self.stats.last_update_us());
        let age_ms = age_us as f64 / 1000.0;
        let freshness_term = (50.0 - age_ms / 100.0).max(0.0);

        ((profit_term + length_term + freshness_term).round() as u32).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::GraphUpdater;
    use common::{MarketTick, VenueId};

    struct Fixture {
        updater: GraphUpdater,
        detector: CycleDetector,
        stats: Arc<PerformanceStats>,
    }

    fn fixture(max_nodes: usize, min_profit_threshold: f64) -> Fixture {
        let graph = Arc::new(PriceGraph::new(max_nodes));
        let symbols = Arc::new(SymbolIndex::new(max_nodes));
        let stats = Arc::new(PerformanceStats::new());
        let epoch = Instant::now();

        let updater = GraphUpdater::new(
            Arc::new(Vec::new()),
            Arc::clone(&graph),
            Arc::clone(&symbols),
            Arc::clone(&stats),
            epoch,
            false,
        );
        let detector = CycleDetector::new(
            graph,
            symbols,
            Arc::clone(&stats),
            DetectorParams {
                min_profit_threshold,
                max_position_size: 1000.0,
            },
            epoch,
        );

        Fixture {
            updater,
            detector,
            stats,
        }
    }

    fn feed(fixture: &Fixture, symbol: &str, bid: f64, ask: f64) {
        let tick = MarketTick::new(VenueId(0), symbol.to_string(), bid, ask, 1.0, 0);
        fixture.updater.apply_tick(&tick);
    }

    fn feed_triangle(fixture: &Fixture, bid_ca: f64, ask_ca: f64) {
        feed(fixture, "A/B", 2.0, 2.01);
        feed(fixture, "B/C", 3.0, 3.01);
        feed(fixture, "C/A", bid_ca, ask_ca);
    }

    #[test]
    fn test_empty_graph_emits_nothing() {
        let fixture = fixture(8, 0.001);
        assert!(fixture.detector.scan().is_empty());
    }

    #[test]
    fn test_triangle_arbitrage_found_once() {
        let fixture = fixture(8, 0.001);
        // 2.0 * 3.0 * 0.17 = 1.02: a 2% round trip.
        feed_triangle(&fixture, 0.17, 0.1705);

        let found = fixture.detector.scan();
        assert_eq!(found.len(), 1);

        let opportunity = &found[0];
        assert!((opportunity.profit_percentage - 0.02).abs() < 1e-9);
        assert_eq!(opportunity.cycle.len(), 3);
        // Canonical rotation starts at node 0 (A@0).
        assert_eq!(opportunity.cycle[0], 0);
        assert_eq!(opportunity.path, "A@0 -> B@0 -> C@0");
        assert_eq!(opportunity.max_volume, 1000.0 / 3.0);
        assert!(opportunity.confidence >= 60 && opportunity.confidence <= 100);
        assert!(opportunity.is_profitable(0.001));
    }

    #[test]
    fn test_cycle_product_matches_profit() {
        let fixture = fixture(8, 0.001);
        feed_triangle(&fixture, 0.17, 0.1705);

        let found = fixture.detector.scan();
        let product = 2.0 * 3.0 * 0.17;
        assert!((product - (1.0 + found[0].profit_percentage)).abs() < 1e-9);
    }

    #[test]
    fn test_profit_below_threshold_not_emitted() {
        let fixture = fixture(8, 0.001);
        // 2.0 * 3.0 * 0.1667 = 1.0002: positive but under the 0.1% floor.
        feed_triangle(&fixture, 0.1667, 0.1670);

        assert!(fixture.detector.scan().is_empty());
        // A real (if small) cycle is not a false positive.
        assert_eq!(fixture.stats.snapshot().false_positives, 0);
    }

    #[test]
    fn test_no_arbitrage_no_emission() {
        let fixture = fixture(8, 0.001);
        feed(&fixture, "A/B", 2.0, 2.01);
        feed(&fixture, "B/C", 3.0, 3.01);
        // Bid round trip 2 * 3 * 0.16 = 0.96 < 1, and the ask chain
        // 2.01 * 3.01 * 0.1705 > 1 keeps the reverse direction losing too.
        feed(&fixture, "C/A", 0.16, 0.1705);

        assert!(fixture.detector.scan().is_empty());
    }

    #[test]
    fn test_two_node_cycles_rejected() {
        let fixture = fixture(8, 0.001);
        // Crossed book: bid above ask makes A->B->A a negative 2-cycle.
        feed(&fixture, "A/B", 2.0, 1.9);
        // Unrelated nodes so the scan actually runs (V >= 3).
        feed(&fixture, "X/Y", 1.0, 1.01);

        assert!(fixture.detector.scan().is_empty());
        assert_eq!(fixture.stats.snapshot().false_positives, 0);
    }

    #[test]
    fn test_disjoint_triangles_all_found() {
        let fixture = fixture(16, 0.001);
        feed(&fixture, "A/B", 2.0, 2.01);
        feed(&fixture, "B/C", 3.0, 3.01);
        feed(&fixture, "C/A", 0.17, 0.1705);
        feed(&fixture, "D/E", 2.0, 2.01);
        feed(&fixture, "E/F", 3.0, 3.01);
        feed(&fixture, "F/D", 0.17, 0.1705);

        let found = fixture.detector.scan();
        assert_eq!(found.len(), 2);
        let cycles: HashSet<Vec<usize>> =
            found.iter().map(|opportunity| opportunity.cycle.clone()).collect();
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn test_confidence_is_clipped() {
        let fixture = fixture(8, 0.001);
        // Huge mispricing: 10 * 10 * 10 = 1000x round trip.
        feed(&fixture, "A/B", 10.0, 10.01);
        feed(&fixture, "B/C", 10.0, 10.01);
        feed(&fixture, "C/A", 10.0, 10.01);

        let found = fixture.detector.scan();
        assert_eq!(found.len(), 1);
        // 50 (profit, capped) + 20 (length) + ~50 (freshness), clipped.
        assert_eq!(found[0].confidence, 100);
    }
}
