//! Engine assembly: ingress, workers, and the query surface.

use crate::bellman_ford::{CycleDetector, DetectorParams};
use crate::graph::PriceGraph;
use crate::publisher::{OpportunityPublisher, OpportunitySink};
use crate::queue::TickQueue;
use crate::symbols::SymbolIndex;
use crate::updater::GraphUpdater;
use common::{ArbitrageOpportunity, MarketTick, PerformanceStats, StatsSnapshot, VenueId};
use config_lib::{ConfigError, EngineConfig};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The arbitrage detection core.
///
/// Producers call [`submit`](Self::submit) from one thread per venue;
/// [`start`](Self::start) spawns the updater and detector workers, and
/// [`stop`](Self::stop) winds them down cooperatively. Everything else is
/// read-only observation.
pub struct ArbitrageEngine {
    config: EngineConfig,
    queues: Arc<Vec<TickQueue>>,
    publisher: Arc<OpportunityPublisher>,
    stats: Arc<PerformanceStats>,
    updater: GraphUpdater,
    detector: CycleDetector,
    sequence: AtomicU64,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ArbitrageEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let epoch = Instant::now();
        let graph = Arc::new(PriceGraph::new(config.max_nodes()));
        let symbols = Arc::new(SymbolIndex::new(config.max_nodes()));
        let stats = Arc::new(PerformanceStats::new());
        let queues = Arc::new(
            (0..config.ingress.max_venues)
                .map(|_| TickQueue::with_capacity(config.ingress.queue_capacity))
                .collect::<Vec<_>>(),
        );
        let publisher = Arc::new(OpportunityPublisher::new(
            config.publisher.max_opportunities_per_second,
            config.publisher.history_capacity,
        ));

        let updater = GraphUpdater::new(
            Arc::clone(&queues),
            Arc::clone(&graph),
            Arc::clone(&symbols),
            Arc::clone(&stats),
            epoch,
            config.graph.link_cross_venue,
        );
        let detector = CycleDetector::new(
            graph,
            symbols,
            Arc::clone(&stats),
            DetectorParams {
                min_profit_threshold: config.detector.min_profit_threshold,
                max_position_size: config.detector.max_position_size,
            },
            epoch,
        );

        Ok(Self {
            config,
            queues,
            publisher,
            stats,
            updater,
            detector,
            sequence: AtomicU64::new(0),
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Hot-path ingress. Never blocks; returns `false` when the tick is
    /// dropped (unknown venue or full queue).
    pub fn submit(&self, venue: VenueId, symbol: &str, bid: f64, ask: f64, volume: f64) -> bool {
        let started = Instant::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        let Some(queue) = self.queues.get(venue.0 as usize) else {
            return false;
        };

        let tick = MarketTick::new(venue, symbol.to_string(), bid, ask, volume, sequence);
        if queue.try_push(tick).is_err() {
            return false;
        }

        self.stats.record_message();
        self.stats
            .update_latency(started.elapsed().as_secs_f64() * 1_000_000.0);
        true
    }

    /// Spawns the updater and detector workers. A second call is a no-op.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return; // Already running
        }
        info!(
            max_nodes = self.config.max_nodes(),
            venues = self.config.ingress.max_venues,
            interval_ms = self.config.detector.detection_interval_ms,
            "starting arbitrage engine"
        );

        let mut workers = self.workers.lock().unwrap();

        workers.push(tokio::spawn(
            self.updater.clone().run(Arc::clone(&self.running)),
        ));

        let detector = self.detector.clone();
        let publisher = Arc::clone(&self.publisher);
        let stats = Arc::clone(&self.stats);
        let running = Arc::clone(&self.running);
        let interval = Duration::from_millis(self.config.detector.detection_interval_ms);
        workers.push(tokio::spawn(async move {
            info!("cycle detector started");
            while running.load(Ordering::Relaxed) {
                let started = Instant::now();
                detection_pass(&detector, &publisher, &stats);
                let elapsed = started.elapsed();
                stats.set_detection_latency(elapsed.as_secs_f64() * 1_000_000.0);
                // Fall behind rather than skip work: only sleep off the
                // remainder of the interval.
                if elapsed < interval {
                    tokio::time::sleep(interval - elapsed).await;
                }
            }
            info!("cycle detector stopped");
        }));

        if self.config.metrics.enabled {
            let stats = Arc::clone(&self.stats);
            let running = Arc::clone(&self.running);
            let interval = Duration::from_millis(self.config.metrics.interval_ms);
            workers.push(tokio::spawn(async move {
                let slice = Duration::from_millis(50).min(interval);
                while running.load(Ordering::Relaxed) {
                    let mut slept = Duration::ZERO;
                    while slept < interval && running.load(Ordering::Relaxed) {
                        tokio::time::sleep(slice).await;
                        slept += slice;
                    }
                    if !running.load(Ordering::Relaxed) {
                        break;
                    }
                    let snapshot = stats.snapshot();
                    info!(
                        messages = snapshot.messages_processed,
                        opportunities = snapshot.opportunities_found,
                        false_positives = snapshot.false_positives,
                        avg_latency_us = snapshot.avg_latency_us,
                        detection_latency_us = snapshot.detection_latency_us,
                        "engine stats"
                    );
                }
            }));
        }
    }

    /// Clears the running flag and joins every worker.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().unwrap();
            workers.drain(..).collect()
        };
        for handle in handles {
            if let Err(error) = handle.await {
                error!(%error, "worker terminated abnormally");
            }
        }
        info!("arbitrage engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers an opportunity sink; sinks live for the process.
    pub fn subscribe<S: OpportunitySink + 'static>(&self, sink: S) {
        self.publisher.subscribe(sink);
    }

    /// Up to `limit` most-recent opportunities, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ArbitrageOpportunity> {
        self.publisher.recent(limit)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Synchronously drains all ingress queues into the graph. Intended
    /// for embedders that step the pipeline themselves instead of running
    /// the workers.
    pub fn drain_ingress(&self) -> usize {
        self.updater.drain()
    }

    /// Runs one detection iteration synchronously; returns how many
    /// opportunities were published (post rate cap).
    pub fn detect_once(&self) -> usize {
        detection_pass(&self.detector, &self.publisher, &self.stats)
    }
}

impl Drop for ArbitrageEngine {
    fn drop(&mut self) {
        // Leaked workers observe the cleared flag and exit.
        self.running.store(false, Ordering::SeqCst);
    }
}

fn detection_pass(
    detector: &CycleDetector,
    publisher: &OpportunityPublisher,
    stats: &PerformanceStats,
) -> usize {
    let mut published = 0;
    for opportunity in detector.scan() {
        stats.record_opportunity();
        info!(
            path = %opportunity.path,
            profit_pct = opportunity.profit_percentage * 100.0,
            confidence = opportunity.confidence,
            "arbitrage opportunity"
        );
        if publisher.publish(opportunity) {
            published += 1;
        }
    }
    published
}
