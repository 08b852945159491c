use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide performance counters for the detection pipeline.
///
/// Written with relaxed atomics from the ingress path, the updater, and the
/// detector; read by operators. Readers take each field once; cross-field
/// skew of a few nanoseconds is acceptable, and the latency estimates are
/// approximate by construction (the EWMA read-modify-write is not atomic
/// under contention, which is tolerated).
#[derive(Debug, Default)]
pub struct PerformanceStats {
    messages_processed: AtomicU64,
    opportunities_found: AtomicU64,
    false_positives: AtomicU64,
    /// EWMA of ingress latency, stored as `f64` bits.
    avg_latency_us: AtomicU64,
    /// Duration of the most recent detection iteration, stored as `f64` bits.
    detection_latency_us: AtomicU64,
    /// Microseconds since the engine epoch at the last graph write.
    last_update_us: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub messages_processed: u64,
    pub opportunities_found: u64,
    pub false_positives: u64,
    pub avg_latency_us: f64,
    pub detection_latency_us: f64,
    pub last_update_us: u64,
}

impl PerformanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_opportunity(&self) {
        self.opportunities_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_false_positive(&self) {
        self.false_positives.fetch_add(1, Ordering::Relaxed);
    }

    /// Folds one latency sample into the moving average:
    /// `avg <- 0.9 * avg + 0.1 * sample`.
    pub fn update_latency(&self, sample_us: f64) {
        let current = f64::from_bits(self.avg_latency_us.load(Ordering::Relaxed));
        let next = 0.9 * current + 0.1 * sample_us;
        self.avg_latency_us.store(next.to_bits(), Ordering::Relaxed);
    }

    pub fn set_detection_latency(&self, latency_us: f64) {
        self.detection_latency_us
            .store(latency_us.to_bits(), Ordering::Relaxed);
    }

    pub fn set_last_update(&self, micros_since_epoch: u64) {
        self.last_update_us
            .store(micros_since_epoch, Ordering::Relaxed);
    }

    pub fn last_update_us(&self) -> u64 {
        self.last_update_us.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            opportunities_found: self.opportunities_found.load(Ordering::Relaxed),
            false_positives: self.false_positives.load(Ordering::Relaxed),
            avg_latency_us: f64::from_bits(self.avg_latency_us.load(Ordering::Relaxed)),
            detection_latency_us: f64::from_bits(self.detection_latency_us.load(Ordering::Relaxed)),
            last_update_us: self.last_update_us.load(Ordering::Relaxed),
        }
    }
}
