//! Rate-limited fan-out of detected opportunities.

use anyhow::Result;
use common::ArbitrageOpportunity;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// Receives published opportunities. Sinks live for the process; there is
/// no unsubscribe.
pub trait OpportunitySink: Send + Sync {
    fn deliver(&self, opportunity: &ArbitrageOpportunity) -> Result<()>;
}

impl<F> OpportunitySink for F
where
    F: Fn(&ArbitrageOpportunity) -> Result<()> + Send + Sync,
{
    fn deliver(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        self(opportunity)
    }
}

/// Applies the per-second emission cap, retains a bounded history, and
/// delivers to every registered sink. A failing sink is logged and never
/// blocks delivery to the others.
pub struct OpportunityPublisher {
    max_per_second: u32,
    history_capacity: usize,
    state: Mutex<PublishState>,
    sinks: Mutex<Vec<Box<dyn OpportunitySink>>>,
}

struct PublishState {
    history: VecDeque<ArbitrageOpportunity>,
    window_start: Instant,
    published_in_window: u32,
}

impl OpportunityPublisher {
    pub fn new(max_per_second: u32, history_capacity: usize) -> Self {
        Self {
            max_per_second,
            history_capacity,
            state: Mutex::new(PublishState {
                history: VecDeque::with_capacity(history_capacity),
                window_start: Instant::now(),
                published_in_window: 0,
            }),
            sinks: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<S: OpportunitySink + 'static>(&self, sink: S) {
        self.sinks.lock().unwrap().push(Box::new(sink));
    }

    /// Publishes one opportunity. Returns `false` when the per-second cap
    /// drops it; the drop is silent apart from the return value.
    pub fn publish(&self, opportunity: ArbitrageOpportunity) -> bool {
        {
            let mut state = self.state.lock().unwrap();

            if state.window_start.elapsed() >= Duration::from_secs(1) {
                state.window_start = Instant::now();
                state.published_in_window = 0;
            }
            if state.published_in_window >= self.max_per_second {
                return false;
            }
            state.published_in_window += 1;

            if state.history.len() == self.history_capacity {
                state.history.pop_front();
            }
            state.history.push_back(opportunity.clone());
        }

        let sinks = self.sinks.lock().unwrap();
        for sink in sinks.iter() {
            if let Err(error) = sink.deliver(&opportunity) {
                warn!(%error, path = %opportunity.path, "opportunity sink failed");
            }
        }
        true
    }

    /// Up to `limit` most-recent opportunities, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ArbitrageOpportunity> {
        let state = self.state.lock().unwrap();
        let skip = state.history.len().saturating_sub(limit);
        state.history.iter().skip(skip).cloned().collect()
    }
}
