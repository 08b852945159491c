use std::fmt;
use std::time::Instant;

/// Identifies a trading venue. Venues are a small, dense enumeration
/// assigned by the embedding process; the engine only requires that ids
/// stay below the configured `max_venues`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VenueId(pub u8);

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for VenueId {
    fn from(id: u8) -> Self {
        VenueId(id)
    }
}

/// A best-bid/best-ask snapshot for one symbol at one venue at one instant.
///
/// Ticks are immutable once constructed. The sequence number is assigned at
/// ingress and is strictly increasing for the process lifetime, including
/// ticks that are subsequently dropped by a full queue.
#[derive(Debug, Clone)]
pub struct MarketTick {
    pub venue: VenueId,
    /// Pair in "BASE/QUOTE" form, at most 16 bytes.
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    /// Mid price, `(bid + ask) / 2`.
    pub last_price: f64,
    pub volume: f64,
    pub sequence: u64,
    pub timestamp: Instant,
}

impl MarketTick {
    pub fn new(
        venue: VenueId,
        symbol: String,
        bid: f64,
        ask: f64,
        volume: f64,
        sequence: u64,
    ) -> Self {
        Self {
            venue,
            symbol,
            bid,
            ask,
            last_price: (bid + ask) / 2.0,
            volume,
            sequence,
            timestamp: Instant::now(),
        }
    }
}

/// A detected arbitrage cycle.
///
/// `cycle` holds the node indices in trade order, rotated so that the lowest
/// index comes first; `path` is the same cycle rendered with node names for
/// humans. The product of edge ratios around the cycle equals
/// `1 + profit_percentage`.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub cycle: Vec<usize>,
    pub path: String,
    /// Cycle product minus one, e.g. 0.02 for a 2% round trip.
    pub profit_percentage: f64,
    /// Estimated executable volume for the whole cycle.
    pub max_volume: f64,
    /// Reliability score in [0, 100].
    pub confidence: u32,
    pub detected_at: Instant,
}

impl ArbitrageOpportunity {
    /// Whether the opportunity clears the given profit threshold.
    pub fn is_profitable(&self, min_profit: f64) -> bool {
        self.profit_percentage > min_profit
    }
}

impl fmt::Display for ArbitrageOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.4}%, confidence {})",
            self.path,
            self.profit_percentage * 100.0,
            self.confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_id_display() {
        assert_eq!(format!("{}", VenueId(3)), "3");
        assert_eq!(VenueId::from(7), VenueId(7));
    }

    #[test]
    fn test_tick_mid_price() {
        let tick = MarketTick::new(VenueId(0), "BTC/USDT".to_string(), 100.0, 102.0, 1.5, 42);
        assert_eq!(tick.last_price, 101.0);
        assert_eq!(tick.sequence, 42);
        assert_eq!(tick.venue, VenueId(0));
    }

    #[test]
    fn test_opportunity_profitability() {
        let opp = ArbitrageOpportunity {
            cycle: vec![0, 1, 2],
            path: "BTC@0 -> ETH@0 -> USDT@0".to_string(),
            profit_percentage: 0.02,
            max_volume: 333.0,
            confidence: 70,
            detected_at: Instant::now(),
        };
        assert!(opp.is_profitable(0.001));
        assert!(!opp.is_profitable(0.05));
    }

    #[test]
    fn test_opportunity_display() {
        let opp = ArbitrageOpportunity {
            cycle: vec![0, 1, 2],
            path: "A@0 -> B@0 -> C@0".to_string(),
            profit_percentage: 0.02,
            max_volume: 333.0,
            confidence: 70,
            detected_at: Instant::now(),
        };
        let rendered = format!("{}", opp);
        assert!(rendered.contains("A@0 -> B@0 -> C@0"));
        assert!(rendered.contains("confidence 70"));
    }
}
