//! Engine configuration: defaults, YAML persistence, and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time configuration for the arbitrage engine.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ingress: IngressConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngressConfig {
    /// Number of venue slots; each venue owns one SPSC ingress queue.
    pub max_venues: usize,
    /// Per-venue queue capacity. Rounded up to a power of two.
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Maximum distinct currencies per venue; bounds the node count
    /// together with `max_venues`.
    pub max_symbols: usize,
    /// Synthesise zero-weight edges between the same currency on
    /// different venues.
    pub link_cross_venue: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    pub detection_interval_ms: u64,
    /// Minimum cycle profit to emit, e.g. 0.001 = 0.1%.
    pub min_profit_threshold: f64,
    /// Notional cap used for the per-cycle volume estimate.
    pub max_position_size: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublisherConfig {
    pub max_opportunities_per_second: u32,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            max_venues: 16,
            queue_capacity: 65_536,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_symbols: 256,
            link_cross_venue: false,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: 10,
            min_profit_threshold: 0.001,
            max_position_size: 1000.0,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_opportunities_per_second: 100,
            history_capacity: 1000,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
        }
    }
}

impl EngineConfig {
    /// Upper bound on graph nodes: one per (currency, venue) pair.
    pub fn max_nodes(&self) -> usize {
        self.ingress.max_venues * self.graph.max_symbols
    }

    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingress.max_venues == 0 || self.ingress.max_venues > 256 {
            return Err(ConfigError::ValidationError(
                "max_venues must be in 1..=256".to_string(),
            ));
        }

        if self.ingress.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.graph.max_symbols == 0 {
            return Err(ConfigError::ValidationError(
                "max_symbols must be greater than 0".to_string(),
            ));
        }

        if self.max_nodes() < 3 {
            return Err(ConfigError::ValidationError(
                "max_venues * max_symbols must allow at least 3 nodes".to_string(),
            ));
        }

        if self.detector.detection_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "detection_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.detector.min_profit_threshold < 0.0 {
            return Err(ConfigError::ValidationError(
                "min_profit_threshold cannot be negative".to_string(),
            ));
        }

        if self.detector.max_position_size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "max_position_size must be positive".to_string(),
            ));
        }

        if self.publisher.max_opportunities_per_second == 0 {
            return Err(ConfigError::ValidationError(
                "max_opportunities_per_second must be greater than 0".to_string(),
            ));
        }

        if self.publisher.history_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "history_capacity must be greater than 0".to_string(),
            ));
        }

        if self.metrics.enabled && self.metrics.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "metrics.interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ingress.max_venues, 16);
        assert_eq!(config.ingress.queue_capacity, 65_536);
        assert_eq!(config.graph.max_symbols, 256);
        assert!(!config.graph.link_cross_venue);
        assert_eq!(config.detector.detection_interval_ms, 10);
        assert_eq!(config.detector.min_profit_threshold, 0.001);
        assert_eq!(config.detector.max_position_size, 1000.0);
        assert_eq!(config.publisher.max_opportunities_per_second, 100);
        assert_eq!(config.publisher.history_capacity, 1000);
        assert_eq!(config.max_nodes(), 4096);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_save_and_load() {
        let mut config = EngineConfig::default();
        config.ingress.max_venues = 4;
        config.detector.min_profit_threshold = 0.005;
        config.graph.link_cross_venue = true;

        let temp_file = NamedTempFile::new().unwrap();
        config.save(temp_file.path()).unwrap();

        let loaded = EngineConfig::load(temp_file.path()).unwrap();
        assert_eq!(loaded.ingress.max_venues, 4);
        assert_eq!(loaded.detector.min_profit_threshold, 0.005);
        assert!(loaded.graph.link_cross_venue);
        // Untouched sections keep their defaults.
        assert_eq!(loaded.publisher.history_capacity, 1000);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EngineConfig =
            serde_yaml::from_str("detector:\n  detection_interval_ms: 50\n  min_profit_threshold: 0.01\n  max_position_size: 500.0\n").unwrap();
        assert_eq!(config.detector.detection_interval_ms, 50);
        assert_eq!(config.ingress.max_venues, 16);
        assert_eq!(config.publisher.max_opportunities_per_second, 100);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.validate().unwrap();

        config.ingress.max_venues = 0;
        assert!(config.validate().is_err());

        config = EngineConfig::default();
        config.ingress.queue_capacity = 0;
        assert!(config.validate().is_err());

        config = EngineConfig::default();
        config.detector.detection_interval_ms = 0;
        assert!(config.validate().is_err());

        config = EngineConfig::default();
        config.detector.min_profit_threshold = -0.1;
        assert!(config.validate().is_err());

        config = EngineConfig::default();
        config.detector.max_position_size = 0.0;
        assert!(config.validate().is_err());

        config = EngineConfig::default();
        config.ingress.max_venues = 1;
        config.graph.max_symbols = 2;
        assert!(config.validate().is_err()); // fewer than 3 nodes
    }
}
