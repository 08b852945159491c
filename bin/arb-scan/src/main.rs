//! Demo runtime that embeds the detection engine and feeds it a
//! synthetic mispriced triangle.

use common::VenueId;
use config_lib::EngineConfig;
use detector::ArbitrageEngine;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = EngineConfig::default();
    config.ingress.max_venues = 2;
    config.graph.max_symbols = 16;

    let engine = ArbitrageEngine::new(config)?;
    engine.start().await;

    // 15 * 2000 * 0.0000345 = 1.035: a 3.5% round trip on venue 0.
    engine.submit(VenueId(0), "BTC/ETH", 15.0, 15.01, 2.0);
    engine.submit(VenueId(0), "ETH/USDT", 2000.0, 2000.5, 10.0);
    engine.submit(VenueId(0), "USDT/BTC", 0.0000345, 0.0000346, 50_000.0);

    tokio::time::sleep(Duration::from_millis(200)).await;

    for opportunity in engine.recent(10) {
        info!(%opportunity, "detected");
    }
    let stats = engine.stats();
    info!(
        messages = stats.messages_processed,
        opportunities = stats.opportunities_found,
        avg_latency_us = stats.avg_latency_us,
        "final stats"
    );

    engine.stop().await;
    Ok(())
}
