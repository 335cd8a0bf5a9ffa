//! Price oracle polling loop
//!
//! Builds every configured price source and logs a weighted price for each
//! on a fixed interval until Ctrl-C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use price_oracle::config::AppConfig;
use price_oracle::oracle::{PriceSource, TracingCollector};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("🚀 Starting price oracle v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    tracing::info!(config = %config, "Configuration loaded");

    let client = reqwest::Client::builder()
        .timeout(config.oracle.request_timeout())
        .build()
        .context("Failed to create HTTP client")?;

    let sources = config.build_price_sources(&client, Arc::new(TracingCollector))?;
    for source in &sources {
        tracing::info!(source = %source.name(), "Registered price source");
    }

    let mut interval = tokio::time::interval(config.oracle.poll_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                poll_round(&sources).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("✅ Price oracle stopped");
    Ok(())
}

async fn poll_round(sources: &[PriceSource]) {
    let results =
        futures_util::future::join_all(sources.iter().map(|s| s.fetch_weighted_price())).await;

    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(weighted) => tracing::info!(
                source = %source.name(),
                price = %weighted.price,
                weight = %weighted.weight,
                "Weighted price"
            ),
            Err(e) => tracing::warn!(
                source = %source.name(),
                error = %e,
                "Price source failed"
            ),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
