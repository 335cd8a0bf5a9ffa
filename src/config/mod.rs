//! Configuration management for the price oracle
//!
//! Loads from TOML/YAML files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::oracle::sources::{NovadaxFeed, OkxFeed, NOVADAX_REST_URL, OKX_REST_URL};
use crate::oracle::{Feed, OrientedFeed, PriceSource, QuoteCollector};
use crate::types::Exchange;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    /// Price sources to poll, each an ordered chain of feeds
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Interval between aggregation rounds in milliseconds
    pub poll_interval_ms: u64,
    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,
    /// OKX REST base URL
    pub okx_url: String,
    /// NovaDAX REST base URL
    pub novadax_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Feeds in hop order (A/B, B/C, ...)
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub exchange: Exchange,
    /// Exchange-native base currency symbol
    pub base: String,
    /// Exchange-native quote currency symbol
    pub quote: String,
    /// Flip the pair to fit the chain's direction
    #[serde(default)]
    pub invert: bool,
}

impl OracleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults(Config::builder())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PRICE_ORACLE_*)
            .add_source(Environment::with_prefix("PRICE_ORACLE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("oracle.poll_interval_ms", 10_000)?
            .set_default("oracle.request_timeout_ms", 5_000)?
            .set_default("oracle.okx_url", OKX_REST_URL)?
            .set_default("oracle.novadax_url", NOVADAX_REST_URL)?)
    }

    /// Reject configurations that cannot produce a price
    pub fn validate(&self) -> Result<()> {
        if self.oracle.poll_interval_ms == 0 {
            bail!("oracle.poll_interval_ms must be greater than zero");
        }
        if self.oracle.request_timeout_ms == 0 {
            bail!("oracle.request_timeout_ms must be greater than zero");
        }
        if self.sources.is_empty() {
            bail!("At least one price source must be configured");
        }

        for (i, source) in self.sources.iter().enumerate() {
            if source.feeds.is_empty() {
                bail!("Price source #{} has no feeds", i);
            }
            for feed in &source.feeds {
                if !matches!(feed.exchange, Exchange::Okx | Exchange::Novadax) {
                    bail!("No adapter available for exchange {}", feed.exchange);
                }
                if feed.base.trim().is_empty() || feed.quote.trim().is_empty() {
                    bail!("Price source #{} has a feed without base/quote", i);
                }
            }
        }

        Ok(())
    }

    /// Build one price source per configured chain
    pub fn build_price_sources(
        &self,
        client: &reqwest::Client,
        collector: Arc<dyn QuoteCollector>,
    ) -> Result<Vec<PriceSource>> {
        self.sources
            .iter()
            .map(|source| {
                let feeds = source
                    .feeds
                    .iter()
                    .map(|feed| Ok(OrientedFeed::new(self.build_feed(client, feed)?, feed.invert)))
                    .collect::<Result<Vec<_>>>()?;
                PriceSource::new(feeds, collector.clone()).context("Failed to build price source")
            })
            .collect()
    }

    fn build_feed(&self, client: &reqwest::Client, feed: &FeedConfig) -> Result<Arc<dyn Feed>> {
        let built: Arc<dyn Feed> = match feed.exchange {
            Exchange::Okx => Arc::new(OkxFeed::new(
                client.clone(),
                &self.oracle.okx_url,
                &feed.base,
                &feed.quote,
            )),
            Exchange::Novadax => Arc::new(NovadaxFeed::new(
                client.clone(),
                &self.oracle.novadax_url,
                &feed.base,
                &feed.quote,
            )),
            other => bail!("No adapter available for exchange {}", other),
        };
        Ok(built)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        let chains: Vec<String> = self
            .sources
            .iter()
            .map(|s| {
                s.feeds
                    .iter()
                    .map(|f| {
                        let flag = if f.invert { "~" } else { "" };
                        format!("{}{}:{}/{}", flag, f.exchange, f.base, f.quote)
                    })
                    .collect::<Vec<_>>()
                    .join(">")
            })
            .collect();
        format!(
            "poll_ms={} timeout_ms={} sources={:?}",
            self.oracle.poll_interval_ms, self.oracle.request_timeout_ms, chains
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
