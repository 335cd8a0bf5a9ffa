//! Feed implementations (OKX, NovaDAX) and the contract every feed satisfies

mod novadax;
mod okx;

pub use novadax::{NovadaxFeed, NOVADAX_REST_URL};
pub use okx::{OkxFeed, OKX_REST_URL};

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{OracleError, Result};
use crate::types::{Exchange, Quote, Trade};

/// Market-data feed for a single pair on a single exchange
///
/// Implementations hold no mutable state between calls; retries, timeouts
/// and symbol mapping are their own concern.
#[async_trait]
pub trait Feed: Send + Sync {
    /// Exchange this feed reads from
    fn exchange(&self) -> Exchange;

    /// Exchange-native pair symbol
    fn pair_symbol(&self) -> &str;

    /// Fetch the current quote, parsed into decimals
    async fn fetch_quote(&self) -> Result<Quote>;

    /// Fetch recent trades, ascending by timestamp
    async fn fetch_trades(&self) -> Result<Vec<Trade>> {
        Err(OracleError::Unsupported {
            exchange: self.exchange(),
            operation: "fetch_trades",
        })
    }

    /// Whether the exchange reports the orderbook as live
    async fn is_orderbook_live(&self) -> Result<bool> {
        Ok(true)
    }
}

/// A feed plus whether its native pair must be flipped to fit the chain
#[derive(Clone)]
pub struct OrientedFeed {
    pub feed: Arc<dyn Feed>,
    pub invert: bool,
}

impl OrientedFeed {
    pub fn new(feed: Arc<dyn Feed>, invert: bool) -> Self {
        Self { feed, invert }
    }

    /// `<SOURCE>:<symbol>:<invert>`
    pub fn identity(&self) -> String {
        format!(
            "{}:{}:{}",
            self.feed.exchange(),
            self.feed.pair_symbol(),
            self.invert
        )
    }
}

impl fmt::Debug for OrientedFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrientedFeed")
            .field("exchange", &self.feed.exchange())
            .field("symbol", &self.feed.pair_symbol())
            .field("invert", &self.invert)
            .finish()
    }
}

/// GET `url` and decode the body as JSON, mapping failures to the exchange.
pub(crate) async fn fetch_json(
    client: &reqwest::Client,
    exchange: Exchange,
    url: &str,
) -> Result<Value> {
    tracing::debug!(
        source = %exchange,
        url = %url.split('?').next().unwrap_or(url),
        "Fetching from exchange API"
    );

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| OracleError::Transport { exchange, source })?;

    check_status(exchange, response.status())?;

    response
        .json::<Value>()
        .await
        .map_err(|source| OracleError::Transport { exchange, source })
}

/// Anything outside 2xx is an error, whatever the body says.
fn check_status(exchange: Exchange, status: reqwest::StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(OracleError::HttpStatus { exchange, status })
    }
}
