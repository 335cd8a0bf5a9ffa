//! OKX REST ticker client
//!
//! Reads the v5 spot ticker for a single instrument.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{OracleError, Result};
use crate::oracle::sources::{fetch_json, Feed};
use crate::oracle::validation::{parse_decimal, parse_timestamp, require, validate_quote};
use crate::types::{Exchange, Quote};

pub const OKX_REST_URL: &str = "https://www.okx.com/api/v5";

#[derive(Debug, Clone)]
pub struct OkxFeed {
    client: reqwest::Client,
    base_url: String,
    pair_symbol: String,
}

impl OkxFeed {
    pub fn new(client: reqwest::Client, base_url: &str, base: &str, quote: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pair_symbol: Self::build_pair_symbol(base, quote),
        }
    }

    /// OKX instrument ids look like `CELO-USDT`
    fn build_pair_symbol(base: &str, quote: &str) -> String {
        format!("{}-{}", base.to_uppercase(), quote.to_uppercase())
    }

    fn ticker_url(&self) -> String {
        format!("{}/market/ticker?instId={}", self.base_url, self.pair_symbol)
    }

    /// Parse a ticker response:
    ///
    /// ```text
    /// {"code":"0","msg":"","data":[{"instId":"CELO-USDT","last":"0.792",
    ///   "askPx":"0.793","bidPx":"0.792","volCcy24h":"1642445.37682",
    ///   "vol24h":"2177089.719932","ts":"1674479195109", ...}]}
    /// ```
    pub fn parse_ticker(&self, json: &Value) -> Result<Quote> {
        let data = json["data"]
            .get(0)
            .ok_or_else(|| OracleError::Parse("OKX ticker response has no data".to_string()))?;

        let quote = Quote {
            bid: require("bidPx", parse_decimal(&data["bidPx"]))?,
            ask: require("askPx", parse_decimal(&data["askPx"]))?,
            last_price: require("last", parse_decimal(&data["last"]))?,
            base_volume: require("vol24h", parse_decimal(&data["vol24h"]))?,
            quote_volume: require("volCcy24h", parse_decimal(&data["volCcy24h"]))?,
            timestamp: require("ts", parse_timestamp(&data["ts"]))?,
            source: Exchange::Okx,
            symbol: self.pair_symbol.clone(),
        };
        validate_quote(&quote)?;
        Ok(quote)
    }
}

#[async_trait]
impl Feed for OkxFeed {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    fn pair_symbol(&self) -> &str {
        &self.pair_symbol
    }

    async fn fetch_quote(&self) -> Result<Quote> {
        let json = fetch_json(&self.client, Exchange::Okx, &self.ticker_url()).await?;
        self.parse_ticker(&json)
    }

    async fn is_orderbook_live(&self) -> Result<bool> {
        let json = fetch_json(&self.client, Exchange::Okx, &self.ticker_url()).await?;
        Ok(json["code"].as_str() == Some("0"))
    }
}
