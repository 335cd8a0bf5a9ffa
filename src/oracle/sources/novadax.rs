//! NovaDAX REST market client
//!
//! NovaDAX has no orderbook status endpoint, so the feed always reports live.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{OracleError, Result};
use crate::oracle::sources::{fetch_json, Feed};
use crate::oracle::validation::{
    parse_decimal, parse_timestamp, require, validate_quote, validate_trade,
};
use crate::types::{Exchange, Quote, Trade, TradeSide};

pub const NOVADAX_REST_URL: &str = "https://api.novadax.com/v1/market";

#[derive(Debug, Clone)]
pub struct NovadaxFeed {
    client: reqwest::Client,
    base_url: String,
    pair_symbol: String,
}

impl NovadaxFeed {
    pub fn new(client: reqwest::Client, base_url: &str, base: &str, quote: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pair_symbol: Self::build_pair_symbol(base, quote),
        }
    }

    /// NovaDAX symbols look like `BTC_BRL`
    fn build_pair_symbol(base: &str, quote: &str) -> String {
        format!("{}_{}", base.to_uppercase(), quote.to_uppercase())
    }

    /// Parse a ticker response:
    ///
    /// ```text
    /// {"code":"A10000","data":{"ask":"34708.15","baseVolume24h":"34.08241488",
    ///   "bid":"34621.74","lastPrice":"34669.81","quoteVolume24h":"1182480.09502814",
    ///   "symbol":"BTC_BRL","timestamp":1571112216346, ...},"message":"Success"}
    /// ```
    pub fn parse_ticker(&self, json: &Value) -> Result<Quote> {
        let data = &json["data"];
        if !data.is_object() {
            return Err(OracleError::Parse(format!(
                "NovaDAX ticker response has no data: {}",
                json["message"].as_str().unwrap_or("no message")
            )));
        }

        let quote = Quote {
            bid: require("bid", parse_decimal(&data["bid"]))?,
            ask: require("ask", parse_decimal(&data["ask"]))?,
            last_price: require("lastPrice", parse_decimal(&data["lastPrice"]))?,
            base_volume: require("baseVolume24h", parse_decimal(&data["baseVolume24h"]))?,
            quote_volume: require("quoteVolume24h", parse_decimal(&data["quoteVolume24h"]))?,
            timestamp: require("timestamp", parse_timestamp(&data["timestamp"]))?,
            source: Exchange::Novadax,
            symbol: self.pair_symbol.clone(),
        };
        validate_quote(&quote)?;
        Ok(quote)
    }

    /// Parse a trades response, sorted ascending by timestamp:
    ///
    /// ```text
    /// {"code":"A10000","data":[{"price":"43657.57","amount":"1","side":"SELL",
    ///   "timestamp":1565007823401}, ...],"message":"Success"}
    /// ```
    pub fn parse_trades(&self, json: &Value) -> Result<Vec<Trade>> {
        let entries = json["data"].as_array().ok_or_else(|| {
            OracleError::Parse("NovaDAX trades response has no data array".to_string())
        })?;

        let mut trades = entries
            .iter()
            .map(|entry| self.parse_trade(entry))
            .collect::<Result<Vec<_>>>()?;
        trades.sort_by_key(|t| t.timestamp);
        Ok(trades)
    }

    fn parse_trade(&self, entry: &Value) -> Result<Trade> {
        let price = require("price", parse_decimal(&entry["price"]))?;
        let amount = require("amount", parse_decimal(&entry["amount"]))?;
        let side = require("side", entry["side"].as_str().and_then(TradeSide::from_str))?;

        let trade = Trade {
            // no trade id
            id: None,
            price,
            amount,
            cost: price.checked_mul(amount),
            side,
            timestamp: require("timestamp", parse_timestamp(&entry["timestamp"]))?,
            source: Exchange::Novadax,
            symbol: self.pair_symbol.clone(),
        };
        validate_trade(&trade)?;
        Ok(trade)
    }
}

#[async_trait]
impl Feed for NovadaxFeed {
    fn exchange(&self) -> Exchange {
        Exchange::Novadax
    }

    fn pair_symbol(&self) -> &str {
        &self.pair_symbol
    }

    async fn fetch_quote(&self) -> Result<Quote> {
        let url = format!("{}/ticker?symbol={}", self.base_url, self.pair_symbol);
        let json = fetch_json(&self.client, Exchange::Novadax, &url).await?;
        self.parse_ticker(&json)
    }

    async fn fetch_trades(&self) -> Result<Vec<Trade>> {
        let url = format!("{}/trades?symbol={}", self.base_url, self.pair_symbol);
        let json = fetch_json(&self.client, Exchange::Novadax, &url).await?;
        self.parse_trades(&json)
    }
}
