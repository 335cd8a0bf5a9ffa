//! Core types used throughout the price oracle
//!
//! Defines exchange identities, normalized quotes and trades, and the
//! decimal-only projections used by the aggregation engine.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::OracleError;

/// Exchanges a feed can report as its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exchange {
    Binance,
    Bitso,
    Bitstamp,
    Bittrex,
    Coinbase,
    Kraken,
    Novadax,
    Okx,
}

impl Exchange {
    /// Upper-case tag used in identity strings and configuration
    pub fn tag(&self) -> &'static str {
        match self {
            Exchange::Binance => "BINANCE",
            Exchange::Bitso => "BITSO",
            Exchange::Bitstamp => "BITSTAMP",
            Exchange::Bittrex => "BITTREX",
            Exchange::Coinbase => "COINBASE",
            Exchange::Kraken => "KRAKEN",
            Exchange::Novadax => "NOVADAX",
            Exchange::Okx => "OKX",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BINANCE" => Some(Exchange::Binance),
            "BITSO" => Some(Exchange::Bitso),
            "BITSTAMP" => Some(Exchange::Bitstamp),
            "BITTREX" => Some(Exchange::Bittrex),
            "COINBASE" => Some(Exchange::Coinbase),
            "KRAKEN" => Some(Exchange::Kraken),
            "NOVADAX" => Some(Exchange::Novadax),
            "OKX" => Some(Exchange::Okx),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Normalized market snapshot for one pair from one feed
///
/// All numeric fields are decimals parsed from the exchange's textual
/// representation. A `Quote` is never mutated after construction; inversion
/// produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Last traded price
    pub last_price: Decimal,
    /// Rolling volume denominated in the base currency
    pub base_volume: Decimal,
    /// Rolling volume denominated in the quote currency
    pub quote_volume: Decimal,
    /// Exchange timestamp in milliseconds
    pub timestamp: i64,
    /// Exchange that produced this quote
    pub source: Exchange,
    /// Exchange-native pair symbol
    pub symbol: String,
}

impl Quote {
    /// Exchange timestamp as a UTC datetime, if representable
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Mid price, `(bid + ask) / 2`, or `None` when it is out of range
    pub fn mid(&self) -> Option<Decimal> {
        midpoint(self.bid, self.ask)
    }
}

/// `(a + b) / 2` without overflowing near the edge of the decimal range
fn midpoint(a: Decimal, b: Decimal) -> Option<Decimal> {
    match a.checked_add(b) {
        Some(sum) => sum.checked_div(Decimal::TWO),
        None => (a / Decimal::TWO).checked_add(b / Decimal::TWO),
    }
}

/// Trade direction from the taker's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// Normalized trade record from one feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange trade id, when the exchange provides one
    pub id: Option<String>,
    pub price: Decimal,
    pub amount: Decimal,
    /// `price * amount`
    pub cost: Option<Decimal>,
    pub side: TradeSide,
    /// Exchange timestamp in milliseconds
    pub timestamp: i64,
    pub source: Exchange,
    pub symbol: String,
}

/// Bid/ask/volume subset of a quote, used for cross-rate composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairData {
    pub bid: Decimal,
    pub ask: Decimal,
    pub base_volume: Decimal,
    pub quote_volume: Decimal,
}

impl From<&Quote> for PairData {
    fn from(quote: &Quote) -> Self {
        Self {
            bid: quote.bid,
            ask: quote.ask,
            base_volume: quote.base_volume,
            quote_volume: quote.quote_volume,
        }
    }
}

/// Mid price paired with a liquidity weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedPrice {
    /// `(bid + ask) / 2` of the composed pair
    pub price: Decimal,
    /// Base volume of the composed pair
    pub weight: Decimal,
}

impl TryFrom<PairData> for WeightedPrice {
    type Error = OracleError;

    fn try_from(pair: PairData) -> Result<Self, Self::Error> {
        let price = midpoint(pair.bid, pair.ask).ok_or_else(|| {
            OracleError::Arithmetic(format!("mid of {} and {} is out of range", pair.bid, pair.ask))
        })?;
        Ok(Self {
            price,
            weight: pair.base_volume,
        })
    }
}
