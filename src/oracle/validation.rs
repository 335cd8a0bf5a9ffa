//! Quote and trade validation
//!
//! Feeds parse leniently (an unparseable numeric field becomes `None`) and
//! fail loudly when a field the validator needs is still missing.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::error::{OracleError, Result};
use crate::types::{Quote, Trade};

/// Parse a decimal from a JSON string or number.
///
/// Numbers are read through their textual form so no binary float is ever
/// involved. Scientific notation is accepted.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Parse an epoch-millisecond timestamp from a JSON string or integer.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turn an absent required field into a parse error.
pub fn require<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| OracleError::Parse(format!("missing or malformed field `{}`", field)))
}

/// Check the invariants a quote must hold before it is aggregated.
pub fn validate_quote(quote: &Quote) -> Result<()> {
    let reject = |reason: String| OracleError::InvalidQuote {
        exchange: quote.source,
        symbol: quote.symbol.clone(),
        reason,
    };

    if quote.bid <= Decimal::ZERO {
        return Err(reject(format!("bid {} is not positive", quote.bid)));
    }
    if quote.ask <= Decimal::ZERO {
        return Err(reject(format!("ask {} is not positive", quote.ask)));
    }
    if quote.bid > quote.ask {
        return Err(reject(format!(
            "bid {} is above ask {}",
            quote.bid, quote.ask
        )));
    }
    if quote.base_volume < Decimal::ZERO {
        return Err(reject(format!(
            "base volume {} is negative",
            quote.base_volume
        )));
    }
    if quote.quote_volume < Decimal::ZERO {
        return Err(reject(format!(
            "quote volume {} is negative",
            quote.quote_volume
        )));
    }

    Ok(())
}

/// Check the invariants a trade must hold.
pub fn validate_trade(trade: &Trade) -> Result<()> {
    let reject = |reason: String| OracleError::InvalidTrade {
        exchange: trade.source,
        symbol: trade.symbol.clone(),
        reason,
    };

    if trade.price <= Decimal::ZERO {
        return Err(reject(format!("price {} is not positive", trade.price)));
    }
    if trade.amount <= Decimal::ZERO {
        return Err(reject(format!("amount {} is not positive", trade.amount)));
    }
    if trade.timestamp <= 0 {
        return Err(reject(format!(
            "timestamp {} does not resolve",
            trade.timestamp
        )));
    }

    Ok(())
}
