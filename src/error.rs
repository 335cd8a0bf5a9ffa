use thiserror::Error;

use crate::types::Exchange;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("{exchange} request failed: {source}")]
    Transport {
        exchange: Exchange,
        #[source]
        source: reqwest::Error,
    },

    #[error("{exchange} returned HTTP {status}")]
    HttpStatus {
        exchange: Exchange,
        status: reqwest::StatusCode,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid quote from {exchange}:{symbol}: {reason}")]
    InvalidQuote {
        exchange: Exchange,
        symbol: String,
        reason: String,
    },

    #[error("Invalid trade from {exchange}:{symbol}: {reason}")]
    InvalidTrade {
        exchange: Exchange,
        symbol: String,
        reason: String,
    },

    #[error("Cannot compose an empty chain of pairs")]
    EmptyChain,

    #[error("Decimal arithmetic overflow: {0}")]
    Arithmetic(String),

    #[error("{exchange} does not support {operation}")]
    Unsupported {
        exchange: Exchange,
        operation: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, OracleError>;
