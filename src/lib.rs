//! Price Oracle Library
//!
//! Multi-exchange price aggregation with exact decimal cross-rate composition

pub mod config;
pub mod error;
pub mod oracle;
pub mod types;

pub use error::{OracleError, Result};
