//! Oracle module - exchange price aggregation
//!
//! Fetches quotes from exchange feeds, validates them, composes cross rates
//! along a chain of currency hops and produces a liquidity-weighted price.

mod aggregator;
mod collector;
mod cross_rate;
pub mod sources;
pub mod validation;

pub use aggregator::{invert_quote, PriceSource};
pub use collector::{NoopCollector, QuoteCollector, TracingCollector};
pub use cross_rate::implied_pair;
pub use sources::{Feed, OrientedFeed};
pub use validation::{validate_quote, validate_trade};
