//! Best-effort reporting of raw quotes

use crate::types::Quote;

/// Receives every raw quote a price source fetches, before inversion.
///
/// Implementations must not block or fail the caller.
#[cfg_attr(test, mockall::automock)]
pub trait QuoteCollector: Send + Sync {
    fn report(&self, quote: &Quote);
}

/// Emits each quote as a structured `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCollector;

impl QuoteCollector for TracingCollector {
    fn report(&self, quote: &Quote) {
        tracing::info!(
            target: "price_oracle::quotes",
            source = %quote.source,
            symbol = %quote.symbol,
            bid = %quote.bid,
            ask = %quote.ask,
            mid = ?quote.mid(),
            last = %quote.last_price,
            base_volume = %quote.base_volume,
            quote_volume = %quote.quote_volume,
            ts = quote.timestamp,
            "quote"
        );
    }
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCollector;

impl QuoteCollector for NoopCollector {
    fn report(&self, _quote: &Quote) {}
}
