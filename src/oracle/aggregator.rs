//! Exchange price source - fetches, orients, validates and composes quotes
//!
//! ```text
//! feed 1 (CELO/BTC) ─┐                               ┌─> validate ─┐
//! feed 2 (USD/BTC) ──┼─ fetch (parallel) ─> invert? ─┼─> validate ─┼─> implied_pair ─> WeightedPrice
//! feed n ────────────┘                               └─> validate ─┘
//! ```
//!
//! Quotes are handed to the composer in the order the feeds were supplied,
//! whatever order the fetches complete in.

use futures_util::future::try_join_all;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::{OracleError, Result};
use crate::oracle::collector::QuoteCollector;
use crate::oracle::cross_rate::implied_pair;
use crate::oracle::sources::OrientedFeed;
use crate::oracle::validation::validate_quote;
use crate::types::{PairData, Quote, WeightedPrice};

/// Flip a quote to the opposite orientation.
///
/// `bid' = 1/ask`, `ask' = 1/bid`, and base/quote volumes swap places.
/// A zero bid or ask cannot be inverted and is reported as an invalid quote.
/// A zero last price means no trade yet and is kept as zero.
pub fn invert_quote(quote: &Quote) -> Result<Quote> {
    let reciprocal = |value: Decimal, field: &str| {
        Decimal::ONE
            .checked_div(value)
            .ok_or_else(|| OracleError::InvalidQuote {
                exchange: quote.source,
                symbol: quote.symbol.clone(),
                reason: format!("cannot invert {} {}", field, value),
            })
    };

    Ok(Quote {
        bid: reciprocal(quote.ask, "ask")?,
        ask: reciprocal(quote.bid, "bid")?,
        last_price: Decimal::ONE
            .checked_div(quote.last_price)
            .unwrap_or(quote.last_price),
        base_volume: quote.quote_volume,
        quote_volume: quote.base_volume,
        timestamp: quote.timestamp,
        source: quote.source,
        symbol: quote.symbol.clone(),
    })
}

/// Weighted price source over an ordered chain of oriented feeds
pub struct PriceSource {
    /// Feeds in hop order
    feeds: Vec<OrientedFeed>,
    /// Receives every raw quote
    collector: Arc<dyn QuoteCollector>,
}

impl PriceSource {
    /// Create a price source over a non-empty chain of feeds
    pub fn new(feeds: Vec<OrientedFeed>, collector: Arc<dyn QuoteCollector>) -> Result<Self> {
        if feeds.is_empty() {
            return Err(OracleError::EmptyChain);
        }
        Ok(Self { feeds, collector })
    }

    /// Identity string, e.g. `BINANCE:CELOUSD:false|BITTREX:CELOEUR:false`
    pub fn name(&self) -> String {
        self.feeds
            .iter()
            .map(OrientedFeed::identity)
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn feeds(&self) -> &[OrientedFeed] {
        &self.feeds
    }

    /// Fetch every feed and compose them into one weighted price
    ///
    /// # Algorithm
    /// 1. Fetch all feeds concurrently, reporting each raw quote
    /// 2. Invert quotes whose feed is flagged
    /// 3. Validate every quote; one bad quote fails the call
    /// 4. Compose the chain with `implied_pair`
    /// 5. Price = mid of the implied pair, weight = its base volume
    ///
    /// # Errors
    /// The first feed or validation failure, unchanged. There is no partial
    /// result and no retry.
    pub async fn fetch_weighted_price(&self) -> Result<WeightedPrice> {
        let quotes = try_join_all(self.feeds.iter().map(|feed| self.fetch_oriented(feed))).await?;

        let pairs: Vec<PairData> = quotes.iter().map(PairData::from).collect();
        let implied = implied_pair(&pairs)?;
        let weighted = WeightedPrice::try_from(implied)?;

        tracing::debug!(
            source = %self.name(),
            bid = %implied.bid,
            ask = %implied.ask,
            price = %weighted.price,
            weight = %weighted.weight,
            "Composed weighted price"
        );

        Ok(weighted)
    }

    /// Probe every feed's orderbook; live only if all of them are
    pub async fn orderbooks_live(&self) -> Result<bool> {
        let statuses =
            try_join_all(self.feeds.iter().map(|oriented| oriented.feed.is_orderbook_live())).await?;
        Ok(statuses.into_iter().all(|live| live))
    }

    async fn fetch_oriented(&self, oriented: &OrientedFeed) -> Result<Quote> {
        let raw = oriented.feed.fetch_quote().await.map_err(|e| {
            tracing::warn!(feed = %oriented.identity(), error = %e, "Feed fetch failed");
            e
        })?;

        tracing::debug!(
            feed = %oriented.identity(),
            bid = %raw.bid,
            ask = %raw.ask,
            base_volume = %raw.base_volume,
            quote_volume = %raw.quote_volume,
            "Fetched quote"
        );
        self.collector.report(&raw);

        let quote = if oriented.invert {
            invert_quote(&raw)?
        } else {
            raw
        };

        if let Err(e) = validate_quote(&quote) {
            tracing::warn!(feed = %oriented.identity(), error = %e, "Rejecting quote");
            return Err(e);
        }

        Ok(quote)
    }
}

impl std::fmt::Debug for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceSource")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::collector::{MockQuoteCollector, NoopCollector};
    use crate::oracle::sources::Feed;
    use crate::types::Exchange;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct StaticFeed {
        quote: Quote,
        delay: Duration,
    }

    #[async_trait]
    impl Feed for StaticFeed {
        fn exchange(&self) -> Exchange {
            self.quote.source
        }

        fn pair_symbol(&self) -> &str {
            &self.quote.symbol
        }

        async fn fetch_quote(&self) -> Result<Quote> {
            tokio::time::sleep(self.delay).await;
            Ok(self.quote.clone())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl Feed for FailingFeed {
        fn exchange(&self) -> Exchange {
            Exchange::Okx
        }

        fn pair_symbol(&self) -> &str {
            "CELO-USDT"
        }

        async fn fetch_quote(&self) -> Result<Quote> {
            Err(OracleError::Parse("missing or malformed field `bidPx`".to_string()))
        }

        async fn is_orderbook_live(&self) -> Result<bool> {
            Ok(false)
        }
    }

    fn make_quote(
        source: Exchange,
        symbol: &str,
        bid: Decimal,
        ask: Decimal,
        base_volume: Decimal,
        quote_volume: Decimal,
    ) -> Quote {
        Quote {
            bid,
            ask,
            last_price: bid,
            base_volume,
            quote_volume,
            timestamp: 100_000,
            source,
            symbol: symbol.to_string(),
        }
    }

    fn good_quote() -> Quote {
        make_quote(
            Exchange::Binance,
            "CELOUSD",
            dec!(9.99),
            dec!(10.01),
            dec!(100),
            dec!(100),
        )
    }

    fn invalid_quote() -> Quote {
        make_quote(
            Exchange::Bittrex,
            "CELOEUR",
            dec!(10.01),
            dec!(9.99),
            dec!(100),
            dec!(100),
        )
    }

    fn oriented(quote: Quote, invert: bool) -> OrientedFeed {
        oriented_with_delay(quote, invert, Duration::ZERO)
    }

    fn oriented_with_delay(quote: Quote, invert: bool, delay: Duration) -> OrientedFeed {
        OrientedFeed::new(Arc::new(StaticFeed { quote, delay }), invert)
    }

    fn source(feeds: Vec<OrientedFeed>) -> PriceSource {
        PriceSource::new(feeds, Arc::new(NoopCollector)).unwrap()
    }

    #[test]
    fn test_empty_feed_list_rejected() {
        let result = PriceSource::new(Vec::new(), Arc::new(NoopCollector));
        assert!(matches!(result, Err(OracleError::EmptyChain)));
    }

    #[test]
    fn test_name_single_feed() {
        let ps = source(vec![oriented(good_quote(), false)]);
        assert_eq!(ps.name(), "BINANCE:CELOUSD:false");
    }

    #[test]
    fn test_name_multiple_feeds() {
        let ps = source(vec![
            oriented(good_quote(), false),
            oriented(invalid_quote(), false),
        ]);
        assert_eq!(ps.name(), "BINANCE:CELOUSD:false|BITTREX:CELOEUR:false");
    }

    #[test]
    fn test_name_shows_inversion() {
        let ps = source(vec![oriented(good_quote(), true)]);
        assert_eq!(ps.name(), "BINANCE:CELOUSD:true");
    }

    #[tokio::test]
    async fn test_fetches_the_price() {
        let ticker = good_quote();
        let mut collector = MockQuoteCollector::new();
        let expected = ticker.clone();
        collector
            .expect_report()
            .withf(move |q| *q == expected)
            .times(1)
            .return_const(());

        let ps = PriceSource::new(vec![oriented(ticker.clone(), false)], Arc::new(collector))
            .unwrap();
        let weighted = ps.fetch_weighted_price().await.unwrap();

        assert_eq!(weighted.price, (ticker.bid + ticker.ask) / dec!(2));
        assert_eq!(weighted.price, dec!(10.00));
        assert_eq!(weighted.weight, ticker.base_volume);
    }

    #[tokio::test]
    async fn test_invalid_ticker_fails_the_call() {
        let ps = source(vec![
            oriented(good_quote(), false),
            oriented(invalid_quote(), false),
        ]);
        let err = ps.fetch_weighted_price().await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidQuote { exchange: Exchange::Bittrex, .. }));

        let ps = source(vec![
            oriented(invalid_quote(), false),
            oriented(good_quote(), false),
        ]);
        assert!(ps.fetch_weighted_price().await.is_err());
    }

    #[tokio::test]
    async fn test_feed_error_propagates_unchanged() {
        let ps = PriceSource::new(
            vec![
                oriented(good_quote(), false),
                OrientedFeed::new(Arc::new(FailingFeed), false),
            ],
            Arc::new(NoopCollector),
        )
        .unwrap();
        let err = ps.fetch_weighted_price().await.unwrap_err();
        assert!(matches!(err, OracleError::Parse(ref msg) if msg.contains("bidPx")));
    }

    #[tokio::test]
    async fn test_inverted_feed() {
        // USD/CELO at 0.5 / 0.8 inverts to CELO/USD at 1.25 / 2
        let usd_celo = make_quote(
            Exchange::Okx,
            "USD-CELO",
            dec!(0.5),
            dec!(0.8),
            dec!(400),
            dec!(250),
        );
        let ps = source(vec![oriented(usd_celo, true)]);
        let weighted = ps.fetch_weighted_price().await.unwrap();

        assert_eq!(weighted.price, dec!(1.625));
        assert_eq!(weighted.weight, dec!(250));
    }

    #[tokio::test]
    async fn test_inverted_feed_without_last_trade() {
        let mut usd_celo = make_quote(
            Exchange::Okx,
            "USD-CELO",
            dec!(0.5),
            dec!(0.8),
            dec!(400),
            dec!(250),
        );
        usd_celo.last_price = Decimal::ZERO;

        let inverted = invert_quote(&usd_celo).unwrap();
        assert_eq!(inverted.last_price, Decimal::ZERO);

        let ps = source(vec![oriented(usd_celo, true)]);
        let weighted = ps.fetch_weighted_price().await.unwrap();
        assert_eq!(weighted.price, dec!(1.625));
        assert_eq!(weighted.weight, dec!(250));
    }

    #[tokio::test]
    async fn test_price_near_decimal_max_does_not_overflow() {
        let huge = dec!(50000000000000000000000000000);
        let quote = make_quote(Exchange::Okx, "BTC-SAT", huge, huge, dec!(3), huge);
        assert!(validate_quote(&quote).is_ok());

        let ps = source(vec![oriented(quote, false)]);
        let weighted = ps.fetch_weighted_price().await.unwrap();
        assert_eq!(weighted.price, huge);
        assert_eq!(weighted.weight, dec!(3));
    }

    #[tokio::test]
    async fn test_collector_sees_raw_quote_before_inversion() {
        let raw = make_quote(
            Exchange::Okx,
            "USD-CELO",
            dec!(0.5),
            dec!(0.8),
            dec!(400),
            dec!(250),
        );
        let mut collector = MockQuoteCollector::new();
        collector
            .expect_report()
            .withf(|q| q.bid == dec!(0.5) && q.ask == dec!(0.8))
            .times(1)
            .return_const(());

        let ps = PriceSource::new(vec![oriented(raw, true)], Arc::new(collector)).unwrap();
        ps.fetch_weighted_price().await.unwrap();
    }

    #[tokio::test]
    async fn test_chain_order_survives_concurrent_fetch() {
        let celo_eur = make_quote(
            Exchange::Bittrex,
            "CELOEUR",
            dec!(4.2),
            dec!(4.21),
            dec!(5000),
            dec!(21000),
        );
        let eur_usd = make_quote(
            Exchange::Kraken,
            "EURUSD",
            dec!(1.21),
            dec!(1.22),
            dec!(10000),
            dec!(12100),
        );

        // The first hop completes last
        let ps = source(vec![
            oriented_with_delay(celo_eur, false, Duration::from_millis(30)),
            oriented_with_delay(eur_usd, false, Duration::ZERO),
        ]);
        let weighted = ps.fetch_weighted_price().await.unwrap();

        assert_eq!(weighted.price, (dec!(5.082) + dec!(5.1362)) / dec!(2));
        assert_eq!(weighted.weight.round_dp(5), dec!(2380.95238));
    }

    #[tokio::test]
    async fn test_orderbooks_live() {
        let ps = source(vec![
            oriented(good_quote(), false),
            oriented(invalid_quote(), false),
        ]);
        assert!(ps.orderbooks_live().await.unwrap());

        let ps = PriceSource::new(
            vec![
                oriented(good_quote(), false),
                OrientedFeed::new(Arc::new(FailingFeed), false),
            ],
            Arc::new(NoopCollector),
        )
        .unwrap();
        assert!(!ps.orderbooks_live().await.unwrap());
    }

    #[test]
    fn test_inversion_is_self_inverse() {
        let original = make_quote(
            Exchange::Binance,
            "CELOUSD",
            dec!(0.5),
            dec!(0.8),
            dec!(400),
            dec!(250),
        );
        let inverted = invert_quote(&original).unwrap();
        assert_eq!(inverted.bid, dec!(1.25));
        assert_eq!(inverted.ask, dec!(2));
        assert_eq!(inverted.base_volume, dec!(250));
        assert_eq!(inverted.quote_volume, dec!(400));

        let restored = invert_quote(&inverted).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_inversion_round_trip_within_rounding() {
        let original = make_quote(
            Exchange::Binance,
            "CELOUSD",
            dec!(3),
            dec!(7),
            dec!(10),
            dec!(50),
        );
        let restored = invert_quote(&invert_quote(&original).unwrap()).unwrap();
        assert_eq!(restored.bid.round_dp(20), original.bid);
        assert_eq!(restored.ask.round_dp(20), original.ask);
        assert_eq!(restored.base_volume, original.base_volume);
        assert_eq!(restored.quote_volume, original.quote_volume);
    }

    #[test]
    fn test_inversion_preserves_bid_below_ask() {
        let inverted = invert_quote(&good_quote()).unwrap();
        assert!(inverted.bid <= inverted.ask);
        assert!(validate_quote(&inverted).is_ok());
    }

    #[test]
    fn test_inverting_zero_price_is_invalid() {
        let mut zero = good_quote();
        zero.bid = Decimal::ZERO;
        assert!(matches!(
            invert_quote(&zero),
            Err(OracleError::InvalidQuote { .. })
        ));
    }
}
