//! Cross-rate composition
//!
//! Folds a chain of adjacent-currency pairs (A/B, B/C, ..., Y/Z) into the
//! implied A/Z pair.
//!
//! # Liquidity
//! ```text
//! A/B  base=A vol, quote=B vol ─┐
//!                               ├─ limiting = min(A/B quote, B/C base)   (in B)
//! B/C  base=B vol, quote=C vol ─┘
//! ```
//! Each leg's own volumes are scaled by the fraction of its B-denominated
//! capacity that is usable through the bottleneck.

use rust_decimal::Decimal;

use crate::error::{OracleError, Result};
use crate::types::PairData;

/// Compose a chain of adjacent pairs into one implied pair.
///
/// The chain is folded strictly left to right; its order is the hop path.
/// A single-element chain is returned unchanged.
pub fn implied_pair(chain: &[PairData]) -> Result<PairData> {
    let (first, rest) = chain.split_first().ok_or(OracleError::EmptyChain)?;
    rest.iter().try_fold(*first, compose)
}

fn compose(acc: PairData, next: &PairData) -> Result<PairData> {
    let bid = checked_mul(acc.bid, next.bid, "bid")?;
    let ask = checked_mul(acc.ask, next.ask, "ask")?;

    // Bottleneck in the shared intermediate currency.
    let limiting = acc.quote_volume.min(next.base_volume);

    let base_volume = scale(acc.base_volume, limiting, acc.quote_volume)?;
    let quote_volume = scale(next.quote_volume, limiting, next.base_volume)?;

    Ok(PairData {
        bid,
        ask,
        base_volume,
        quote_volume,
    })
}

/// `volume * (limiting / capacity)`, passing `volume` through untouched when
/// the leg itself is the bottleneck.
fn scale(volume: Decimal, limiting: Decimal, capacity: Decimal) -> Result<Decimal> {
    if limiting.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if limiting == capacity {
        return Ok(volume);
    }
    let ratio = limiting
        .checked_div(capacity)
        .ok_or_else(|| OracleError::Arithmetic(format!("{} / {}", limiting, capacity)))?;
    checked_mul(volume, ratio, "volume")
}

fn checked_mul(lhs: Decimal, rhs: Decimal, what: &str) -> Result<Decimal> {
    lhs.checked_mul(rhs)
        .ok_or_else(|| OracleError::Arithmetic(format!("{} {} * {}", what, lhs, rhs)))
}
