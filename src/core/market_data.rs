//! Market data types
//!
//! Prices and quantities are kept as the exact decimal strings the exchange
//! sent. They are never parsed into floating point.

use super::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder value used before the first update arrives
pub const PLACEHOLDER: &str = "0";

/// One side of the book: (price, quantity)
///
/// Serialized as a two-element array `["price", "quantity"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct QuoteSide {
    pub price: String,
    pub quantity: String,
}

impl QuoteSide {
    #[inline]
    pub fn new(price: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            quantity: quantity.into(),
        }
    }

    /// ("0", "0")
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER, PLACEHOLDER)
    }

    pub fn is_placeholder(&self) -> bool {
        self.price == PLACEHOLDER && self.quantity == PLACEHOLDER
    }
}

impl Default for QuoteSide {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl From<(String, String)> for QuoteSide {
    fn from((price, quantity): (String, String)) -> Self {
        Self { price, quantity }
    }
}

impl From<QuoteSide> for (String, String) {
    fn from(side: QuoteSide) -> Self {
        (side.price, side.quantity)
    }
}

/// Best ask and best bid for one symbol
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceEntry {
    pub ask: QuoteSide,
    pub bid: QuoteSide,
}

impl PriceEntry {
    #[inline]
    pub fn new(ask: QuoteSide, bid: QuoteSide) -> Self {
        Self { ask, bid }
    }

    pub fn placeholder() -> Self {
        Self::default()
    }

    /// True until the first feed update for the symbol has been applied
    pub fn is_placeholder(&self) -> bool {
        self.ask.is_placeholder() && self.bid.is_placeholder()
    }
}

/// Ordered symbol → entry mapping handed out by the cache and stored in snapshots
pub type PriceMap = BTreeMap<Symbol, PriceEntry>;

/// Decoded bookTicker update
///
/// Binance bookTicker format:
/// {
///   "u": 400900217,
///   "s": "BNBUSDT",
///   "b": "25.35190000",
///   "B": "31.21000000",
///   "a": "25.36520000",
///   "A": "40.66000000"
/// }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTicker {
    /// Order book update id. Carried through but not used for gap detection.
    pub update_id: Option<u64>,
    pub symbol: Symbol,
    pub bid: QuoteSide,
    pub ask: QuoteSide,
}

impl BookTicker {
    /// Convert into the cache representation
    #[inline]
    pub fn into_entry(self) -> (Symbol, PriceEntry) {
        (self.symbol, PriceEntry::new(self.ask, self.bid))
    }
}
