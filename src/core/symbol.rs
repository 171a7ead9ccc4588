//! Trading pair identifier
//!
//! Symbols are normalized to ASCII upper case on construction so that
//! `btcusdt`, `BtcUsdt` and `BTCUSDT` key the same cache entry.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Build a symbol from any string, upper-casing it.
    ///
    /// Returns `None` for empty input or anything that is not ASCII alphanumeric.
    pub fn new(name: &str) -> Option<Self> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self(name.to_ascii_uppercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased name used in Binance stream identifiers
    pub fn stream_name(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(&value).ok_or_else(|| format!("invalid symbol: {:?}", value))
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case() {
        let a = Symbol::new("btcusdt").unwrap();
        let b = Symbol::new("BTCUSDT").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "BTCUSDT");
    }

    #[test]
    fn test_invalid_symbol() {
        assert!(Symbol::new("").is_none());
        assert!(Symbol::new("BTC/USDT").is_none());
        assert!(Symbol::new("BTC USDT").is_none());
    }

    #[test]
    fn test_stream_name() {
        let sym = Symbol::new("1000PEPEUSDT").unwrap();
        assert_eq!(sym.stream_name(), "1000pepeusdt");
    }

    #[test]
    fn test_serde_normalizes() {
        let sym: Symbol = serde_json::from_str("\"solusdt\"").unwrap();
        assert_eq!(sym.as_str(), "SOLUSDT");
        assert_eq!(serde_json::to_string(&sym).unwrap(), "\"SOLUSDT\"");
        assert!(serde_json::from_str::<Symbol>("\"\"").is_err());
    }
}
