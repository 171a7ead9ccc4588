//! Symbol registry
//!
//! The fixed universe of symbols the cache tracks and the feed subscribes to.
//! Built once at startup by the composition root and shared read-only.

use crate::core::Symbol;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Maximum number of symbols supported (Binance streams per connection)
pub const MAX_SYMBOLS: usize = 1024;

/// Ordered, de-duplicated set of tracked symbols
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
}

/// `common_symbols` document layout: `{"symbols": {"binance_symbol": [...]}}`
#[derive(Debug, Deserialize)]
struct CommonSymbolsFile {
    symbols: CommonSymbols,
}

#[derive(Debug, Deserialize)]
struct CommonSymbols {
    binance_symbol: Vec<String>,
}

impl SymbolRegistry {
    /// Build a registry from raw names, normalizing and de-duplicating them.
    /// First occurrence wins the position.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut symbols = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref().trim();
            let symbol =
                Symbol::new(name).ok_or_else(|| RegistryError::InvalidSymbol(name.to_string()))?;
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }

        if symbols.is_empty() {
            return Err(RegistryError::Empty);
        }
        if symbols.len() > MAX_SYMBOLS {
            return Err(RegistryError::CapacityExceeded(symbols.len()));
        }

        tracing::info!("Symbol registry initialized with {} symbols", symbols.len());
        Ok(Self { symbols })
    }

    /// Parse a `common_symbols` JSON document
    pub fn from_common_symbols_json(json: &str) -> Result<Self, RegistryError> {
        let file: CommonSymbolsFile =
            serde_json::from_str(json).map_err(|e| RegistryError::Parse(e.to_string()))?;
        Self::new(&file.symbols.binance_symbol)
    }

    /// Load a `common_symbols` JSON document from disk
    pub fn load_file(path: &Path) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_common_symbols_json(&contents)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),
    #[error("Symbol list is empty")]
    Empty,
    #[error("Symbol capacity exceeded: {0} symbols (max 1024)")]
    CapacityExceeded(usize),
    #[error("Failed to read symbol list: {0}")]
    Io(String),
    #[error("Failed to parse symbol list: {0}")]
    Parse(String),
}

/// Default universe used when the config names no symbol source
pub fn default_symbols() -> Vec<String> {
    [
        "BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT", "ADAUSDT", "DOGEUSDT",
        "AVAXUSDT", "TRXUSDT", "DOTUSDT", "LINKUSDT", "LTCUSDT", "UNIUSDT", "AAVEUSDT",
        "ARBUSDT", "OPUSDT", "NEARUSDT", "SUIUSDT", "TONUSDT", "WLDUSDT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn initialize_with_defaults() -> Result<SymbolRegistry, RegistryError> {
    SymbolRegistry::new(&default_symbols())
}
