//! Core types shared by the feed, the cache and the snapshot scheduler
//!
//! - Symbol: normalized trading pair identifier
//! - SymbolRegistry: the fixed universe of tracked symbols
//! - QuoteSide / PriceEntry: best bid/ask as exact decimal strings
//! - BookTicker: decoded feed update

pub mod market_data;
pub mod registry;
pub mod symbol;

pub use market_data::{BookTicker, PriceEntry, PriceMap, QuoteSide};
pub use registry::{RegistryError, SymbolRegistry, MAX_SYMBOLS};
pub use symbol::Symbol;
