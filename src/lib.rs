//! Binance best bid/ask price tracker
//!
//! Keeps a live price cache fed by a bookTicker WebSocket stream and
//! captures periodic snapshots of it for persistence.

pub mod core;
pub mod engine;
pub mod exchanges;
pub mod hot_path;
pub mod infrastructure;
pub mod snapshot;
pub mod ws;

// Re-export commonly used types
pub use crate::core::{PriceEntry, PriceMap, QuoteSide, Symbol, SymbolRegistry};
pub use engine::PriceTracker;
pub use hot_path::PriceCache;
pub use infrastructure::config::Config;
pub use snapshot::{RetentionPolicy, Snapshot, SnapshotScheduler};

use thiserror::Error;

/// Main error type for the price tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Decode error: {0}")]
    Decode(#[from] exchanges::parsing::DecodeError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::core::registry::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ws::WebSocketError> for TrackerError {
    fn from(e: ws::WebSocketError) -> Self {
        TrackerError::Connection(e.to_string())
    }
}

impl From<infrastructure::config::ConfigError> for TrackerError {
    fn from(e: infrastructure::config::ConfigError) -> Self {
        TrackerError::Config(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TrackerError>;
