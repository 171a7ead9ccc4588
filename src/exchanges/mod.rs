//! Exchange-specific implementations

pub mod binance;
pub mod parsing;
pub mod traits;

pub use binance::{BinanceFeed, FeedProcessor};
pub use parsing::{BinanceParser, DecodeError};
pub use traits::{FeedMessage, MarketFeed};
