//! Warm path shared state
//!
//! The price cache sits between the feed receive loop (writer) and the
//! snapshot scheduler (reader).

pub mod cache;

pub use cache::PriceCache;
