//! Periodic snapshots of the price cache
//!
//! - `buffer`: retained snapshots under a retention policy
//! - `scheduler`: timer task capturing the cache on a fixed cadence

pub mod buffer;
pub mod scheduler;

pub use buffer::{RetentionPolicy, SnapshotBuffer};
pub use scheduler::SnapshotScheduler;

use crate::core::{PriceEntry, PriceMap, Symbol};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Immutable, timestamped copy of the whole cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Capture time, RFC 3339 UTC
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub prices: PriceMap,
}

impl Snapshot {
    pub fn new(timestamp: OffsetDateTime, prices: PriceMap) -> Self {
        Self { timestamp, prices }
    }

    /// Stamp `prices` with the current UTC time
    pub fn capture(prices: PriceMap) -> Self {
        Self::new(OffsetDateTime::now_utc(), prices)
    }

    #[inline]
    pub fn price(&self, symbol: &Symbol) -> Option<&PriceEntry> {
        self.prices.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
