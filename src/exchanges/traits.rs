//! Feed abstraction traits
//!
//! The composition root only needs to open, close and query a feed, so it is
//! generic over `MarketFeed`. Uses generics, no dynamic dispatch.

use crate::core::BookTicker;
use crate::infrastructure::metrics::MetricsSnapshot;
use crate::Result;

/// Decoded inbound feed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Response to a SUBSCRIBE request (`result` null or absent)
    SubscriptionAck { id: u64 },
    /// Best bid/ask update for one symbol
    BookTicker(BookTicker),
}

/// Streaming market-data connection
///
/// # Design Notes
/// - `connect` opens the connection, subscribes, and starts ingestion
/// - `disconnect` is a no-op when already closed
/// - `is_connected` is best-effort and may briefly lag the transport
#[allow(async_fn_in_trait)]
pub trait MarketFeed: Send {
    /// Feed name (for logging)
    fn name(&self) -> &'static str;

    async fn connect(&mut self) -> Result<()>;

    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Point-in-time counters for the shutdown summary
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}
