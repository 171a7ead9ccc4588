//! Subscription requests
//!
//! Builds the single SUBSCRIBE request sent on every connect and tracks
//! request ids until the exchange acknowledges them.

use crate::core::Symbol;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type of data stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// Best bid/ask stream
    BookTicker,
}

impl StreamType {
    /// Stream name suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::BookTicker => "@bookTicker",
        }
    }

    /// `<lowercase symbol><suffix>`, e.g. `btcusdt@bookTicker`
    pub fn stream_for(&self, symbol: &Symbol) -> String {
        format!("{}{}", symbol.stream_name(), self.as_str())
    }
}

/// `{"method":"SUBSCRIBE","params":[...],"id":N}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRequest {
    pub method: &'static str,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscriptionRequest {
    pub fn subscribe(symbols: &[Symbol], stream_type: StreamType, id: u64) -> Self {
        Self {
            method: "SUBSCRIBE",
            params: symbols.iter().map(|s| stream_type.stream_for(s)).collect(),
            id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Monotonic request id source, starting at 1
#[derive(Debug)]
pub struct RequestIds {
    next: AtomicU64,
}

impl RequestIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Request ids sent but not yet acknowledged
#[derive(Debug, Default)]
pub struct PendingRequests {
    pending: HashSet<u64>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, id: u64) {
        self.pending.insert(id);
    }

    /// Returns true if `id` was pending
    pub fn confirm(&mut self, id: u64) -> bool {
        self.pending.remove(&id)
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
