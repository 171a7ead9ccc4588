//! Feed counters
//!
//! Lock-free counters updated from the receive loop and read by anyone
//! holding the `Arc`. Snapshots are taken for logging.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

/// Feed metrics collector
pub struct FeedMetrics {
    /// Data frames received (text or binary)
    frames: AtomicU64,
    /// Book tickers written to the cache
    quotes: AtomicU64,
    /// Subscription acknowledgments
    acks: AtomicU64,
    /// Frames dropped because they failed to decode
    decode_errors: AtomicU64,
    /// Connection status
    connected: AtomicBool,
    /// Last frame timestamp (Unix millis)
    last_message_time: AtomicU64,
    /// Start time for rate calculation
    start_time: Instant,
}

/// Metrics snapshot for export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub frames: u64,
    pub quotes: u64,
    pub acks: u64,
    pub decode_errors: u64,
    pub connected: bool,
    pub last_message_time: u64,
    pub message_rate: f64, // frames per second
    pub uptime_seconds: u64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self {
            frames: AtomicU64::new(0),
            quotes: AtomicU64::new(0),
            acks: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            last_message_time: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_message_time.store(now, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_quote(&self) {
        self.quotes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_ack(&self) {
        self.acks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn quotes(&self) -> u64 {
        self.quotes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let frames = self.frames.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs();
        let rate = if uptime > 0 {
            frames as f64 / uptime as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            frames,
            quotes: self.quotes.load(Ordering::Relaxed),
            acks: self.acks.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            connected: self.connected.load(Ordering::Relaxed),
            last_message_time: self.last_message_time.load(Ordering::Relaxed),
            message_rate: rate,
            uptime_seconds: uptime,
        }
    }
}

impl Default for FeedMetrics {
    fn default() -> Self {
        Self::new()
    }
}
