//! Binance WebSocket feed
//!
//! Owns one bookTicker connection. On connect it sends a single SUBSCRIBE
//! request for every registry symbol and spawns the receive loop, which
//! decodes frames one at a time in arrival order and writes quotes into the
//! shared `PriceCache`. No reconnection: a dropped connection stays
//! disconnected until `connect` is called again.

use crate::core::Symbol;
use crate::exchanges::parsing::{frame_text, BinanceParser, DecodeError};
use crate::exchanges::traits::{FeedMessage, MarketFeed};
use crate::hot_path::PriceCache;
use crate::infrastructure::config::FeedConfig;
use crate::infrastructure::metrics::{FeedMetrics, MetricsSnapshot};
use crate::ws::{
    ConnectionState, PendingRequests, RequestIds, StreamType, SubscriptionRequest,
    WebSocketConnection,
};
use crate::{log_feed, Result, TrackerError};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::Level;

/// Connection state shared between the feed handle and its receive loop
#[derive(Debug)]
pub struct SharedState(AtomicU8);

impl SharedState {
    pub fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Disconnected as u8))
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Running receive loop
struct Session {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Binance bookTicker feed
pub struct BinanceFeed {
    url: String,
    connect_timeout: Duration,
    disconnect_timeout: Duration,
    symbols: Vec<Symbol>,
    cache: Arc<PriceCache>,
    metrics: Arc<FeedMetrics>,
    state: Arc<SharedState>,
    request_ids: RequestIds,
    session: Option<Session>,
}

impl BinanceFeed {
    /// Public spot market-data endpoint
    pub const WS_URL: &'static str = "wss://data-stream.binance.vision/ws";

    pub fn new(config: &FeedConfig, symbols: &[Symbol], cache: Arc<PriceCache>) -> Self {
        Self {
            url: config.url.clone(),
            connect_timeout: config.connect_timeout(),
            disconnect_timeout: config.disconnect_timeout(),
            symbols: symbols.to_vec(),
            cache,
            metrics: Arc::new(FeedMetrics::new()),
            state: Arc::new(SharedState::new()),
            request_ids: RequestIds::new(),
            session: None,
        }
    }

    /// Open the connection, subscribe to every symbol and start ingesting.
    ///
    /// Fails with `TrackerError::Connection` without retrying.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            log_feed!(Level::WARN, "connect() called while already connected; ignoring");
            return Ok(());
        }
        // A previous loop may have ended on its own
        if let Some(stale) = self.session.take() {
            stale.task.abort();
        }

        self.state.set(ConnectionState::Connecting);
        log_feed!(Level::INFO, "Connecting to {}", self.url);

        let mut conn = match WebSocketConnection::connect(&self.url, self.connect_timeout).await {
            Ok(conn) => conn,
            Err(e) => {
                self.state.set(ConnectionState::Disconnected);
                log_feed!(Level::ERROR, "WebSocket connect failed: {}", e);
                return Err(TrackerError::Connection(format!("{}: {}", self.url, e)));
            }
        };
        log_feed!(Level::INFO, "Connected to Binance WebSocket");

        let id = self.request_ids.next_id();
        let request = SubscriptionRequest::subscribe(&self.symbols, StreamType::BookTicker, id);
        let sent = match request.to_json() {
            Ok(payload) => {
                log_feed!(Level::INFO, "Subscribing to {} streams...", request.params.len());
                conn.send_text(&payload).await.map_err(TrackerError::from)
            }
            Err(e) => Err(TrackerError::Connection(e.to_string())),
        };
        if let Err(e) = sent {
            conn.close().await;
            self.state.set(ConnectionState::Disconnected);
            log_feed!(Level::ERROR, "Subscription request failed: {}", e);
            return Err(e);
        }

        let mut pending = PendingRequests::new();
        pending.track(id);
        let processor = FeedProcessor::new(self.cache.clone(), self.metrics.clone(), pending);

        self.state.set(ConnectionState::Connected);
        self.metrics.set_connected(true);

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(receive_loop(conn, processor, self.state.clone(), shutdown_rx));
        self.session = Some(Session { shutdown, task });
        Ok(())
    }

    /// Close the connection. No-op when already closed.
    pub async fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            self.state.set(ConnectionState::Disconnected);
            return;
        };

        let abort = session.task.abort_handle();
        // Err means the loop already ended
        let _ = session.shutdown.send(());
        match timeout(self.disconnect_timeout, session.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(target: "feed", "Receive loop failed: {}", e),
            Err(_) => {
                tracing::warn!(target: "feed", "Receive loop did not stop in time; aborting");
                abort.abort();
            }
        }

        self.state.set(ConnectionState::Disconnected);
        self.metrics.set_connected(false);
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn metrics(&self) -> Arc<FeedMetrics> {
        self.metrics.clone()
    }
}

impl MarketFeed for BinanceFeed {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn connect(&mut self) -> Result<()> {
        BinanceFeed::connect(self).await
    }

    async fn disconnect(&mut self) {
        BinanceFeed::disconnect(self).await
    }

    fn is_connected(&self) -> bool {
        BinanceFeed::is_connected(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Applies decoded frames to the cache
pub struct FeedProcessor {
    cache: Arc<PriceCache>,
    metrics: Arc<FeedMetrics>,
    pending: PendingRequests,
}

impl FeedProcessor {
    pub fn new(cache: Arc<PriceCache>, metrics: Arc<FeedMetrics>, pending: PendingRequests) -> Self {
        Self {
            cache,
            metrics,
            pending,
        }
    }

    /// Handle one WebSocket frame. Returns false when the peer closed.
    pub fn handle_message(&mut self, msg: &Message) -> bool {
        match frame_text(msg) {
            Some(Ok(text)) => {
                self.metrics.record_frame();
                // Decode errors are counted and logged inside apply
                let _ = self.apply(text);
                true
            }
            Some(Err(e)) => {
                self.metrics.record_frame();
                self.metrics.record_decode_error();
                log_feed!(Level::WARN, "Dropping frame: {}", e);
                true
            }
            None => {
                if let Message::Close(frame) = msg {
                    log_feed!(Level::WARN, "WebSocket closed by server: {:?}", frame);
                    return false;
                }
                true
            }
        }
    }

    /// Decode a text payload and apply it
    pub fn apply(&mut self, text: &str) -> std::result::Result<(), DecodeError> {
        match BinanceParser::decode(text) {
            Ok(FeedMessage::BookTicker(ticker)) => {
                tracing::trace!(
                    target: "binance",
                    symbol = %ticker.symbol,
                    update_id = ?ticker.update_id,
                    "bookTicker"
                );
                let (symbol, entry) = ticker.into_entry();
                self.cache.upsert(symbol, entry);
                self.metrics.record_quote();
                Ok(())
            }
            Ok(FeedMessage::SubscriptionAck { id }) => {
                self.metrics.record_ack();
                if self.pending.confirm(id) {
                    log_feed!(Level::INFO, "Subscription confirmed (ID: {})", id);
                } else {
                    log_feed!(Level::WARN, "Acknowledgment for unknown request ID {}", id);
                }
                Ok(())
            }
            Err(e) => {
                self.metrics.record_decode_error();
                if matches!(e, DecodeError::Rejected { .. }) {
                    log_feed!(Level::ERROR, "Binance rejected request: {}", e);
                } else {
                    log_feed!(Level::WARN, "Error parsing message: {}", e);
                }
                Err(e)
            }
        }
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }
}

async fn receive_loop(
    mut conn: WebSocketConnection,
    mut processor: FeedProcessor,
    state: Arc<SharedState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                conn.close().await;
                log_feed!(Level::INFO, "Disconnected from Binance WebSocket");
                break;
            }
            frame = conn.recv() => match frame {
                Ok(Some(msg)) => {
                    if !processor.handle_message(&msg) {
                        break;
                    }
                }
                Ok(None) => {
                    log_feed!(Level::WARN, "WebSocket stream ended");
                    break;
                }
                Err(e) => {
                    log_feed!(Level::ERROR, "WebSocket error: {}", e);
                    break;
                }
            }
        }
    }

    state.set(ConnectionState::Disconnected);
    processor.metrics.set_connected(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PriceEntry, QuoteSide};

    fn sym(name: &str) -> Symbol {
        Symbol::new(name).unwrap()
    }

    fn processor() -> (FeedProcessor, Arc<PriceCache>, Arc<FeedMetrics>) {
        let cache = Arc::new(PriceCache::with_symbols(&[sym("BTCUSDT"), sym("ETHUSDT")]));
        let metrics = Arc::new(FeedMetrics::new());
        let mut pending = PendingRequests::new();
        pending.track(7);
        (
            FeedProcessor::new(cache.clone(), metrics.clone(), pending),
            cache,
            metrics,
        )
    }

    #[test]
    fn test_book_ticker_updates_cache() {
        let (mut processor, cache, metrics) = processor();
        let msg = r#"{"s":"BTCUSDT","b":"50000.00","B":"1.5","a":"50001.00","A":"2.0"}"#;

        assert!(processor.apply(msg).is_ok());
        assert_eq!(
            cache.get(&sym("BTCUSDT")),
            Some(PriceEntry::new(
                QuoteSide::new("50001.00", "2.0"),
                QuoteSide::new("50000.00", "1.5"),
            ))
        );
        assert_eq!(metrics.quotes(), 1);
    }

    #[test]
    fn test_ack_never_writes_cache() {
        let (mut processor, cache, metrics) = processor();
        let before = cache.get_all();

        assert!(processor.apply(r#"{"result":null,"id":7}"#).is_ok());
        assert_eq!(cache.get_all(), before);
        assert!(processor.pending().is_empty());
        assert_eq!(metrics.snapshot().acks, 1);
    }

    #[test]
    fn test_malformed_message_leaves_cache_unchanged() {
        let (mut processor, cache, metrics) = processor();
        let before = cache.get_all();

        let result = processor.apply(r#"{"b":"1","B":"1","a":"2","A":"2"}"#);
        assert_eq!(result, Err(DecodeError::MissingField("s")));
        assert_eq!(cache.get_all(), before);
        assert_eq!(metrics.decode_errors(), 1);
    }

    #[test]
    fn test_last_write_wins_in_arrival_order() {
        let (mut processor, cache, _) = processor();
        for (bid, ask) in [("1", "2"), ("3", "4"), ("5", "6")] {
            let msg = format!(
                r#"{{"s":"ETHUSDT","b":"{}","B":"1","a":"{}","A":"1"}}"#,
                bid, ask
            );
            processor.apply(&msg).unwrap();
        }
        let entry = cache.get(&sym("ETHUSDT")).unwrap();
        assert_eq!(entry.bid.price, "5");
        assert_eq!(entry.ask.price, "6");
    }

    #[test]
    fn test_handle_message_frames() {
        let (mut processor, _, metrics) = processor();

        assert!(processor.handle_message(&Message::Ping(Default::default())));
        assert!(processor.handle_message(&Message::text("garbage")));
        assert!(processor.handle_message(&Message::binary(vec![0xff])));
        assert!(!processor.handle_message(&Message::Close(None)));

        let snap = metrics.snapshot();
        assert_eq!(snap.frames, 2);
        assert_eq!(snap.decode_errors, 2);
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected_is_noop() {
        let cache = Arc::new(PriceCache::new());
        let mut feed = BinanceFeed::new(&FeedConfig::default(), &[sym("BTCUSDT")], cache);

        assert!(!feed.is_connected());
        feed.disconnect().await;
        feed.disconnect().await;
        assert_eq!(feed.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = FeedConfig {
            url: format!("ws://{}", addr),
            connect_timeout_secs: 2,
            ..FeedConfig::default()
        };
        let mut feed = BinanceFeed::new(&config, &[sym("BTCUSDT")], Arc::new(PriceCache::new()));

        let result = feed.connect().await;
        assert!(matches!(result, Err(TrackerError::Connection(_))));
        assert_eq!(feed.state(), ConnectionState::Disconnected);
        assert!(!feed.metrics().snapshot().connected);
    }

    #[test]
    fn test_trait_metrics_read_shared_counters() {
        let feed = BinanceFeed::new(&FeedConfig::default(), &[sym("BTCUSDT")], Arc::new(PriceCache::new()));
        let counters = feed.metrics();
        counters.record_frame();
        counters.record_quote();

        let snap = MarketFeed::metrics_snapshot(&feed);
        assert_eq!(snap.frames, 1);
        assert_eq!(snap.quotes, 1);
        assert!(!snap.connected);
    }
}
