//! Core Application Engine
//!
//! Wires the registry, cache, feed, snapshot scheduler and store together and
//! runs the startup and shutdown sequences. Generic over the feed so the
//! lifecycle can be driven without a network.

use crate::core::SymbolRegistry;
use crate::exchanges::{BinanceFeed, MarketFeed};
use crate::hot_path::PriceCache;
use crate::infrastructure::config::Config;
use crate::infrastructure::metrics::MetricsSnapshot;
use crate::infrastructure::persistence::SnapshotStore;
use crate::snapshot::SnapshotScheduler;
use crate::{log_main, Result};

use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Main engine managing the tracker lifecycle
pub struct PriceTracker<F: MarketFeed = BinanceFeed> {
    registry: SymbolRegistry,
    cache: Arc<PriceCache>,
    feed: F,
    scheduler: SnapshotScheduler,
    store: SnapshotStore,
    interval: Duration,
    warmup: Duration,
    restore_on_start: bool,
    running: bool,
}

impl PriceTracker<BinanceFeed> {
    /// Build a tracker fed by the Binance bookTicker stream
    pub fn from_config(config: &Config, registry: SymbolRegistry) -> Self {
        let cache = Arc::new(PriceCache::new());
        let feed = BinanceFeed::new(&config.feed, registry.symbols(), cache.clone());
        Self::with_feed(config, registry, cache, feed)
    }
}

impl<F: MarketFeed> PriceTracker<F> {
    /// `feed` must write into `cache`
    pub fn with_feed(config: &Config, registry: SymbolRegistry, cache: Arc<PriceCache>, feed: F) -> Self {
        cache.initialize(registry.iter());
        Self {
            scheduler: SnapshotScheduler::new(cache.clone(), config.snapshot.retention),
            store: SnapshotStore::new(&config.snapshot.file),
            interval: config.snapshot.interval(),
            warmup: config.feed.warmup(),
            restore_on_start: config.snapshot.restore_on_start,
            registry,
            cache,
            feed,
            running: false,
        }
    }

    /// Restore (optional), connect, wait for the warm-up period, start snapshots.
    ///
    /// A connection failure is returned as-is and nothing is left running.
    pub async fn start(&mut self) -> Result<()> {
        if self.running {
            log_main!(Level::WARN, "Tracker already running");
            return Ok(());
        }

        log_main!(
            Level::INFO,
            "Starting price tracker for {} symbols",
            self.registry.len()
        );

        if self.restore_on_start {
            let snapshots = self.store.load_or_empty();
            if !snapshots.is_empty() {
                self.scheduler.restore(snapshots);
            }
        }

        if let Err(e) = self.feed.connect().await {
            log_main!(Level::ERROR, "Failed to connect to {}: {}", self.feed.name(), e);
            return Err(e);
        }

        log_main!(
            Level::INFO,
            "Waiting {:?} for initial price data...",
            self.warmup
        );
        tokio::time::sleep(self.warmup).await;

        if let Err(e) = self.scheduler.start(self.interval) {
            self.feed.disconnect().await;
            return Err(e);
        }

        self.running = true;
        log_main!(Level::INFO, "Price tracker running");
        Ok(())
    }

    /// Stop snapshots, disconnect, then persist the retained snapshots once.
    ///
    /// A failed save is logged and the in-memory history is lost.
    pub async fn shutdown(&mut self) -> Result<()> {
        log_main!(Level::INFO, "Shutting down...");
        self.running = false;

        self.scheduler.stop();
        self.feed.disconnect().await;

        let history = self.scheduler.get_history();
        if let Err(e) = self.store.save(&history) {
            log_main!(Level::ERROR, "Failed to save snapshots: {}", e);
        }

        self.log_summary();
        Ok(())
    }

    fn log_summary(&self) {
        let metrics = self.feed_metrics();
        log_main!(
            Level::INFO,
            "{} feed: {} frames, {} quotes, {} acks, {} decode errors, {:.1} msg/s over {}s (last frame at {} ms)",
            self.feed.name(),
            metrics.frames,
            metrics.quotes,
            metrics.acks,
            metrics.decode_errors,
            metrics.message_rate,
            metrics.uptime_seconds,
            metrics.last_message_time
        );

        let Some(latest) = self.scheduler.get_latest() else {
            log_main!(Level::INFO, "No snapshots captured");
            return;
        };

        let quoted = latest.prices.values().filter(|e| !e.is_placeholder()).count();
        log_main!(
            Level::INFO,
            "Latest snapshot ({}): {} symbols, {} with prices",
            latest.timestamp,
            latest.len(),
            quoted
        );
        for (symbol, entry) in &latest.prices {
            tracing::debug!(
                target: "main",
                "{}: bid {} x {} / ask {} x {}",
                symbol,
                entry.bid.price,
                entry.bid.quantity,
                entry.ask.price,
                entry.ask.quantity
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_metrics(&self) -> MetricsSnapshot {
        self.feed.metrics_snapshot()
    }

    pub fn scheduler(&self) -> &SnapshotScheduler {
        &self.scheduler
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }
}
