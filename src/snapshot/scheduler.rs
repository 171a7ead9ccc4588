//! Snapshot scheduler
//!
//! Timer task that copies the whole price cache on a fixed cadence and pushes
//! the copy into the retained buffer. The cache is only held for the duration
//! of the copy, so capture never stalls ingestion.

use super::{RetentionPolicy, Snapshot, SnapshotBuffer};
use crate::core::{PriceEntry, Symbol};
use crate::hot_path::PriceCache;
use crate::{log_snapshot, Result, TrackerError};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::Level;

/// Periodic cache snapshotter
pub struct SnapshotScheduler {
    cache: Arc<PriceCache>,
    buffer: Arc<Mutex<SnapshotBuffer>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SnapshotScheduler {
    pub fn new(cache: Arc<PriceCache>, policy: RetentionPolicy) -> Self {
        Self {
            cache,
            buffer: Arc::new(Mutex::new(SnapshotBuffer::new(policy))),
            task: Mutex::new(None),
        }
    }

    /// Start capturing every `interval`, first capture one interval from now.
    ///
    /// Must be called from within a tokio runtime. Starting twice is a no-op.
    pub fn start(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(TrackerError::Config(
                "snapshot interval must be greater than zero".to_string(),
            ));
        }

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            log_snapshot!(Level::WARN, "Snapshot scheduler already running");
            return Ok(());
        }

        let Some(first) = Instant::now().checked_add(interval) else {
            return Err(TrackerError::Config(format!(
                "snapshot interval {:?} is out of range",
                interval
            )));
        };

        let cache = self.cache.clone();
        let buffer = self.buffer.clone();
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                capture(&cache, &buffer);
            }
        }));

        log_snapshot!(
            Level::INFO,
            "Snapshot scheduler started (interval: {:?})",
            interval
        );
        Ok(())
    }

    /// Capture immediately, outside the timer
    pub fn capture_now(&self) -> Snapshot {
        capture(&self.cache, &self.buffer)
    }

    /// Cancel the timer. Captures already taken are kept.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            log_snapshot!(Level::INFO, "Snapshot scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub fn get_latest(&self) -> Option<Snapshot> {
        self.buffer.lock().latest().cloned()
    }

    /// Retained snapshots, oldest first
    pub fn get_history(&self) -> Vec<Snapshot> {
        self.buffer.lock().to_vec()
    }

    /// `(timestamp, entry)` for every retained snapshot containing `symbol`
    pub fn get_symbol_history(&self, symbol: &Symbol) -> Vec<(OffsetDateTime, PriceEntry)> {
        self.buffer
            .lock()
            .iter()
            .filter_map(|s| s.price(symbol).map(|e| (s.timestamp, e.clone())))
            .collect()
    }

    /// The symbol's entry in the latest snapshot
    pub fn get_symbol_price(&self, symbol: &Symbol) -> Option<(OffsetDateTime, PriceEntry)> {
        let buffer = self.buffer.lock();
        let latest = buffer.latest()?;
        latest.price(symbol).map(|e| (latest.timestamp, e.clone()))
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
        log_snapshot!(Level::INFO, "Snapshots cleared");
    }

    /// Replace retained snapshots, keeping the newest that fit the policy
    pub fn restore(&self, snapshots: Vec<Snapshot>) {
        let loaded = snapshots.len();
        let mut buffer = self.buffer.lock();
        buffer.replace(snapshots);
        log_snapshot!(
            Level::INFO,
            "Restored {} of {} snapshots",
            buffer.len(),
            loaded
        );
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.buffer.lock().policy()
    }
}

impl Drop for SnapshotScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

fn capture(cache: &PriceCache, buffer: &Mutex<SnapshotBuffer>) -> Snapshot {
    let snapshot = Snapshot::capture(cache.get_all());
    if snapshot.is_empty() {
        log_snapshot!(Level::WARN, "Captured snapshot of an empty cache");
    } else {
        log_snapshot!(
            Level::INFO,
            "Captured snapshot with {} symbols",
            snapshot.len()
        );
    }
    buffer.lock().push(snapshot.clone());
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PriceMap, QuoteSide};

    fn sym(name: &str) -> Symbol {
        Symbol::new(name).unwrap()
    }

    fn quote(bid: &str, ask: &str) -> PriceEntry {
        PriceEntry::new(QuoteSide::new(ask, "1"), QuoteSide::new(bid, "1"))
    }

    fn scheduler(policy: RetentionPolicy) -> (SnapshotScheduler, Arc<PriceCache>) {
        let cache = Arc::new(PriceCache::with_symbols(&[sym("BTCUSDT"), sym("ETHUSDT")]));
        (SnapshotScheduler::new(cache.clone(), policy), cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_capture_after_one_interval() {
        let (scheduler, _) = scheduler(RetentionPolicy::Fifo { capacity: 10 });
        scheduler.start(Duration::from_secs(5)).unwrap();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(scheduler.get_history().is_empty());

        tokio::time::sleep(Duration::from_millis(6_100)).await;
        assert_eq!(scheduler.get_history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_slot_keeps_only_latest() {
        let (scheduler, cache) = scheduler(RetentionPolicy::SingleSlot);
        scheduler.start(Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        cache.upsert(sym("BTCUSDT"), quote("10", "11"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let history = scheduler.get_history();
        assert_eq!(history.len(), 1);
        assert_eq!(scheduler.get_latest().as_ref(), history.last());
        assert_eq!(
            history[0].price(&sym("BTCUSDT")),
            Some(&quote("10", "11"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_isolated_from_later_updates() {
        let (scheduler, cache) = scheduler(RetentionPolicy::SingleSlot);
        cache.upsert(sym("BTCUSDT"), quote("1", "2"));

        let snapshot = scheduler.capture_now();
        cache.upsert(sym("BTCUSDT"), quote("3", "4"));

        assert_eq!(snapshot.price(&sym("BTCUSDT")), Some(&quote("1", "2")));
        assert_eq!(
            scheduler.get_latest().unwrap().price(&sym("BTCUSDT")),
            Some(&quote("1", "2"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_captures() {
        let (scheduler, _) = scheduler(RetentionPolicy::Fifo { capacity: 10 });
        scheduler.start(Duration::from_secs(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        scheduler.stop();
        assert!(!scheduler.is_running());
        let taken = scheduler.get_history().len();
        assert_eq!(taken, 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(scheduler.get_history().len(), taken);

        // Stopping again is harmless
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_noop() {
        let (scheduler, _) = scheduler(RetentionPolicy::Fifo { capacity: 10 });
        scheduler.start(Duration::from_secs(1)).unwrap();
        scheduler.start(Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(scheduler.get_history().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let (scheduler, _) = scheduler(RetentionPolicy::SingleSlot);
        assert!(matches!(
            scheduler.start(Duration::ZERO),
            Err(TrackerError::Config(_))
        ));
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_empty_cache_still_recorded() {
        let scheduler = SnapshotScheduler::new(Arc::new(PriceCache::new()), RetentionPolicy::SingleSlot);
        let snapshot = scheduler.capture_now();
        assert!(snapshot.is_empty());
        assert_eq!(scheduler.get_history(), vec![snapshot]);
    }

    #[test]
    fn test_symbol_queries() {
        let (scheduler, cache) = scheduler(RetentionPolicy::Fifo { capacity: 5 });
        cache.upsert(sym("BTCUSDT"), quote("1", "2"));
        scheduler.capture_now();
        cache.upsert(sym("BTCUSDT"), quote("3", "4"));
        let latest = scheduler.capture_now();

        let history = scheduler.get_symbol_history(&sym("BTCUSDT"));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1, quote("1", "2"));
        assert_eq!(history[1].1, quote("3", "4"));

        assert_eq!(
            scheduler.get_symbol_price(&sym("BTCUSDT")),
            Some((latest.timestamp, quote("3", "4")))
        );
        assert!(scheduler.get_symbol_price(&sym("SOLUSDT")).is_none());
        assert!(scheduler.get_symbol_history(&sym("SOLUSDT")).is_empty());
    }

    #[test]
    fn test_symbol_history_skips_snapshots_without_symbol() {
        let (scheduler, _) = scheduler(RetentionPolicy::Fifo { capacity: 10 });
        let at = |secs: i64| OffsetDateTime::from_unix_timestamp(secs).unwrap();
        let snapshot = |secs: i64, symbols: &[(&str, &str)]| {
            let prices: PriceMap = symbols
                .iter()
                .map(|(name, bid)| (sym(name), quote(bid, "99")))
                .collect();
            Snapshot::new(at(secs), prices)
        };

        scheduler.restore(vec![
            snapshot(1_700_000_000, &[("BTCUSDT", "1"), ("ETHUSDT", "10")]),
            snapshot(1_700_000_005, &[("BTCUSDT", "2")]),
            snapshot(1_700_000_010, &[("BTCUSDT", "3"), ("ETHUSDT", "30")]),
            snapshot(1_700_000_015, &[("BTCUSDT", "4")]),
            snapshot(1_700_000_020, &[("ETHUSDT", "50")]),
        ]);

        let eth = scheduler.get_symbol_history(&sym("ETHUSDT"));
        let stamps: Vec<_> = eth.iter().map(|(ts, _)| *ts).collect();
        assert_eq!(stamps, vec![at(1_700_000_000), at(1_700_000_010), at(1_700_000_020)]);
        let bids: Vec<_> = eth.iter().map(|(_, e)| e.bid.price.as_str()).collect();
        assert_eq!(bids, vec!["10", "30", "50"]);

        let btc = scheduler.get_symbol_history(&sym("BTCUSDT"));
        assert_eq!(btc.len(), 4);
        for history in [&eth, &btc] {
            assert!(history.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }

    #[test]
    fn test_captured_history_timestamps_increase() {
        let (scheduler, cache) = scheduler(RetentionPolicy::Fifo { capacity: 5 });
        for i in 0..3 {
            cache.upsert(sym("ETHUSDT"), quote(&i.to_string(), "9"));
            scheduler.capture_now();
            std::thread::sleep(Duration::from_millis(2));
        }

        let history = scheduler.get_symbol_history(&sym("ETHUSDT"));
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_interval_past_clock_range_rejected() {
        let (scheduler, _) = scheduler(RetentionPolicy::SingleSlot);
        assert!(matches!(
            scheduler.start(Duration::from_secs(u64::MAX)),
            Err(TrackerError::Config(_))
        ));
        assert!(!scheduler.is_running());

        // A sane interval still starts afterwards
        scheduler.start(Duration::from_secs(1)).unwrap();
        assert!(scheduler.is_running());
        scheduler.stop();
    }

    #[test]
    fn test_clear_and_restore() {
        let (scheduler, _) = scheduler(RetentionPolicy::Fifo { capacity: 2 });
        let snapshots: Vec<Snapshot> = (0..3).map(|_| scheduler.capture_now()).collect();

        scheduler.clear();
        assert!(scheduler.get_latest().is_none());

        scheduler.restore(snapshots.clone());
        assert_eq!(scheduler.get_history(), snapshots[1..].to_vec());
        assert_eq!(scheduler.retention(), RetentionPolicy::Fifo { capacity: 2 });
    }
}
