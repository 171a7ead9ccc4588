//! Price Cache (Warm Path)
//!
//! Latest best bid/ask per symbol. Written by the feed receive loop,
//! read by the snapshot scheduler and any other caller.
//!
//! Entries are replaced whole under a short write lock, so a reader never
//! observes a half-updated entry. `get_all` is not atomic across symbols
//! with respect to concurrent writes; it copies under one read lock.

use crate::core::{PriceEntry, PriceMap, Symbol};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Thread-safe symbol → entry cache. Never shrinks.
#[derive(Debug, Default)]
pub struct PriceCache {
    entries: RwLock<HashMap<Symbol, PriceEntry>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache already populated with placeholders
    pub fn with_symbols<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        let cache = Self::new();
        cache.initialize(symbols);
        cache
    }

    /// Reset every given symbol to the ("0","0") placeholder.
    ///
    /// Must run before the feed starts writing; running it later discards live prices.
    pub fn initialize<'a>(&self, symbols: impl IntoIterator<Item = &'a Symbol>) {
        let mut entries = self.entries.write();
        let mut count = 0usize;
        for symbol in symbols {
            entries.insert(symbol.clone(), PriceEntry::placeholder());
            count += 1;
        }
        drop(entries);
        tracing::info!("Cache initialized for {} symbols", count);
    }

    /// Replace the entry for `symbol`. Symbols that were never initialized are admitted.
    #[inline]
    pub fn upsert(&self, symbol: Symbol, entry: PriceEntry) {
        let mut entries = self.entries.write();
        if let Some(slot) = entries.get_mut(&symbol) {
            *slot = entry;
            return;
        }
        tracing::debug!(symbol = %symbol, "Admitting symbol outside the registry");
        entries.insert(symbol, entry);
    }

    #[inline]
    pub fn get(&self, symbol: &Symbol) -> Option<PriceEntry> {
        self.entries.read().get(symbol).cloned()
    }

    /// Independent copy of every entry
    pub fn get_all(&self) -> PriceMap {
        let entries = self.entries.read();
        entries
            .iter()
            .map(|(symbol, entry)| (symbol.clone(), entry.clone()))
            .collect()
    }

    /// Copy of the entries for `symbols`; unknown symbols are omitted
    pub fn get_many<'a>(&self, symbols: impl IntoIterator<Item = &'a Symbol>) -> PriceMap {
        let entries = self.entries.read();
        symbols
            .into_iter()
            .filter_map(|symbol| {
                entries
                    .get(symbol)
                    .map(|entry| (symbol.clone(), entry.clone()))
            })
            .collect()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.read().contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuoteSide;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name).unwrap()
    }

    fn entry(bid: &str, ask: &str) -> PriceEntry {
        PriceEntry::new(QuoteSide::new(ask, "1"), QuoteSide::new(bid, "1"))
    }

    #[test]
    fn test_initialize_placeholders() {
        let symbols = vec![sym("BTCUSDT"), sym("ETHUSDT")];
        let cache = PriceCache::with_symbols(&symbols);

        for symbol in &symbols {
            let e = cache.get(symbol).unwrap();
            assert_eq!(e.ask, QuoteSide::new("0", "0"));
            assert_eq!(e.bid, QuoteSide::new("0", "0"));
        }
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_initialize_resets_but_never_shrinks() {
        let cache = PriceCache::with_symbols(&[sym("BTCUSDT")]);
        cache.upsert(sym("BTCUSDT"), entry("1", "2"));
        cache.upsert(sym("XYZUSDT"), entry("3", "4"));

        cache.initialize(&[sym("BTCUSDT")]);
        assert!(cache.get(&sym("BTCUSDT")).unwrap().is_placeholder());
        assert_eq!(cache.get(&sym("XYZUSDT")), Some(entry("3", "4")));
    }

    #[test]
    fn test_get_absent() {
        let cache = PriceCache::with_symbols(&[sym("BTCUSDT")]);
        assert!(cache.get(&sym("ETHUSDT")).is_none());
    }

    #[test]
    fn test_upsert_admits_unknown_symbol() {
        let cache = PriceCache::with_symbols(&[sym("BTCUSDT")]);
        cache.upsert(sym("NEWUSDT"), entry("10", "11"));
        assert_eq!(cache.get(&sym("NEWUSDT")), Some(entry("10", "11")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_all_is_a_copy() {
        let cache = PriceCache::with_symbols(&[sym("BTCUSDT")]);
        let mut all = cache.get_all();
        all.insert(sym("BTCUSDT"), entry("999", "1000"));
        all.insert(sym("ETHUSDT"), entry("1", "2"));

        assert!(cache.get(&sym("BTCUSDT")).unwrap().is_placeholder());
        assert!(cache.get(&sym("ETHUSDT")).is_none());
    }

    #[test]
    fn test_get_many_omits_unknown() {
        let cache = PriceCache::with_symbols(&[sym("BTCUSDT"), sym("ETHUSDT")]);
        let many = cache.get_many(&[sym("ETHUSDT"), sym("DOGEUSDT")]);
        assert_eq!(many.len(), 1);
        assert!(many.contains_key(&sym("ETHUSDT")));
    }

    #[test]
    fn test_concurrent_writer_and_reader() {
        let cache = Arc::new(PriceCache::with_symbols(&[sym("BTCUSDT")]));
        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    let p = i.to_string();
                    cache.upsert(sym("BTCUSDT"), entry(&p, &p));
                }
            })
        };
        for _ in 0..1000 {
            let all = cache.get_all();
            let e = &all[&sym("BTCUSDT")];
            // Both sides always come from the same write
            assert_eq!(e.ask.price, e.bid.price);
        }
        writer.join().unwrap();
        assert_eq!(cache.get(&sym("BTCUSDT")), Some(entry("999", "999")));
    }

    proptest! {
        #[test]
        fn prop_last_write_wins(prices in proptest::collection::vec(0u32..100_000, 1..50)) {
            let cache = PriceCache::with_symbols(&[sym("BTCUSDT")]);
            for p in &prices {
                let p = p.to_string();
                cache.upsert(sym("BTCUSDT"), entry(&p, &p));
            }
            let last = prices.last().unwrap().to_string();
            prop_assert_eq!(cache.get(&sym("BTCUSDT")), Some(entry(&last, &last)));
        }
    }
}
