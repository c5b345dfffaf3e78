//! In-memory TTL cache for fetched price series.
//!
//! Expired entries are dropped when looked up and swept on every `put`.

use crate::domain::ohlcv::PriceSeries;
use crate::ports::cache_port::{Clock, PriceCache, SystemClock};
use crate::ports::data_port::PriceQuery;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct MemoryCache<C: Clock = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: RefCell<HashMap<PriceQuery, (Instant, PriceSeries)>>,
}

impl MemoryCache<SystemClock> {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(ttl, SystemClock)
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<C: Clock> PriceCache for MemoryCache<C> {
    fn get(&self, key: &PriceQuery) -> Option<PriceSeries> {
        let now = self.clock.now();
        let mut entries = self.entries.borrow_mut();

        let expired = match entries.get(key) {
            None => return None,
            Some((stored_at, _)) => now.saturating_duration_since(*stored_at) >= self.ttl,
        };

        if expired {
            entries.remove(key);
            tracing::debug!(query = %key, "cache entry expired");
            return None;
        }

        entries.get(key).map(|(_, series)| series.clone())
    }

    fn put(&self, key: PriceQuery, series: PriceSeries) {
        let now = self.clock.now();
        let mut entries = self.entries.borrow_mut();

        let before = entries.len();
        entries.retain(|_, (stored_at, _)| now.saturating_duration_since(*stored_at) < self.ttl);
        if entries.len() < before {
            tracing::debug!(evicted = before - entries.len(), "swept expired cache entries");
        }

        entries.insert(key, (now, series));
    }
}
