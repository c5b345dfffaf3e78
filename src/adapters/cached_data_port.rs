//! Caching decorator over any [`PriceDataPort`].

use crate::adapters::memory_cache::MemoryCache;
use crate::domain::error::DashboardError;
use crate::domain::ohlcv::{Interval, PriceSeries};
use crate::ports::cache_port::{Clock, PriceCache, SystemClock};
use crate::ports::data_port::{PriceDataPort, PriceQuery};

/// Serves repeated queries from the cache. Failed fetches are not cached.
pub struct CachedDataPort<P, C = MemoryCache<SystemClock>> {
    inner: P,
    cache: C,
}

impl<P: PriceDataPort, C: PriceCache> CachedDataPort<P, C> {
    pub fn new(inner: P, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PriceDataPort, Ck: Clock> CachedDataPort<P, MemoryCache<Ck>> {
    pub fn cache(&self) -> &MemoryCache<Ck> {
        &self.cache
    }
}

impl<P: PriceDataPort, C: PriceCache> PriceDataPort for CachedDataPort<P, C> {
    fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceSeries, DashboardError> {
        if let Some(series) = self.cache.get(query) {
            tracing::debug!(query = %query, "price cache hit");
            return Ok(series);
        }

        tracing::debug!(query = %query, "price cache miss");
        let series = self.inner.fetch_prices(query)?;
        self.cache.put(query.clone(), series.clone());
        Ok(series)
    }

    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, DashboardError> {
        self.inner.list_symbols(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_cache::test_clock::ManualClock;
    use crate::domain::ohlcv::PriceBar;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    struct CountingPort {
        calls: Cell<usize>,
        fail: Cell<bool>,
    }

    impl CountingPort {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: Cell::new(false),
            }
        }
    }

    impl PriceDataPort for CountingPort {
        fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceSeries, DashboardError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(DashboardError::fetch_failure(&query.symbol, "offline"));
            }
            let bar = PriceBar {
                timestamp: query.start.and_hms_opt(0, 0, 0).unwrap(),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
            };
            PriceSeries::new(query.symbol.clone(), query.interval, vec![bar])
        }

        fn list_symbols(&self, _interval: Interval) -> Result<Vec<String>, DashboardError> {
            Ok(vec!["BHP".into()])
        }
    }

    fn query() -> PriceQuery {
        PriceQuery::new(
            "BHP",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            Interval::Daily,
        )
    }

    fn port_with_clock() -> (CachedDataPort<CountingPort, MemoryCache<Rc<ManualClock>>>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let cache = MemoryCache::new(Duration::from_secs(3600), Rc::clone(&clock));
        (CachedDataPort::new(CountingPort::new(), cache), clock)
    }

    #[test]
    fn second_query_within_ttl_skips_inner_port() {
        let (port, _clock) = port_with_clock();
        let first = port.fetch_prices(&query()).unwrap();
        let second = port.fetch_prices(&query()).unwrap();
        assert_eq!(first, second);
        assert_eq!(port.inner().calls.get(), 1);
    }

    #[test]
    fn query_after_ttl_refetches() {
        let (port, clock) = port_with_clock();
        port.fetch_prices(&query()).unwrap();
        clock.advance(Duration::from_secs(3600));
        port.fetch_prices(&query()).unwrap();
        assert_eq!(port.inner().calls.get(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let (port, _clock) = port_with_clock();
        port.inner().fail.set(true);
        assert!(port.fetch_prices(&query()).is_err());
        assert!(port.cache().is_empty());

        port.inner().fail.set(false);
        assert!(port.fetch_prices(&query()).is_ok());
        assert_eq!(port.inner().calls.get(), 2);
    }

    #[test]
    fn list_symbols_delegates() {
        let (port, _clock) = port_with_clock();
        assert_eq!(port.list_symbols(Interval::Daily).unwrap(), vec!["BHP"]);
    }
}
