//! Price cache port and clock abstraction.

use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::PriceQuery;
use std::rc::Rc;
use std::time::Instant;

pub trait PriceCache {
    fn get(&self, key: &PriceQuery) -> Option<PriceSeries>;
    fn put(&self, key: PriceQuery, series: PriceSeries);
}

/// Time source for cache expiry.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
