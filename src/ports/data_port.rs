//! Price data access port trait.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::{Interval, PriceSeries};
use chrono::NaiveDate;
use std::fmt;

/// What to fetch. `start` is inclusive, `end` exclusive.
///
/// Also the cache key: two queries hit the same cache entry only when symbol,
/// range and interval all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceQuery {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

impl PriceQuery {
    pub fn new(symbol: &str, start: NaiveDate, end: NaiveDate, interval: Interval) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            start,
            end,
            interval,
        }
    }
}

impl fmt::Display for PriceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}, {})",
            self.symbol, self.interval, self.start, self.end
        )
    }
}

pub trait PriceDataPort {
    /// A non-empty, validated series, or an error. An empty result is a
    /// `FetchFailure`, never an empty series.
    fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceSeries, DashboardError>;

    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, DashboardError>;
}
