#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use quantdash::domain::error::DashboardError;
pub use quantdash::domain::ohlcv::{Interval, PriceBar, PriceSeries};
use quantdash::ports::data_port::{PriceDataPort, PriceQuery};
use std::cell::Cell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub calls: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceSeries, DashboardError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = self.errors.get(&query.symbol) {
            return Err(DashboardError::fetch_failure(&query.symbol, reason.clone()));
        }
        let start = query.start.and_hms_opt(0, 0, 0).unwrap();
        let end = query.end.and_hms_opt(0, 0, 0).unwrap();
        let bars: Vec<PriceBar> = self
            .data
            .get(&query.symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp >= start && b.timestamp < end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(DashboardError::fetch_failure(&query.symbol, "no rows in range"));
        }
        PriceSeries::new(query.symbol.clone(), query.interval, bars)
    }

    fn list_symbols(&self, _interval: Interval) -> Result<Vec<String>, DashboardError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn ts(date: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        timestamp: ts(date),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
    }
}

/// Daily bars with the given closes, starting at `start`.
pub fn daily_bars(start: &str, closes: &[f64]) -> Vec<PriceBar> {
    let first = ts(start);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: first + Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
        })
        .collect()
}

pub fn make_series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new("TEST", Interval::Daily, daily_bars("2024-01-01", closes)).unwrap()
}

/// Slow sine wave on an upward drift, long enough for a 20/50 crossover.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 / 15.0).sin() * 12.0 + i as f64 * 0.05)
        .collect()
}
