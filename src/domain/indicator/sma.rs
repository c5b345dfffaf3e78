//! Simple Moving Average indicator.
//!
//! O(n) sliding window sum with Kahan compensation.
//! SMA(n)[i] = (C[i-n+1] + ... + C[i]) / n
//! Warmup: first (n-1) bars are undefined.
//! A window of identical closes yields that close exactly, so two averages
//! over the same flat stretch compare equal.

use crate::domain::error::DashboardError;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    fn remove(&mut self, value: f64) {
        self.add(-value);
    }
}

pub fn moving_average(prices: &PriceSeries, window: usize) -> Result<IndicatorSeries, DashboardError> {
    if window == 0 {
        return Err(DashboardError::InvalidWindow { window });
    }

    let bars = prices.bars();
    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = CompensatedSum::default();
    // length of the run of identical closes ending at the current bar
    let mut same_run = 0usize;

    for (i, bar) in bars.iter().enumerate() {
        window_sum.add(bar.close);
        if i >= window {
            window_sum.remove(bars[i - window].close);
        }
        same_run = if i > 0 && bars[i - 1].close == bar.close {
            same_run + 1
        } else {
            1
        };

        let value = if i + 1 < window {
            None
        } else if same_run >= window {
            Some(bar.close)
        } else {
            Some(window_sum.sum / window as f64)
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Sma(window),
        values,
    })
}
