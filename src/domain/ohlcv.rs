//! OHLC bar and price series representation.
//!
//! A [`PriceSeries`] can only be built through [`PriceSeries::new`], so every
//! series that reaches the computation pipeline is non-empty, has finite
//! fields and strictly increasing timestamps.

use crate::domain::error::DashboardError;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// close >= open
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    fn first_non_finite_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

/// Bar interval supported by the data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Daily,
    Hourly,
    FifteenMinutes,
}

impl Interval {
    pub const ALL: [Interval; 3] = [Interval::Daily, Interval::Hourly, Interval::FifteenMinutes];

    pub fn code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Hourly => "1h",
            Interval::FifteenMinutes => "15m",
        }
    }

    /// Bars per trading year, assuming 252 sessions of 6.5 hours for intraday data.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Interval::Daily => 252.0,
            Interval::Hourly => 252.0 * 6.5,
            Interval::FifteenMinutes => 252.0 * 26.0,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "d" | "daily" => Ok(Interval::Daily),
            "1h" | "60m" | "h" | "hourly" => Ok(Interval::Hourly),
            "15m" => Ok(Interval::FifteenMinutes),
            other => Err(format!("unknown interval '{}' (expected 1d, 1h or 15m)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    interval: Interval,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        bars: Vec<PriceBar>,
    ) -> Result<Self, DashboardError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(DashboardError::EmptySeries { symbol });
        }

        for (index, bar) in bars.iter().enumerate() {
            if let Some(field) = bar.first_non_finite_field() {
                return Err(DashboardError::MalformedRecord {
                    index,
                    reason: format!("{} is not a finite number", field),
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(DashboardError::UnorderedTimestamps { index });
            }
        }

        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.bars.iter().map(|b| b.timestamp)
    }

    pub fn first_timestamp(&self) -> NaiveDateTime {
        self.bars[0].timestamp
    }

    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.bars[self.bars.len() - 1].timestamp
    }
}
