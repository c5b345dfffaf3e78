//! Return calculator: close-to-close returns over a price series.
//!
//! The output is aligned one-to-one with the input bars. Element 0 is always
//! undefined, and so is any element whose pair of closes cannot produce a
//! finite return; those elements are recorded as [`InvalidPriceError`]s
//! instead of aborting the series.

use crate::domain::error::InvalidPriceError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMethod {
    Arithmetic,
    Logarithmic,
}

impl fmt::Display for ReturnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnMethod::Arithmetic => write!(f, "arithmetic"),
            ReturnMethod::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

impl FromStr for ReturnMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arithmetic" | "simple" => Ok(ReturnMethod::Arithmetic),
            "log" | "logarithmic" => Ok(ReturnMethod::Logarithmic),
            other => Err(format!(
                "unknown return method '{}' (expected arithmetic or log)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub method: ReturnMethod,
    pub points: Vec<ReturnPoint>,
    pub invalid: Vec<InvalidPriceError>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.value)
    }

    /// Defined values only, in order.
    pub fn defined(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value).collect()
    }
}

pub fn compute_returns(prices: &PriceSeries, method: ReturnMethod) -> ReturnSeries {
    let bars = prices.bars();
    let mut points = Vec::with_capacity(bars.len());
    let mut invalid = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            points.push(ReturnPoint {
                timestamp: bar.timestamp,
                value: None,
            });
            continue;
        }

        let prev = bars[i - 1].close;
        let value = match single_return(prev, bar.close, method) {
            Ok(r) => Some(r),
            Err(reason) => {
                tracing::warn!(
                    symbol = prices.symbol(),
                    index = i,
                    previous_close = prev,
                    close = bar.close,
                    "{}",
                    reason
                );
                invalid.push(InvalidPriceError {
                    index: i,
                    timestamp: bar.timestamp,
                    previous_close: prev,
                    close: bar.close,
                    reason: reason.to_string(),
                });
                None
            }
        };

        points.push(ReturnPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    ReturnSeries {
        method,
        points,
        invalid,
    }
}

fn single_return(prev: f64, close: f64, method: ReturnMethod) -> Result<f64, &'static str> {
    if prev == 0.0 {
        return Err("previous close is zero");
    }
    let r = match method {
        ReturnMethod::Arithmetic => (close - prev) / prev,
        ReturnMethod::Logarithmic => {
            if prev < 0.0 || close <= 0.0 {
                return Err("non-positive close under logarithmic method");
            }
            (close / prev).ln()
        }
    };
    if r.is_finite() {
        Ok(r)
    } else {
        Err("return is not finite")
    }
}
