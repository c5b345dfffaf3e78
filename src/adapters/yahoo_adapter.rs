//! Yahoo Finance v8 chart API price data adapter.
//!
//! Response decoding is always compiled; the HTTP client needs the `yahoo`
//! feature.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::{Interval, PriceBar, PriceSeries};
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize, Debug)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Interval code understood by the chart API.
pub fn yahoo_interval(interval: Interval) -> &'static str {
    match interval {
        Interval::Daily => "1d",
        Interval::Hourly => "60m",
        Interval::FifteenMinutes => "15m",
    }
}

/// Decode a chart API response body into a validated series.
///
/// Rows with any missing OHLC value are skipped (the API emits nulls for
/// halted sessions). Daily bars are stamped at midnight UTC. Rows are sorted
/// and a repeated timestamp keeps its last row, since the trailing live bar
/// can be reported twice.
pub fn decode_chart_response(
    symbol: &str,
    interval: Interval,
    body: &str,
) -> Result<PriceSeries, DashboardError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::fetch_failure(symbol, format!("invalid response: {}", e)))?;

    if let Some(err) = response.chart.error {
        return Err(DashboardError::fetch_failure(symbol, err.description));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DashboardError::fetch_failure(symbol, "response contains no result"))?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DashboardError::fetch_failure(symbol, "response contains no quotes"))?;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let field = |v: &[Option<f64>]| v.get(i).copied().flatten();
        let timestamp = DateTime::from_timestamp(ts, 0).map(|d| bar_timestamp(d.naive_utc(), interval));

        match (
            timestamp,
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) {
            (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) => {
                bars.push(PriceBar {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                })
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(symbol, skipped, "skipped rows with missing OHLC values");
    }
    if bars.is_empty() {
        return Err(DashboardError::fetch_failure(symbol, "no price data returned"));
    }

    bars.sort_by_key(|bar| bar.timestamp);
    let before = bars.len();
    bars.dedup_by(|later, kept| {
        if later.timestamp == kept.timestamp {
            std::mem::swap(later, kept);
            true
        } else {
            false
        }
    });
    if bars.len() < before {
        tracing::debug!(symbol, duplicates = before - bars.len(), "dropped repeated timestamps");
    }

    PriceSeries::new(symbol, interval, bars)
}

fn bar_timestamp(timestamp: NaiveDateTime, interval: Interval) -> NaiveDateTime {
    match interval {
        Interval::Daily => timestamp.date().and_time(NaiveTime::MIN),
        Interval::Hourly | Interval::FifteenMinutes => timestamp,
    }
}

#[cfg(feature = "yahoo")]
pub use client::YahooAdapter;

#[cfg(feature = "yahoo")]
mod client {
    use super::{decode_chart_response, yahoo_interval};
    use crate::domain::error::DashboardError;
    use crate::domain::ohlcv::{Interval, PriceSeries};
    use crate::ports::data_port::{PriceDataPort, PriceQuery};
    use std::time::Duration;

    const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
    const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) quantdash";

    pub struct YahooAdapter {
        client: reqwest::blocking::Client,
    }

    impl YahooAdapter {
        pub fn new(timeout: Duration) -> Result<Self, DashboardError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| DashboardError::fetch_failure("*", format!("HTTP client: {}", e)))?;
            Ok(Self { client })
        }
    }

    fn epoch(date: chrono::NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    }

    impl PriceDataPort for YahooAdapter {
        fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceSeries, DashboardError> {
            let url = format!("{}/{}", CHART_URL, query.symbol);
            tracing::info!(query = %query, "fetching prices from Yahoo Finance");

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("period1", epoch(query.start).to_string()),
                    ("period2", epoch(query.end).to_string()),
                    ("interval", yahoo_interval(query.interval).to_string()),
                ])
                .send()
                .map_err(|e| DashboardError::fetch_failure(&query.symbol, e.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .map_err(|e| DashboardError::fetch_failure(&query.symbol, e.to_string()))?;

            // the API reports unknown symbols as a 404 with a JSON error body
            if !status.is_success() && !body.contains("\"chart\"") {
                return Err(DashboardError::fetch_failure(
                    &query.symbol,
                    format!("HTTP {}", status),
                ));
            }

            decode_chart_response(&query.symbol, query.interval, &body)
        }

        fn list_symbols(&self, _interval: Interval) -> Result<Vec<String>, DashboardError> {
            Err(DashboardError::fetch_failure(
                "*",
                "symbol listing is not supported by Yahoo Finance",
            ))
        }
    }
}
