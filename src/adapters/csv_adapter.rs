//! CSV file price data adapter.
//!
//! One file per symbol and interval: `<dir>/<SYMBOL>_<interval>.csv`.
//! Columns are found by header name (case-insensitive), so exports with extra
//! columns such as `Adj Close` or `Volume` load unchanged.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::{Interval, PriceBar, PriceSeries};
use crate::ports::data_port::{PriceDataPort, PriceQuery};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_HEADERS: [&str; 3] = ["timestamp", "datetime", "date"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, interval.code()))
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, DashboardError> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |name: &str| normalized.iter().position(|h| h == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| DashboardError::MalformedRecord {
            index: 0,
            reason: format!("missing {} column", name),
        })
    };

    let timestamp = TIMESTAMP_HEADERS
        .iter()
        .find_map(|name| find(name))
        .ok_or_else(|| DashboardError::MalformedRecord {
            index: 0,
            reason: "missing timestamp column".into(),
        })?;

    Ok(Columns {
        timestamp,
        open: require("open")?,
        high: require("high")?,
        low: require("low")?,
        close: require("close")?,
    })
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field(
    record: &csv::StringRecord,
    column: usize,
    name: &str,
    row: usize,
) -> Result<f64, DashboardError> {
    let raw = record
        .get(column)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DashboardError::MalformedRecord {
            index: row,
            reason: format!("missing {} value", name),
        })?;
    raw.parse().map_err(|e| DashboardError::MalformedRecord {
        index: row,
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })
}

impl PriceDataPort for CsvAdapter {
    fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceSeries, DashboardError> {
        let path = self.csv_path(&query.symbol, query.interval);
        let content = fs::read_to_string(&path).map_err(|e| {
            DashboardError::fetch_failure(
                &query.symbol,
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| DashboardError::MalformedRecord {
            index: 0,
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = locate_columns(headers)?;

        let start = query.start.and_hms_opt(0, 0, 0);
        let end = query.end.and_hms_opt(0, 0, 0);
        let mut bars = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| DashboardError::MalformedRecord {
                index: row,
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = record.get(columns.timestamp).unwrap_or_default();
            let timestamp =
                parse_timestamp(raw_ts).ok_or_else(|| DashboardError::MalformedRecord {
                    index: row,
                    reason: format!("invalid timestamp '{}'", raw_ts),
                })?;

            if start.is_some_and(|s| timestamp < s) || end.is_some_and(|e| timestamp >= e) {
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                open: parse_field(&record, columns.open, "open", row)?,
                high: parse_field(&record, columns.high, "high", row)?,
                low: parse_field(&record, columns.low, "low", row)?,
                close: parse_field(&record, columns.close, "close", row)?,
            });
        }

        if bars.is_empty() {
            return Err(DashboardError::fetch_failure(
                &query.symbol,
                format!("no rows in range [{}, {})", query.start, query.end),
            ));
        }

        bars.sort_by_key(|b| b.timestamp);
        tracing::info!(query = %query, bars = bars.len(), path = %path.display(), "loaded CSV prices");
        PriceSeries::new(query.symbol.clone(), query.interval, bars)
    }

    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, DashboardError> {
        let entries = fs::read_dir(&self.base_path)?;

        let suffix = format!("_{}.csv", interval.code());
        let mut symbols = Vec::new();

        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
