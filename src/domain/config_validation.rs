//! Configuration validation.
//!
//! Validates all config fields before any data is fetched. Values come from
//! the INI file with command-line overrides already applied.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::Interval;
use crate::domain::returns::ReturnMethod;
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveDate};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
pub const SOURCES: [&str; 2] = ["csv", "yahoo"];

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DashboardError {
    DashboardError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_config(config: &dyn ConfigPort, today: NaiveDate) -> Result<(), DashboardError> {
    validate_data_config(config)?;
    validate_analysis_config(config, today)?;
    validate_backtest_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    data_source(config)?;

    if int_value(config, "data", "cache_ttl_secs", 3600)? < 0 {
        return Err(invalid(
            "data",
            "cache_ttl_secs",
            "cache_ttl_secs must be non-negative",
        ));
    }
    if int_value(config, "data", "timeout_secs", 10)? < 1 {
        return Err(invalid(
            "data",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }
    Ok(())
}

pub fn validate_analysis_config(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<(), DashboardError> {
    symbol(config)?;
    date_range(config, today)?;
    interval(config)?;
    return_method(config)?;
    positive_int(config, "analysis", "overlay_window", 20)?;
    positive_int(config, "analysis", "histogram_bins", 50)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let capital = double_value(config, "backtest", "initial_capital", 1000.0)?;
    if !capital.is_finite() || capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let fast = positive_int(config, "backtest", "fast_window", 20)?;
    let slow = positive_int(config, "backtest", "slow_window", 50)?;
    if fast >= slow {
        return Err(invalid(
            "backtest",
            "fast_window",
            format!("fast_window ({}) must be smaller than slow_window ({})", fast, slow),
        ));
    }

    let rf = double_value(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&rf) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

/// `[data] source`, lowercased; `csv` when absent.
pub fn data_source(config: &dyn ConfigPort) -> Result<String, DashboardError> {
    let source = config
        .get_non_empty("data", "source")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    if SOURCES.contains(&source.as_str()) {
        Ok(source)
    } else {
        Err(invalid(
            "data",
            "source",
            format!("unknown source '{}' (expected csv or yahoo)", source),
        ))
    }
}

pub fn symbol(config: &dyn ConfigPort) -> Result<String, DashboardError> {
    config
        .get_non_empty("analysis", "symbol")
        .ok_or_else(|| DashboardError::ConfigMissing {
            section: "analysis".to_string(),
            key: "symbol".to_string(),
        })
}

pub fn interval(config: &dyn ConfigPort) -> Result<Interval, DashboardError> {
    match config.get_non_empty("analysis", "interval") {
        None => Ok(Interval::Daily),
        Some(s) => s.parse().map_err(|e: String| invalid("analysis", "interval", e)),
    }
}

pub fn return_method(config: &dyn ConfigPort) -> Result<ReturnMethod, DashboardError> {
    match config.get_non_empty("analysis", "return_method") {
        None => Ok(ReturnMethod::Arithmetic),
        Some(s) => s
            .parse()
            .map_err(|e: String| invalid("analysis", "return_method", e)),
    }
}

/// `[analysis] start_date .. end_date`, defaulting to the year before `today`.
pub fn date_range(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), DashboardError> {
    let end = parse_date(config, "end_date")?.unwrap_or(today);
    let start = parse_date(config, "start_date")?
        .unwrap_or_else(|| end - Duration::days(DEFAULT_LOOKBACK_DAYS));

    if start >= end {
        return Err(invalid(
            "analysis",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, DashboardError> {
    config
        .get_non_empty("analysis", key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                invalid(
                    "analysis",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            })
        })
        .transpose()
}

/// Integer value or `default` when absent; a value that does not parse is
/// rejected rather than defaulted.
pub fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, DashboardError> {
    config
        .try_get_int(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|e| invalid(section, key, format!("{} is not an integer: {}", key, e)))
}

pub fn double_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, DashboardError> {
    config
        .try_get_double(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|e| invalid(section, key, format!("{} is not a number: {}", key, e)))
}

pub fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<usize, DashboardError> {
    let value = int_value(config, section, key, default)?;
    if value < 1 {
        return Err(invalid(
            section,
            key,
            format!("{} must be at least 1", key),
        ));
    }
    usize::try_from(value).map_err(|_| invalid(section, key, "value out of range"))
}
