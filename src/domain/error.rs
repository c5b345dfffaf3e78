//! Domain error types.

use chrono::NaiveDateTime;

/// A return element that could not be computed from its pair of closes.
///
/// Recorded per element by the return calculator; the affected element is left
/// undefined and the rest of the series is still computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid price at index {index} ({timestamp}): {reason} (previous close {previous_close}, close {close})")]
pub struct InvalidPriceError {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub previous_close: f64,
    pub close: f64,
    pub reason: String,
}

/// Top-level error type for quantdash.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("could not fetch data for {symbol}: {reason}")]
    FetchFailure { symbol: String, reason: String },

    #[error("price series for {symbol} is empty")]
    EmptySeries { symbol: String },

    #[error("malformed price record at row {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("timestamps are not strictly increasing at row {index}")]
    UnorderedTimestamps { index: usize },

    #[error("moving-average window must be at least 1, got {window}")]
    InvalidWindow { window: usize },

    #[error("series length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("initial capital must be positive and finite, got {capital}")]
    InvalidCapital { capital: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn fetch_failure(symbol: &str, reason: impl Into<String>) -> Self {
        DashboardError::FetchFailure {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::Io(_) => 1,
            DashboardError::ConfigParse { .. }
            | DashboardError::ConfigMissing { .. }
            | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::InvalidWindow { .. }
            | DashboardError::LengthMismatch { .. }
            | DashboardError::InvalidCapital { .. } => 4,
            DashboardError::FetchFailure { .. }
            | DashboardError::EmptySeries { .. }
            | DashboardError::MalformedRecord { .. }
            | DashboardError::UnorderedTimestamps { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
