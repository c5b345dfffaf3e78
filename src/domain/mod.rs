//! Core domain types and logic.

pub mod ohlcv;
pub mod returns;
pub mod stats;
pub mod indicator;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod dashboard;
pub mod config_validation;
pub mod error;
