//! Dashboard pipeline: one price series in, every derived series and summary out.
//!
//! price series -> returns -> {stats, normality, histogram}
//! price series -> overlay SMA (chart)
//! price series -> fast/slow SMA -> signals -> backtest (with returns) -> metrics

use crate::domain::backtest::{BacktestConfig, CrossoverRun, run_crossover};
use crate::domain::error::DashboardError;
use crate::domain::indicator::{IndicatorSeries, moving_average};
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::returns::{ReturnMethod, ReturnSeries, compute_returns};
use crate::domain::stats::{HistogramBin, NormalityTest, Stats, compute_stats, histogram, normality_test};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub method: ReturnMethod,
    pub overlay_window: usize,
    pub histogram_bins: usize,
    pub risk_free_rate: f64,
    pub backtest: BacktestConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            method: ReturnMethod::Arithmetic,
            overlay_window: 20,
            histogram_bins: 50,
            risk_free_rate: 0.0,
            backtest: BacktestConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub prices: PriceSeries,
    pub config: AnalysisConfig,
    pub returns: ReturnSeries,
    /// `None` when no return could be computed.
    pub stats: Option<Stats>,
    pub normality: Option<NormalityTest>,
    pub histogram: Vec<HistogramBin>,
    pub overlay: IndicatorSeries,
    pub crossover: CrossoverRun,
    pub metrics: Metrics,
}

pub fn analyze(prices: PriceSeries, config: &AnalysisConfig) -> Result<Analysis, DashboardError> {
    tracing::debug!(
        symbol = prices.symbol(),
        bars = prices.len(),
        method = %config.method,
        "analysing price series"
    );

    let returns = compute_returns(&prices, config.method);
    if !returns.invalid.is_empty() {
        tracing::warn!(
            symbol = prices.symbol(),
            count = returns.invalid.len(),
            "some returns could not be computed and were left undefined"
        );
    }

    let stats = compute_stats(&returns);
    if stats.is_none() {
        tracing::warn!(symbol = prices.symbol(), "insufficient data for statistics");
    }
    let normality = normality_test(&returns);
    let histogram = histogram(&returns, config.histogram_bins);

    let overlay = moving_average(&prices, config.overlay_window)?;
    let crossover = run_crossover(&prices, &returns, &config.backtest)?;
    let metrics = Metrics::compute(
        &crossover.result,
        &crossover.signals,
        prices.interval(),
        config.risk_free_rate,
    );

    Ok(Analysis {
        prices,
        config: config.clone(),
        returns,
        stats,
        normality,
        histogram,
        overlay,
        crossover,
        metrics,
    })
}
