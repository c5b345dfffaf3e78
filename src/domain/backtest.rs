//! Backtest simulator for the moving-average crossover strategy.
//!
//! strategy_return[t] = position[t-1] * return[t]
//! equity[t] = initial_capital * prod_{i<=t}(1 + strategy_return[i])
//!
//! The position is lagged by one period, so the signal observed at the close
//! of t-1 earns the return realised over t-1 -> t. Undefined strategy returns
//! compound as zero.

use crate::domain::error::DashboardError;
use crate::domain::indicator::{IndicatorSeries, moving_average};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::returns::{ReturnPoint, ReturnSeries};
use crate::domain::signal::{SignalSeries, generate_signals};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub fast_window: usize,
    pub slow_window: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1000.0,
            fast_window: 20,
            slow_window: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub strategy_returns: Vec<ReturnPoint>,
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }

    /// (final - initial) / initial * 100
    pub fn performance_pct(&self) -> f64 {
        (self.final_equity() - self.initial_capital) / self.initial_capital * 100.0
    }

    pub fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Final Capital", self.final_equity()),
            ("Performance %", self.performance_pct()),
        ]
    }
}

pub fn simulate(
    signal: &SignalSeries,
    returns: &ReturnSeries,
    initial_capital: f64,
) -> Result<BacktestResult, DashboardError> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(DashboardError::InvalidCapital {
            capital: initial_capital,
        });
    }
    if signal.len() != returns.len() {
        return Err(DashboardError::LengthMismatch {
            left: signal.len(),
            right: returns.len(),
        });
    }

    let mut strategy_returns = Vec::with_capacity(returns.len());
    let mut equity_curve = Vec::with_capacity(returns.len());
    let mut growth = 1.0_f64;

    for (t, point) in returns.points.iter().enumerate() {
        let strategy_return = match (t, point.value) {
            (0, _) | (_, None) => None,
            (_, Some(r)) => Some(signal.position(t - 1).weight() * r),
        };

        growth *= 1.0 + strategy_return.unwrap_or(0.0);

        strategy_returns.push(ReturnPoint {
            timestamp: point.timestamp,
            value: strategy_return,
        });
        equity_curve.push(EquityPoint {
            timestamp: point.timestamp,
            equity: initial_capital * growth,
        });
    }

    Ok(BacktestResult {
        initial_capital,
        strategy_returns,
        equity_curve,
    })
}

/// Everything produced by one crossover run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverRun {
    pub fast: IndicatorSeries,
    pub slow: IndicatorSeries,
    pub signals: SignalSeries,
    pub result: BacktestResult,
}

pub fn run_crossover(
    prices: &PriceSeries,
    returns: &ReturnSeries,
    config: &BacktestConfig,
) -> Result<CrossoverRun, DashboardError> {
    let fast = moving_average(prices, config.fast_window)?;
    let slow = moving_average(prices, config.slow_window)?;
    let signals = generate_signals(&fast, &slow)?;
    let result = simulate(&signals, returns, config.initial_capital)?;

    tracing::debug!(
        symbol = prices.symbol(),
        fast = config.fast_window,
        slow = config.slow_window,
        final_equity = result.final_equity(),
        "crossover backtest complete"
    );

    Ok(CrossoverRun {
        fast,
        slow,
        signals,
        result,
    })
}
