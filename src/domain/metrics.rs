//! Performance metrics for a crossover backtest.

use crate::domain::backtest::{BacktestResult, EquityPoint};
use crate::domain::ohlcv::Interval;
use crate::domain::signal::{Position, SignalSeries};
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;

/// A round trip of the crossover strategy: long from the close where the
/// signal turned Long until the close where it turned Flat.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry: NaiveDateTime,
    pub exit: NaiveDateTime,
    pub entry_equity: f64,
    pub exit_equity: f64,
    pub bars_held: usize,
    /// Still long at the last bar; closed at the final equity.
    pub open: bool,
}

impl Trade {
    pub fn return_pct(&self) -> f64 {
        if self.entry_equity > 0.0 {
            (self.exit_equity - self.entry_equity) / self.entry_equity
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub exposure: f64,
    pub trades: Vec<Trade>,
    pub win_rate: f64,
}

impl Metrics {
    pub fn compute(
        result: &BacktestResult,
        signals: &SignalSeries,
        interval: Interval,
        risk_free_rate: f64,
    ) -> Self {
        let equity_curve = &result.equity_curve;
        let initial_capital = result.initial_capital;
        let final_equity = result.final_equity();

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let periods_per_year = interval.periods_per_year();
        let years = equity_curve.len().saturating_sub(1) as f64 / periods_per_year;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let period_rf = risk_free_rate / periods_per_year;
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(equity_curve, period_rf, periods_per_year);

        let exposure = compute_exposure(signals);
        let trades = extract_trades(signals, equity_curve);

        let closed: Vec<&Trade> = trades.iter().filter(|t| !t.open).collect();
        let win_rate = if closed.is_empty() {
            0.0
        } else {
            closed.iter().filter(|t| t.return_pct() > 0.0).count() as f64 / closed.len() as f64
        };

        Metrics {
            final_equity,
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            exposure,
            trades,
            win_rate,
        }
    }
}

/// Compounded return of one calendar month of the equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturn {
    pub year: i32,
    pub month: u32,
    pub return_pct: f64,
}

/// Calendar-month returns, each measured against the previous month's closing
/// equity. The first month is measured against the first point of the curve.
pub fn compute_period_returns(equity_curve: &[EquityPoint]) -> Vec<PeriodReturn> {
    let Some(first) = equity_curve.first() else {
        return Vec::new();
    };

    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in equity_curve {
        month_end.insert((point.timestamp.year(), point.timestamp.month()), point.equity);
    }

    let mut reference = first.equity;
    month_end
        .into_iter()
        .map(|((year, month), end_equity)| {
            let return_pct = if reference > 0.0 {
                (end_equity - reference) / reference
            } else {
                0.0
            };
            reference = end_equity;
            PeriodReturn {
                year,
                month,
                return_pct,
            }
        })
        .collect()
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(
    equity_curve: &[EquityPoint],
    period_rf: f64,
    periods_per_year: f64,
) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - period_rf;
    let annualize = periods_per_year.sqrt();

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * annualize
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < period_rf)
        .map(|&r| (r - period_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * annualize
    } else {
        0.0
    };

    (sharpe, sortino)
}

/// Fraction of periods that earned the strategy return (lagged position Long).
fn compute_exposure(signals: &SignalSeries) -> f64 {
    if signals.len() < 2 {
        return 0.0;
    }
    let held = signals.points[..signals.len() - 1]
        .iter()
        .filter(|p| p.position == Position::Long)
        .count();
    held as f64 / (signals.len() - 1) as f64
}

fn extract_trades(signals: &SignalSeries, equity_curve: &[EquityPoint]) -> Vec<Trade> {
    let n = signals.len().min(equity_curve.len());
    let mut trades = Vec::new();
    let mut entry: Option<usize> = None;

    for i in 0..n {
        match (signals.points[i].position, entry) {
            (Position::Long, None) => entry = Some(i),
            (Position::Flat, Some(start)) => {
                trades.push(make_trade(equity_curve, start, i, false));
                entry = None;
            }
            _ => {}
        }
    }

    if let Some(start) = entry {
        trades.push(make_trade(equity_curve, start, n - 1, true));
    }

    trades
}

fn make_trade(equity_curve: &[EquityPoint], start: usize, end: usize, open: bool) -> Trade {
    Trade {
        entry: equity_curve[start].timestamp,
        exit: equity_curve[end].timestamp,
        entry_equity: equity_curve[start].equity,
        exit_equity: equity_curve[end].equity,
        bars_held: end - start,
        open,
    }
}
