//! Table formatting for reports.
//!
//! Typst markup for:
//! - Report header (symbol, range, configuration)
//! - Descriptive statistics and normality verdict
//! - Backtest summary and trade log
//! - Monthly returns heatmap grid

use crate::domain::dashboard::Analysis;
use crate::domain::metrics::{Metrics, PeriodReturn, Trade};
use crate::domain::stats::{Normality, NormalityTest, Stats};
use std::collections::BTreeMap;

const INSUFFICIENT_DATA: &str = "_Insufficient data for statistics._";

pub fn render_header(analysis: &Analysis) -> String {
    let prices = &analysis.prices;
    let config = &analysis.config;
    let range = format!(
        "{} to {}",
        prices.first_timestamp().format("%Y-%m-%d"),
        prices.last_timestamp().format("%Y-%m-%d")
    );

    let mut out = format!("= {} Dashboard\n\n", prices.symbol());
    out.push_str("#table(\n  columns: 2,\n  [*Property*], [*Value*],\n");
    for (label, value) in [
        ("Symbol", prices.symbol().to_string()),
        ("Interval", prices.interval().to_string()),
        ("Range", range),
        ("Bars", prices.len().to_string()),
        ("Return Method", config.method.to_string()),
        ("Overlay", format!("SMA({})", config.overlay_window)),
        (
            "Crossover",
            format!(
                "SMA({}) / SMA({})",
                config.backtest.fast_window, config.backtest.slow_window
            ),
        ),
    ] {
        out.push_str(&format!("  [{}], [{}],\n", label, value));
    }
    out.push_str(")\n");
    out
}

pub fn render_stats_table(stats: Option<&Stats>) -> String {
    let Some(stats) = stats else {
        return INSUFFICIENT_DATA.to_string();
    };

    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    out.push_str("  [*Statistic*], [*Value*],\n");
    out.push_str(&format!("  [Observations], [{}],\n", stats.count));
    for (label, value) in stats.labelled() {
        out.push_str(&format!("  [{}], [{:.6}],\n", label, value));
    }
    out.push(')');
    out
}

pub fn render_normality(test: Option<&NormalityTest>) -> String {
    let Some(test) = test else {
        return INSUFFICIENT_DATA.to_string();
    };

    let (verdict, color) = match test.verdict {
        Normality::Normal => ("Normal", "green"),
        Normality::NotNormal => ("Not Normal", "red"),
    };
    format!(
        "Jarque-Bera statistic: {:.4}, p-value: {:.4}. Verdict: #text(fill: {}, [*{}*])",
        test.statistic, test.p_value, color, verdict
    )
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn render_backtest_summary(analysis: &Analysis) -> String {
    let result = &analysis.crossover.result;
    let m: &Metrics = &analysis.metrics;

    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    out.push_str("  [*Metric*], [*Value*],\n");
    out.push_str(&format!(
        "  [Initial Capital], [{:.2}],\n",
        result.initial_capital
    ));
    for (label, value) in result.summary() {
        out.push_str(&format!("  [{}], [{:.2}],\n", label, value));
    }
    let rows = [
        ("Annualized Return", fmt_pct(m.annualized_return)),
        ("Sharpe Ratio", format!("{:.2}", m.sharpe_ratio)),
        ("Sortino Ratio", format!("{:.2}", m.sortino_ratio)),
        ("Max Drawdown", fmt_pct(m.max_drawdown)),
        (
            "Max Drawdown Duration",
            format!("{} bars", m.max_drawdown_duration),
        ),
        ("Exposure", fmt_pct(m.exposure)),
        ("Trades", m.trades.len().to_string()),
        ("Win Rate", fmt_pct(m.win_rate)),
    ];
    for (label, value) in rows {
        out.push_str(&format!("  [{}], [{}],\n", label, value));
    }
    out.push(')');
    out
}

pub fn render_trade_log(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "No trades executed.".to_string();
    }

    let mut out = String::from("#table(\n  columns: 6,\n");
    out.push_str("  [*#*], [*Entry*], [*Exit*], [*Bars*], [*Return*], [*Status*],\n");
    for (i, trade) in trades.iter().enumerate() {
        let ret = trade.return_pct();
        let color = if ret >= 0.0 { "green" } else { "red" };
        out.push_str(&format!(
            "  [{}], [{}], [{}], [{}], text(fill: {}, [{}]), [{}],\n",
            i + 1,
            trade.entry.format("%Y-%m-%d %H:%M"),
            trade.exit.format("%Y-%m-%d %H:%M"),
            trade.bars_held,
            color,
            fmt_pct(ret),
            if trade.open { "open" } else { "closed" }
        ));
    }
    out.push(')');
    out
}

pub fn render_monthly_returns(returns: &[PeriodReturn]) -> String {
    if returns.is_empty() {
        return String::new();
    }

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for r in returns {
        let entry = years.entry(r.year).or_insert([None; 12]);
        if let Some(slot) = entry.get_mut(r.month as usize - 1) {
            *slot = Some(r.return_pct);
        }
    }

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: 14,\n");
    output.push_str("  [*Year*], [*Jan*], [*Feb*], [*Mar*], [*Apr*], [*May*], [*Jun*], ");
    output.push_str("[*Jul*], [*Aug*], [*Sep*], [*Oct*], [*Nov*], [*Dec*], [*YTD*],\n");

    for (year, monthly) in years.iter() {
        output.push_str(&format!("  [{}],", year));

        let mut ytd = 1.0_f64;
        for &opt_ret in monthly.iter() {
            if let Some(ret) = opt_ret {
                ytd *= 1.0 + ret;
                output.push_str(&format!(" {},", format_heatmap_cell(ret)));
            } else {
                output.push_str(" [-],");
            }
        }
        output.push_str(&format!(" {},\n", format_heatmap_cell(ytd - 1.0)));
    }

    output.push(')');
    output
}

/// Returns (fill_color, needs_white_text) for a given return value.
fn return_color(ret: f64) -> (&'static str, bool) {
    if ret >= 0.10 {
        ("rgb(\"#006400\")", true)
    } else if ret >= 0.05 {
        ("rgb(\"#228B22\")", true)
    } else if ret >= 0.02 {
        ("rgb(\"#90EE90\")", false)
    } else if ret > 0.0 {
        ("rgb(\"#E0FFE0\")", false)
    } else if ret == 0.0 {
        ("rgb(\"#FFFFFF\")", false)
    } else if ret > -0.02 {
        ("rgb(\"#FFE0E0\")", false)
    } else if ret > -0.05 {
        ("rgb(\"#FF9090\")", false)
    } else if ret > -0.10 {
        ("rgb(\"#FF4444\")", true)
    } else {
        ("rgb(\"#8B0000\")", true)
    }
}

fn format_heatmap_cell(ret: f64) -> String {
    let (color, white_text) = return_color(ret);
    let formatted = format!("{:+.1}%", ret * 100.0);
    if white_text {
        format!("box(fill: {}, text(fill: white, [{}]))", color, formatted)
    } else {
        format!("box(fill: {}, [{}])", color, formatted)
    }
}
