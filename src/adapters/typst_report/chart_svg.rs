//! SVG chart rendering for reports.
//!
//! Every generator returns an empty string when there is nothing to draw; the
//! caller substitutes a placeholder note.

use crate::domain::backtest::EquityPoint;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::stats::HistogramBin;
use chrono::NaiveDateTime;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const BULL_COLOR: &str = "#16a34a";
const BEAR_COLOR: &str = "#dc2626";
const LINE_COLOR: &str = "#2563eb";
const OVERLAY_COLOR: &str = "#f59e0b";

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// Linear map from a value range onto the plot's vertical extent.
struct YAxis {
    min: f64,
    range: f64,
}

impl YAxis {
    fn new(min: f64, max: f64) -> Self {
        let range = max - min;
        Self {
            min,
            range: if range > 0.0 { range } else { 1.0 },
        }
    }

    fn y(&self, v: f64) -> f64 {
        MARGIN_TOP + plot_height() - ((v - self.min) / self.range) * plot_height()
    }
}

fn open_svg(title: &str) -> String {
    let mut svg = format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    );
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH, title
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg
}

fn y_labels(svg: &mut String, max: String, mid: String, min: String) {
    for (y, label) in [
        (MARGIN_TOP + 5.0, max),
        (MARGIN_TOP + plot_height() / 2.0, mid),
        (CHART_HEIGHT - MARGIN_BOTTOM - 5.0, min),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            label
        ));
    }
}

fn x_labels(svg: &mut String, first: String, mid: String, last: String) {
    for (x, label) in [
        (MARGIN_LEFT, first),
        (MARGIN_LEFT + plot_width() / 2.0, mid),
        (CHART_WIDTH - MARGIN_RIGHT, last),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x, CHART_HEIGHT, label
        ));
    }
}

fn date_labels(timestamps: &[NaiveDateTime]) -> (String, String, String) {
    let fmt = |t: &NaiveDateTime| t.format("%Y-%m-%d").to_string();
    match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => (
            fmt(first),
            fmt(&timestamps[timestamps.len() / 2]),
            fmt(last),
        ),
        _ => Default::default(),
    }
}

/// Candlesticks with the overlay moving average drawn on top.
pub fn generate_price_svg(prices: &PriceSeries, overlay: &IndicatorSeries) -> String {
    let bars = prices.bars();
    if bars.is_empty() {
        return String::new();
    }

    let min_price = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let max_price = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let axis = YAxis::new(min_price, max_price);

    let slot = plot_width() / bars.len() as f64;
    let body_width = (slot * 0.7).max(0.5);
    let x_center = |i: usize| MARGIN_LEFT + slot * (i as f64 + 0.5);

    let mut svg = open_svg(&format!("{} ({})", prices.symbol(), prices.interval()));
    y_labels(
        &mut svg,
        format!("{:.2}", max_price),
        format!("{:.2}", (max_price + min_price) / 2.0),
        format!("{:.2}", min_price),
    );
    let timestamps: Vec<NaiveDateTime> = prices.timestamps().collect();
    let (first, mid, last) = date_labels(&timestamps);
    x_labels(&mut svg, first, mid, last);

    for (i, bar) in bars.iter().enumerate() {
        let color = if bar.is_bullish() { BULL_COLOR } else { BEAR_COLOR };
        let x = x_center(i);
        let body_top = axis.y(bar.open.max(bar.close));
        let body_bottom = axis.y(bar.open.min(bar.close));
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            x,
            axis.y(bar.high),
            x,
            axis.y(bar.low),
            color
        ));
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>\n",
            x - body_width / 2.0,
            body_top,
            body_width,
            (body_bottom - body_top).max(0.5),
            color
        ));
    }

    let mut path_data = String::new();
    for (i, point) in overlay.values.iter().enumerate() {
        if let Some(v) = point.value {
            let cmd = if path_data.is_empty() { "M" } else { " L" };
            path_data.push_str(&format!("{} {:.1} {:.1}", cmd, x_center(i), axis.y(v)));
        }
    }
    if !path_data.is_empty() {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            path_data, OVERLAY_COLOR
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"15\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            MARGIN_LEFT, OVERLAY_COLOR, overlay.indicator_type
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Return distribution bars.
pub fn generate_histogram_svg(bins: &[HistogramBin]) -> String {
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return String::new();
    };
    if max_count == 0 {
        return String::new();
    }

    let axis = YAxis::new(0.0, max_count as f64);
    let slot = plot_width() / bins.len() as f64;

    let mut svg = open_svg("Return distribution");
    y_labels(
        &mut svg,
        max_count.to_string(),
        format!("{:.0}", max_count as f64 / 2.0),
        "0".to_string(),
    );
    x_labels(
        &mut svg,
        format!("{:.2}%", first.lower * 100.0),
        format!("{:.2}%", (first.lower + last.upper) / 2.0 * 100.0),
        format!("{:.2}%", last.upper * 100.0),
    );

    for (i, bin) in bins.iter().enumerate() {
        if bin.count == 0 {
            continue;
        }
        let top = axis.y(bin.count as f64);
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"white\" stroke-width=\"0.5\"/>\n",
            MARGIN_LEFT + slot * i as f64,
            top,
            slot,
            CHART_HEIGHT - MARGIN_BOTTOM - top,
            LINE_COLOR
        ));
    }

    svg.push_str("</svg>");
    svg
}

pub fn generate_equity_svg(equity_curve: &[EquityPoint]) -> String {
    if equity_curve.is_empty() {
        return String::new();
    }

    let min_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(f64::INFINITY, f64::min);
    let max_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(f64::NEG_INFINITY, f64::max);
    let axis = YAxis::new(min_equity, max_equity);

    let x_scale = |i: usize| -> f64 {
        MARGIN_LEFT + (i as f64 / (equity_curve.len() - 1).max(1) as f64) * plot_width()
    };

    let mut path_data = String::new();
    for (i, point) in equity_curve.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        path_data.push_str(&format!("{} {:.1} {:.1}", cmd, x_scale(i), axis.y(point.equity)));
    }

    let mut svg = open_svg("Equity ($)");
    y_labels(
        &mut svg,
        format!("{:.2}", max_equity),
        format!("{:.2}", (max_equity + min_equity) / 2.0),
        format!("{:.2}", min_equity),
    );
    let timestamps: Vec<NaiveDateTime> = equity_curve.iter().map(|p| p.timestamp).collect();
    let (first, mid, last) = date_labels(&timestamps);
    x_labels(&mut svg, first, mid, last);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        path_data, LINE_COLOR
    ));
    svg.push_str("</svg>");
    svg
}

/// Wrap SVG markup in a Typst `image.decode` call, or return `fallback`.
pub fn embed_svg(svg: &str, fallback: &str) -> String {
    if svg.is_empty() {
        return fallback.to_string();
    }
    format!(
        "#image.decode(\n\"{}\",\n  width: 100%,\n)",
        svg.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::moving_average;
    use crate::domain::ohlcv::{Interval, PriceBar};
    use chrono::NaiveDate;

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(i as i64)
    }

    fn prices() -> PriceSeries {
        let bars = [(10.0, 12.0), (12.0, 11.0), (11.0, 13.0)]
            .iter()
            .enumerate()
            .map(|(i, &(open, close))| PriceBar {
                timestamp: ts(i),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
            })
            .collect();
        PriceSeries::new("BHP", Interval::Daily, bars).unwrap()
    }

    #[test]
    fn price_chart_has_candles_and_overlay() {
        let p = prices();
        let overlay = moving_average(&p, 2).unwrap();
        let svg = generate_price_svg(&p, &overlay);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(BULL_COLOR).count(), 4);
        assert_eq!(svg.matches(BEAR_COLOR).count(), 2);
        assert!(svg.contains("SMA(2)"));
        assert!(svg.contains("BHP (1d)"));
    }

    #[test]
    fn price_chart_without_defined_overlay_has_no_path() {
        let p = prices();
        let overlay = moving_average(&p, 10).unwrap();
        let svg = generate_price_svg(&p, &overlay);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn histogram_empty_and_filled() {
        assert!(generate_histogram_svg(&[]).is_empty());
        let bins = vec![
            HistogramBin { lower: -0.01, upper: 0.0, count: 3 },
            HistogramBin { lower: 0.0, upper: 0.01, count: 0 },
            HistogramBin { lower: 0.01, upper: 0.02, count: 1 },
        ];
        let svg = generate_histogram_svg(&bins);
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("-1.00%"));
    }

    #[test]
    fn equity_chart_has_path() {
        let curve: Vec<EquityPoint> = (0..3)
            .map(|i| EquityPoint {
                timestamp: ts(i),
                equity: 1000.0 + i as f64 * 10.0,
            })
            .collect();
        let svg = generate_equity_svg(&curve);
        assert!(svg.contains("<path d=\"M 60.0"));
        assert!(svg.contains("2024-01-03"));
        assert!(generate_equity_svg(&[]).is_empty());
    }

    #[test]
    fn embed_escapes_quotes() {
        assert_eq!(embed_svg("", "_none_"), "_none_");
        let typst = embed_svg(r#"<svg a="1"/>"#, "_none_");
        assert!(typst.starts_with("#image.decode("));
        assert!(typst.contains(r#"a=\"1\""#));
    }
}
