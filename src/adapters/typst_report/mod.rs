//! Typst dashboard report generation.
//!
//! Reads a Typst template (either the built-in default or a custom file via
//! `template_path`), resolves all `{{PLACEHOLDER}}` markers by calling helpers
//! from `chart_svg` and `tables`, and writes the final `.typ` file.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use crate::domain::dashboard::Analysis;
use crate::domain::error::DashboardError;
use crate::domain::metrics::compute_period_returns;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup ready to be written to a `.typ` file.
pub fn resolve(template: &str, analysis: &Analysis) -> String {
    let crossover = &analysis.crossover;

    let price_svg = chart_svg::generate_price_svg(&analysis.prices, &analysis.overlay);
    let histogram_svg = chart_svg::generate_histogram_svg(&analysis.histogram);
    let equity_svg = chart_svg::generate_equity_svg(&crossover.result.equity_curve);

    let monthly = tables::render_monthly_returns(&compute_period_returns(
        &crossover.result.equity_curve,
    ));
    let monthly = if monthly.is_empty() {
        "_Insufficient data for monthly returns._".to_string()
    } else {
        monthly
    };

    let replacements = [
        ("{{HEADER}}", tables::render_header(analysis)),
        (
            "{{PRICE_CHART_SVG}}",
            chart_svg::embed_svg(&price_svg, "_No price data._"),
        ),
        (
            "{{STATS_TABLE}}",
            tables::render_stats_table(analysis.stats.as_ref()),
        ),
        (
            "{{NORMALITY}}",
            tables::render_normality(analysis.normality.as_ref()),
        ),
        (
            "{{HISTOGRAM_SVG}}",
            chart_svg::embed_svg(&histogram_svg, "_No return distribution._"),
        ),
        (
            "{{BACKTEST_SUMMARY}}",
            tables::render_backtest_summary(analysis),
        ),
        (
            "{{EQUITY_CURVE_SVG}}",
            chart_svg::embed_svg(&equity_svg, "_No equity data._"),
        ),
        (
            "{{TRADE_LOG}}",
            tables::render_trade_log(&analysis.metrics.trades),
        ),
        ("{{MONTHLY_RETURNS}}", monthly),
    ];

    replacements
        .iter()
        .fold(template.to_string(), |output, (placeholder, value)| {
            output.replace(placeholder, value)
        })
}

/// Writes a Typst report, optionally from a custom template file.
#[derive(Debug, Clone, Default)]
pub struct TypstReportAdapter {
    template_path: Option<PathBuf>,
}

impl TypstReportAdapter {
    pub fn new(template_path: Option<PathBuf>) -> Self {
        Self { template_path }
    }

    fn load_template(&self) -> Result<String, DashboardError> {
        match &self.template_path {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(&self, analysis: &Analysis, output_path: &Path) -> Result<(), DashboardError> {
        let template = self.load_template()?;
        let content = resolve(&template, analysis);
        fs::write(output_path, content)?;
        tracing::info!(path = %output_path.display(), "report written");
        Ok(())
    }
}
