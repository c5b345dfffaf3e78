//! Built-in Typst report template.

const TEMPLATE: &str = r#"#set page(paper: "a4", margin: 2cm)
#set text(size: 10pt)

{{HEADER}}

== Price

{{PRICE_CHART_SVG}}

== Return Statistics

{{STATS_TABLE}}

=== Normality

{{NORMALITY}}

=== Distribution

{{HISTOGRAM_SVG}}

== Moving-Average Crossover Backtest

{{BACKTEST_SUMMARY}}

{{EQUITY_CURVE_SVG}}

=== Trade Log

{{TRADE_LOG}}

=== Monthly Returns

{{MONTHLY_RETURNS}}
"#;

pub fn template() -> &'static str {
    TEMPLATE
}
