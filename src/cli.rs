//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::cached_data_port::CachedDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_cache::MemoryCache;
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::{self, validate_config};
use crate::domain::dashboard::{Analysis, AnalysisConfig, analyze};
use crate::domain::error::DashboardError;
use crate::domain::ohlcv::Interval;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{PriceDataPort, PriceQuery};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "quantdash",
    about = "Price statistics and moving-average crossover backtests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch prices, compute statistics, run the crossover backtest and write a report
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        overrides: AnalysisOverrides,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without fetching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available from the configured data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        interval: Option<String>,
    },
}

/// Command-line values that take precedence over the `[analysis]` section.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct AnalysisOverrides {
    #[arg(long)]
    pub symbol: Option<String>,
    /// Start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start: Option<String>,
    /// End date (YYYY-MM-DD, exclusive)
    #[arg(long)]
    pub end: Option<String>,
    /// 1d, 1h or 15m
    #[arg(long)]
    pub interval: Option<String>,
    /// arithmetic or log
    #[arg(long)]
    pub method: Option<String>,
}

impl AnalysisOverrides {
    pub fn apply(&self, config: &mut FileConfigAdapter) {
        let pairs = [
            ("symbol", &self.symbol),
            ("start_date", &self.start),
            ("end_date", &self.end),
            ("interval", &self.interval),
            ("return_method", &self.method),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                config.set("analysis", key, value);
            }
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            overrides,
            output,
        } => run_analyze(&config, &overrides, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, interval } => {
            run_list_symbols(&config, interval.as_deref())
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DashboardError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, DashboardError> {
    Ok(AnalysisConfig {
        method: config_validation::return_method(config)?,
        overlay_window: config_validation::positive_int(config, "analysis", "overlay_window", 20)?,
        histogram_bins: config_validation::positive_int(config, "analysis", "histogram_bins", 50)?,
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
        backtest: BacktestConfig {
            initial_capital: config.get_double("backtest", "initial_capital", 1000.0),
            fast_window: config_validation::positive_int(config, "backtest", "fast_window", 20)?,
            slow_window: config_validation::positive_int(config, "backtest", "slow_window", 50)?,
        },
    })
}

pub fn build_query(config: &dyn ConfigPort, today: NaiveDate) -> Result<PriceQuery, DashboardError> {
    let symbol = config_validation::symbol(config)?;
    let (start, end) = config_validation::date_range(config, today)?;
    let interval = config_validation::interval(config)?;
    Ok(PriceQuery::new(&symbol, start, end, interval))
}

/// The configured data source, wrapped in the TTL cache.
pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn PriceDataPort>, DashboardError> {
    let ttl = Duration::from_secs(config.get_int("data", "cache_ttl_secs", 3600).max(0) as u64);
    let cache = MemoryCache::with_ttl(ttl);

    match config_validation::data_source(config)?.as_str() {
        "yahoo" => build_yahoo_port(config, cache),
        _ => {
            let dir = config
                .get_non_empty("data", "csv_dir")
                .unwrap_or_else(|| "./data".to_string());
            Ok(Box::new(CachedDataPort::new(
                CsvAdapter::new(PathBuf::from(dir)),
                cache,
            )))
        }
    }
}

#[cfg(feature = "yahoo")]
fn build_yahoo_port(
    config: &dyn ConfigPort,
    cache: MemoryCache,
) -> Result<Box<dyn PriceDataPort>, DashboardError> {
    use crate::adapters::yahoo_adapter::YahooAdapter;

    let timeout = Duration::from_secs(config.get_int("data", "timeout_secs", 10).max(1) as u64);
    Ok(Box::new(CachedDataPort::new(YahooAdapter::new(timeout)?, cache)))
}

#[cfg(not(feature = "yahoo"))]
fn build_yahoo_port(
    _config: &dyn ConfigPort,
    _cache: MemoryCache,
) -> Result<Box<dyn PriceDataPort>, DashboardError> {
    Err(DashboardError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "yahoo source requires building with the `yahoo` feature".into(),
    })
}

/// Validate, fetch and analyse. A fetch failure aborts before any computation.
pub fn run_pipeline(
    config: &dyn ConfigPort,
    data_port: &dyn PriceDataPort,
    today: NaiveDate,
) -> Result<Analysis, DashboardError> {
    validate_config(config, today)?;
    let query = build_query(config, today)?;
    let analysis_config = build_analysis_config(config)?;

    let prices = data_port.fetch_prices(&query)?;
    tracing::info!(query = %query, bars = prices.len(), "prices fetched");

    analyze(prices, &analysis_config)
}

fn run_analyze(
    config_path: &Path,
    overrides: &AnalysisOverrides,
    output_path: Option<&Path>,
) -> ExitCode {
    tracing::info!(path = %config_path.display(), "loading config");
    let mut config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    overrides.apply(&mut config);

    let result = build_data_port(&config)
        .and_then(|port| run_pipeline(&config, port.as_ref(), today()));

    let analysis = match result {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            if matches!(e, DashboardError::FetchFailure { .. }) {
                eprintln!(
                    "hint: check the symbol, the date range and the [data] source settings"
                );
            }
            return (&e).into();
        }
    };

    print_summary(&analysis);

    let output = output_path
        .map(Path::to_path_buf)
        .or_else(|| config.get_non_empty("report", "output").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("report.typ"));
    let reporter = TypstReportAdapter::new(
        config
            .get_non_empty("report", "template_path")
            .map(PathBuf::from),
    );

    match reporter.write(&analysis, &output) {
        Ok(()) => {
            println!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

pub fn print_summary(analysis: &Analysis) {
    let prices = &analysis.prices;
    println!(
        "=== {} ({}, {} bars, {} to {}) ===",
        prices.symbol(),
        prices.interval(),
        prices.len(),
        prices.first_timestamp().format("%Y-%m-%d"),
        prices.last_timestamp().format("%Y-%m-%d")
    );

    println!("\n--- {} returns ---", analysis.config.method);
    match &analysis.stats {
        Some(stats) => {
            for (label, value) in stats.labelled() {
                println!("{:<10} {:>12.6}", label, value);
            }
        }
        None => println!("insufficient data for statistics"),
    }
    if let Some(test) = &analysis.normality {
        println!(
            "Jarque-Bera {:.4} (p = {:.4}): {:?}",
            test.statistic, test.p_value, test.verdict
        );
    }
    if !analysis.returns.invalid.is_empty() {
        println!(
            "{} return(s) could not be computed",
            analysis.returns.invalid.len()
        );
    }

    let bt = &analysis.config.backtest;
    let m = &analysis.metrics;
    println!(
        "\n--- SMA({}) / SMA({}) crossover ---",
        bt.fast_window, bt.slow_window
    );
    for (label, value) in analysis.crossover.result.summary() {
        println!("{:<16} {:>12.2}", label, value);
    }
    println!("{:<16} {:>11.2}%", "Annualized", m.annualized_return * 100.0);
    println!("{:<16} {:>12.2}", "Sharpe Ratio", m.sharpe_ratio);
    println!("{:<16} {:>12.2}", "Sortino Ratio", m.sortino_ratio);
    println!("{:<16} {:>11.1}%", "Max Drawdown", -m.max_drawdown * 100.0);
    println!("{:<16} {:>11.1}%", "Exposure", m.exposure * 100.0);
    println!("{:<16} {:>12}", "Trades", m.trades.len());
    println!("{:<16} {:>11.1}%", "Win Rate", m.win_rate * 100.0);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let today = today();
    let checked = validate_config(&config, today)
        .and_then(|()| Ok((build_query(&config, today)?, build_analysis_config(&config)?)));
    let (query, analysis_config) = match checked {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let source = config_validation::data_source(&config).unwrap_or_default();
    println!("query:     {}", query);
    println!("source:    {}", source);
    println!("returns:   {}", analysis_config.method);
    println!("overlay:   SMA({})", analysis_config.overlay_window);
    println!(
        "crossover: SMA({}) / SMA({}), capital {:.2}",
        analysis_config.backtest.fast_window,
        analysis_config.backtest.slow_window,
        analysis_config.backtest.initial_capital
    );
    println!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path, interval: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = interval
        .map(|s| {
            s.parse::<Interval>()
                .map_err(|reason| DashboardError::ConfigInvalid {
                    section: "analysis".into(),
                    key: "interval".into(),
                    reason,
                })
        })
        .unwrap_or_else(|| config_validation::interval(&config))
        .and_then(|interval| {
            config_validation::validate_data_config(&config)?;
            build_data_port(&config)?.list_symbols(interval)
        });

    match result {
        Ok(symbols) if symbols.is_empty() => {
            eprintln!("No symbols found");
            ExitCode::SUCCESS
        }
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols found", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
