//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading with command-line overrides
//! - Validation failures mapped to exit codes
//! - `run_pipeline` against a mock data port
//! - `analyze` end to end with CSV files and INI files on disk

mod common;

use chrono::NaiveDate;
use clap::Parser;
use common::*;
use quantdash::adapters::file_config_adapter::FileConfigAdapter;
use quantdash::cli::{self, AnalysisOverrides, Cli};
use quantdash::domain::error::DashboardError;
use quantdash::domain::returns::ReturnMethod;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

const VALID_INI: &str = r#"
[data]
source = csv
csv_dir = ./data
cache_ttl_secs = 600

[analysis]
symbol = BHP.AX
start_date = 2024-01-01
end_date = 2024-12-31
interval = 1d
return_method = arithmetic
overlay_window = 20

[backtest]
initial_capital = 1000
fast_window = 20
slow_window = 50
risk_free_rate = 0.0

[report]
output = report.typ
"#;

fn exit_code_of(err: &DashboardError) -> String {
    format!("{:?}", ExitCode::from(err))
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_reads_file() {
        let file = write_temp_ini(VALID_INI);
        let config = cli::load_config(file.path()).unwrap();
        let query = cli::build_query(&config, today()).unwrap();
        assert_eq!(query.symbol, "BHP.AX");
        assert_eq!(query.interval, Interval::Daily);
    }

    #[test]
    fn load_config_missing_file_is_error() {
        assert!(cli::load_config(std::path::Path::new("/nonexistent/q.ini")).is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = FileConfigAdapter::from_string(VALID_INI).unwrap();
        AnalysisOverrides {
            symbol: Some("CBA.AX".into()),
            start: Some("2024-06-01".into()),
            end: None,
            interval: Some("15m".into()),
            method: Some("log".into()),
        }
        .apply(&mut config);

        let query = cli::build_query(&config, today()).unwrap();
        assert_eq!(query.symbol, "CBA.AX");
        assert_eq!(query.start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(query.end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(query.interval, Interval::FifteenMinutes);
        assert_eq!(
            cli::build_analysis_config(&config).unwrap().method,
            ReturnMethod::Logarithmic
        );
    }

    #[test]
    fn invalid_override_is_config_error() {
        let mut config = FileConfigAdapter::from_string(VALID_INI).unwrap();
        AnalysisOverrides {
            end: Some("31/12/2024".into()),
            ..Default::default()
        }
        .apply(&mut config);
        let port = MockDataPort::new();
        let err = cli::run_pipeline(&config, &port, today()).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigInvalid { ref key, .. } if key == "end_date"));
        assert_eq!(exit_code_of(&err), format!("{:?}", ExitCode::from(2)));
        assert_eq!(port.calls.get(), 0);
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn run_pipeline_with_mock_port() {
        let config = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let port = MockDataPort::new()
            .with_bars("BHP.AX", daily_bars("2024-01-01", &wave_closes(200)));
        let analysis = cli::run_pipeline(&config, &port, today()).unwrap();
        assert_eq!(analysis.prices.len(), 200);
        assert_eq!(analysis.config.backtest.slow_window, 50);
        assert_eq!(port.calls.get(), 1);
    }

    #[test]
    fn fetch_failure_exits_with_code_five() {
        let config = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let port = MockDataPort::new().with_error("BHP.AX", "HTTP 404");
        let err = cli::run_pipeline(&config, &port, today()).unwrap_err();
        assert!(matches!(err, DashboardError::FetchFailure { .. }));
        assert_eq!(exit_code_of(&err), format!("{:?}", ExitCode::from(5)));
    }

    #[test]
    fn fast_not_below_slow_is_rejected_before_fetch() {
        let mut config = FileConfigAdapter::from_string(VALID_INI).unwrap();
        config.set("backtest", "fast_window", "60");
        let port = MockDataPort::new();
        let err = cli::run_pipeline(&config, &port, today()).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigInvalid { .. }));
        assert_eq!(port.calls.get(), 0);
    }
}

mod end_to_end {
    use super::*;

    fn write_csv(dir: &std::path::Path, symbol: &str, closes: &[f64]) {
        let mut csv = String::from("date,open,high,low,close\n");
        for bar in daily_bars("2024-01-01", closes) {
            writeln!(
                csv,
                "{},{},{},{},{}",
                bar.timestamp.format("%Y-%m-%d"),
                bar.open,
                bar.high,
                bar.low,
                bar.close
            )
            .unwrap();
        }
        fs::write(dir.join(format!("{}_1d.csv", symbol)), csv).unwrap();
    }

    fn ini_for(dir: &std::path::Path) -> String {
        format!(
            "[data]\nsource = csv\ncsv_dir = {}\n\n[analysis]\nsymbol = BHP.AX\n\
             start_date = 2024-01-01\nend_date = 2025-01-01\n\n[report]\noutput = {}\n",
            dir.display(),
            dir.join("report.typ").display()
        )
    }

    #[test]
    fn analyze_writes_report() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "BHP.AX", &wave_closes(150));
        let ini = write_temp_ini(&ini_for(dir.path()));

        let cli = Cli::try_parse_from([
            "quantdash",
            "analyze",
            "-c",
            ini.path().to_str().unwrap(),
        ])
        .unwrap();
        let code = cli::run(cli);
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::SUCCESS));

        let report = fs::read_to_string(dir.path().join("report.typ")).unwrap();
        assert!(report.contains("= BHP.AX Dashboard"));
    }

    #[test]
    fn analyze_unknown_symbol_exits_five() {
        let dir = TempDir::new().unwrap();
        let ini = write_temp_ini(&ini_for(dir.path()));

        let cli = Cli::try_parse_from([
            "quantdash",
            "analyze",
            "-c",
            ini.path().to_str().unwrap(),
            "--symbol",
            "NOPE",
        ])
        .unwrap();
        let code = cli::run(cli);
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::from(5)));
        assert!(!dir.path().join("report.typ").exists());
    }

    #[test]
    fn validate_reports_config_errors() {
        let ini = write_temp_ini("[analysis]\nsymbol = X\n[backtest]\ninitial_capital = -5\n");
        let cli = Cli::try_parse_from(["quantdash", "validate", "-c", ini.path().to_str().unwrap()])
            .unwrap();
        assert_eq!(format!("{:?}", cli::run(cli)), format!("{:?}", ExitCode::from(2)));
    }

    #[test]
    fn validate_rejects_unparsable_window() {
        let ini = write_temp_ini("[analysis]\nsymbol = X\n[backtest]\nfast_window = abc\n");
        let cli = Cli::try_parse_from(["quantdash", "validate", "-c", ini.path().to_str().unwrap()])
            .unwrap();
        assert_eq!(format!("{:?}", cli::run(cli)), format!("{:?}", ExitCode::from(2)));
    }

    #[test]
    fn list_symbols_from_csv_dir() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "BHP.AX", &[1.0, 2.0]);
        write_csv(dir.path(), "CBA.AX", &[1.0, 2.0]);
        let ini = write_temp_ini(&ini_for(dir.path()));
        let cli = Cli::try_parse_from([
            "quantdash",
            "list-symbols",
            "-c",
            ini.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(format!("{:?}", cli::run(cli)), format!("{:?}", ExitCode::SUCCESS));
    }
}
