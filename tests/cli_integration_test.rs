//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Config loading and resolution from real INI files on disk
//! - Backtest, dry-run, validate, list-symbols and info commands
//! - Exit codes for config, data and history failures
//! - CSV report output

mod common;

use clap::Parser;
use common::*;
use sigtrader::adapters::file_config_adapter::FileConfigAdapter;
use sigtrader::cli::{self, Cli};
use sigtrader::domain::error::SigtraderError;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn ini_for(data_dir: &Path, extra: &str) -> String {
    format!(
        r#"
[data]
dir = {}
code = ABC

[backtest]
initial_capital = 100000
risk_free_rate = 0.05

[macd]
fast = 12
slow = 26
signal = 9

[rsi]
period = 14
oversold = 30
overbought = 70
{}"#,
        data_dir.display(),
        extra
    )
}

/// Data directory holding `ABC` (150 bars) and `SHORT` (10 bars).
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_price_csv(
        dir.path(),
        "ABC",
        &make_points("2023-01-02", &wave_closes(150, 100.0, 12.0)),
    );
    write_price_csv(dir.path(), "SHORT", &make_points("2023-01-02", &[10.0; 10]));
    dir
}

fn run_cli(args: &[&str]) -> ExitCode {
    let mut argv = vec!["sigtrader"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

fn assert_exit(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{:?}", actual),
        format!("{:?}", ExitCode::from(expected))
    );
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_from_disk() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));

        let adapter = cli::load_config(&ini.path().to_path_buf()).unwrap();
        cli::validate_config(&adapter).unwrap();
        let run_config = cli::build_run_config(&adapter, None).unwrap();

        assert_eq!(run_config.data_dir, data.path());
        assert_eq!(run_config.code, "ABC");
        assert_eq!(run_config.initial_capital, 100_000.0);
        assert_eq!(run_config.risk_free_rate, 0.05);
    }

    #[test]
    fn validate_config_reports_first_problem() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\ndir = d\ncode = A\n[backtest]\ninitial_capital = -5\n",
        )
        .unwrap();
        let err = cli::validate_config(&adapter).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn trend_section_enables_trend_rule() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\ndir = d\ncode = A\n[trend]\nenabled = true\nkind = sma\nfast = 5\nslow = 15\n",
        )
        .unwrap();
        let settings = cli::build_strategy_settings(&adapter).unwrap();
        let trend = settings.trend.unwrap();
        assert_eq!((trend.fast, trend.slow), (5, 15));
    }
}

mod backtest_command {
    use super::*;

    #[test]
    fn backtest_writes_csv_report() {
        let data = data_dir();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("reports/abc.csv");
        let ini = write_temp_ini(&ini_for(
            data.path(),
            "\n[trend]\nenabled = true\nkind = ema\nfast = 10\nslow = 30\n",
        ));

        let code = run_cli(&[
            "backtest",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        assert_exit(code, 0);

        let mut rdr = csv::Reader::from_path(&output).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(&headers[..6], &["date", "close", "macd", "macd_signal", "macd_histogram", "rsi"]);
        assert!(headers.contains(&"MACD(12,26,9)_action".to_string()));
        assert!(headers.contains(&"RSI(14)_value".to_string()));
        assert!(headers.contains(&"EMA_TREND(10,30)_action".to_string()));
        assert!(headers.contains(&"BUY_AND_HOLD_value".to_string()));
        assert_eq!(rdr.records().count(), 150);
    }

    #[test]
    fn report_output_from_config() {
        let data = data_dir();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("from_config.csv");
        let ini = write_temp_ini(&ini_for(
            data.path(),
            &format!("\n[report]\noutput = {}\n", output.display()),
        ));

        let code = run_cli(&["backtest", "-c", ini.path().to_str().unwrap()]);
        assert_exit(code, 0);
        assert!(output.exists());
    }

    #[test]
    fn code_override_selects_file() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));

        // SHORT has 10 bars, below the MACD minimum.
        let code = run_cli(&[
            "backtest",
            "-c",
            ini.path().to_str().unwrap(),
            "--code",
            "short",
        ]);
        assert_exit(code, 5);
    }

    #[test]
    fn missing_price_file_is_data_error() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));

        let code = run_cli(&[
            "backtest",
            "-c",
            ini.path().to_str().unwrap(),
            "--code",
            "NOPE",
        ]);
        assert_exit(code, 3);
    }

    #[test]
    fn empty_date_range_is_data_error() {
        let data = data_dir();
        let mut ini_text = ini_for(data.path(), "");
        ini_text = ini_text.replace(
            "code = ABC",
            "code = ABC\nstart_date = 2030-01-01\nend_date = 2030-12-31",
        );
        let ini = write_temp_ini(&ini_text);

        let code = run_cli(&["backtest", "-c", ini.path().to_str().unwrap()]);
        assert_exit(code, 3);
    }

    #[test]
    fn invalid_config_exits_with_config_code() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), "").replace("slow = 26", "slow = 6"));

        let code = run_cli(&["backtest", "-c", ini.path().to_str().unwrap()]);
        assert_exit(code, 2);
    }

    #[test]
    fn code_flag_replaces_missing_config_code() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), "").replace("code = ABC\n", ""));
        let path = ini.path().to_str().unwrap();

        assert_exit(run_cli(&["backtest", "-c", path]), 2);
        assert_exit(run_cli(&["backtest", "-c", path, "--code", "ABC"]), 0);
    }

    #[test]
    fn unparsable_number_exits_with_config_code() {
        let data = data_dir();
        for (from, to) in [
            ("slow = 26", "slow = twenty"),
            ("initial_capital = 100000", "initial_capital = 10k"),
            ("oversold = 30", "oversold = low"),
        ] {
            let ini = write_temp_ini(&ini_for(data.path(), "").replace(from, to));
            let path = ini.path().to_str().unwrap();
            assert_exit(run_cli(&["validate", "-c", path]), 2);
            assert_exit(run_cli(&["backtest", "-c", path]), 2);
        }
    }

    #[test]
    fn lowercase_price_file_is_found() {
        let data = TempDir::new().unwrap();
        write_price_csv(
            data.path(),
            "abc",
            &make_points("2023-01-02", &wave_closes(150, 100.0, 12.0)),
        );
        let ini = write_temp_ini(&ini_for(data.path(), ""));

        assert_exit(run_cli(&["backtest", "-c", ini.path().to_str().unwrap()]), 0);
    }

    #[test]
    fn missing_config_file_exits_with_config_code() {
        let code = run_cli(&["backtest", "-c", "/nonexistent/sigtrader.ini"]);
        assert_exit(code, 2);
    }

    #[test]
    fn dry_run_does_not_touch_data() {
        let ini = write_temp_ini(&ini_for(Path::new("/nonexistent/prices"), ""));
        let code = run_cli(&["backtest", "-c", ini.path().to_str().unwrap(), "--dry-run"]);
        assert_exit(code, 0);
    }
}

mod other_commands {
    use super::*;

    #[test]
    fn validate_accepts_good_config() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        assert_exit(run_cli(&["validate", "-c", ini.path().to_str().unwrap()]), 0);
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), "").replace("oversold = 30", "oversold = 90"));
        assert_exit(run_cli(&["validate", "-c", ini.path().to_str().unwrap()]), 2);
    }

    #[test]
    fn list_symbols_succeeds() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        assert_exit(
            run_cli(&["list-symbols", "-c", ini.path().to_str().unwrap()]),
            0,
        );
    }

    #[test]
    fn list_symbols_missing_dir_is_data_error() {
        let ini = write_temp_ini(&ini_for(Path::new("/nonexistent/prices"), ""));
        assert_exit(
            run_cli(&["list-symbols", "-c", ini.path().to_str().unwrap()]),
            3,
        );
    }

    #[test]
    fn info_succeeds_for_known_and_unknown_codes() {
        let data = data_dir();
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        assert_exit(run_cli(&["info", "-c", path]), 0);
        assert_exit(run_cli(&["info", "-c", path, "--code", "missing"]), 0);
    }
}
