//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::DEFAULT_INITIAL_CAPITAL;
use crate::domain::config_validation::{
    config_bool, config_float, config_int, parse_optional_date, validate_backtest_config,
    validate_data_config, validate_strategy_config,
};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{MacdParams, DEFAULT_RSI_PERIOD};
use crate::domain::price::PriceSeries;
use crate::domain::report::{analyze, RunReport, StrategySettings};
use crate::domain::signal::rsi_threshold::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};
use crate::domain::signal::{MaKind, RsiThreshold, RsiThresholds, TrendParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "MACD/RSI signal backtester")]
pub struct Cli {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a backtest run needs, resolved from config and CLI overrides.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    pub strategy: StrategySettings,
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            code,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref())
            } else {
                run_backtest(&config, code.as_deref(), output)
            }
        }
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, SigtraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| SigtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

/// Build a [`RunConfig`] from an already validated config.
pub fn build_run_config(
    config: &dyn ConfigPort,
    code_override: Option<&str>,
) -> Result<RunConfig, SigtraderError> {
    let data_dir = config
        .get_string("data", "dir")
        .map(|d| PathBuf::from(d.trim()))
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;

    Ok(RunConfig {
        data_dir,
        code: resolve_code(code_override, config)?,
        start_date: parse_optional_date(config, "data", "start_date")?,
        end_date: parse_optional_date(config, "data", "end_date")?,
        initial_capital: config_float(config, "backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        risk_free_rate: config_float(config, "backtest", "risk_free_rate", 0.0)?,
        strategy: build_strategy_settings(config)?,
        output: config
            .get_string("report", "output")
            .map(|o| PathBuf::from(o.trim())),
    })
}

pub fn build_strategy_settings(config: &dyn ConfigPort) -> Result<StrategySettings, SigtraderError> {
    let period = |section: &str, key: &str, default: usize| -> Result<usize, SigtraderError> {
        Ok(config_int(config, section, key, default as i64)?.max(0) as usize)
    };

    let macd = MacdParams {
        fast: period("macd", "fast", DEFAULT_FAST)?,
        slow: period("macd", "slow", DEFAULT_SLOW)?,
        signal: period("macd", "signal", DEFAULT_SIGNAL)?,
    };
    macd.validate()?;

    let rsi = RsiThreshold {
        period: period("rsi", "period", DEFAULT_RSI_PERIOD)?,
        thresholds: RsiThresholds {
            oversold: config_float(config, "rsi", "oversold", DEFAULT_OVERSOLD)?,
            overbought: config_float(config, "rsi", "overbought", DEFAULT_OVERBOUGHT)?,
        },
    };
    rsi.thresholds.validate()?;

    let trend = if config_bool(config, "trend", "enabled", false)? {
        let defaults = TrendParams::default();
        let kind = match config.get_string("trend", "kind") {
            Some(k) => k.parse::<MaKind>()?,
            None => defaults.kind,
        };
        let params = TrendParams {
            kind,
            fast: period("trend", "fast", defaults.fast)?,
            slow: period("trend", "slow", defaults.slow)?,
        };
        params.validate()?;
        Some(params)
    } else {
        None
    };

    Ok(StrategySettings {
        macd,
        rsi,
        trend,
        benchmark: true,
    })
}

pub fn resolve_code(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, SigtraderError> {
    code_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "code"))
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "code".into(),
        })
}

fn run_backtest(
    config_path: &PathBuf,
    code_override: Option<&str>,
    output_override: Option<PathBuf>,
) -> Result<(), SigtraderError> {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    // Stage 2: Resolve run parameters
    let mut run_config = build_run_config(&adapter, code_override)?;
    if output_override.is_some() {
        run_config.output = output_override;
    }

    // Stages 3-6: Load prices, analyse, summarise, report
    let data_port = CsvAdapter::new(run_config.data_dir.clone());
    run_backtest_pipeline(&data_port, &CsvReportAdapter::new(), &run_config)?;
    Ok(())
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    run_config: &RunConfig,
) -> Result<RunReport, SigtraderError> {
    let code = &run_config.code;

    // Stage 3: Load prices
    let points = data_port.fetch_prices(code, run_config.start_date, run_config.end_date)?;
    if points.is_empty() {
        return Err(SigtraderError::Data {
            reason: format!("no price data for {} in the requested range", code),
        });
    }
    let prices = PriceSeries::new(points)?;
    info!(
        code = %code,
        bars = prices.len(),
        first = %prices.first_date(),
        last = %prices.last_date(),
        "prices loaded"
    );

    // Stage 4: Indicators, signals and simulations
    eprintln!(
        "Running backtest: {}, {} bars, {} to {}",
        code,
        prices.len(),
        prices.first_date(),
        prices.last_date()
    );
    let report = analyze(
        code,
        prices,
        &run_config.strategy,
        run_config.initial_capital,
        run_config.risk_free_rate,
    )?;

    // Stage 5: Console summary
    print_summary(&report, run_config.initial_capital);

    // Stage 6: Optional report
    if let Some(output) = &run_config.output {
        report_port.write(&report, &output.display().to_string())?;
        eprintln!("\nReport written to: {}", output.display());
    }

    Ok(report)
}

fn print_summary(report: &RunReport, initial_capital: f64) {
    eprintln!("\n=== Results ({}) ===", report.code);
    eprintln!("Initial Capital:  {:.2}", initial_capital);
    for run in &report.runs {
        let m = &run.metrics;
        eprintln!("\n--- {} ---", run.result.rule);
        eprintln!("Final Capital:    {:.2}", run.result.final_capital);
        eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
        eprintln!("Annualized:       {:.2}%", m.annualized_return * 100.0);
        eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
        eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
        eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
        eprintln!("Total Trades:     {}", m.total_trades);
        eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
        eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    }
}

pub fn run_dry_run(config_path: &PathBuf, code_override: Option<&str>) -> Result<(), SigtraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;
    eprintln!("Config validated successfully");

    let run_config = build_run_config(&adapter, code_override)?;
    describe_run(&run_config);

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn describe_run(run_config: &RunConfig) {
    let bound = |d: Option<NaiveDate>| d.map_or_else(|| "*".to_string(), |d| d.to_string());

    eprintln!("\nData:");
    eprintln!("  dir:  {}", run_config.data_dir.display());
    eprintln!("  code: {}", run_config.code);
    eprintln!(
        "  range: {} to {}",
        bound(run_config.start_date),
        bound(run_config.end_date)
    );

    eprintln!("\nRules:");
    let s = &run_config.strategy;
    eprintln!("  {}", s.macd.line_type());
    eprintln!(
        "  RSI({}) oversold {} / overbought {}",
        s.rsi.period, s.rsi.thresholds.oversold, s.rsi.thresholds.overbought
    );
    if let Some(trend) = &s.trend {
        eprintln!("  {}_TREND({},{})", trend.kind, trend.fast, trend.slow);
    }
    if s.benchmark {
        eprintln!("  BUY_AND_HOLD");
    }

    eprintln!("\nInitial capital: {:.2}", run_config.initial_capital);
    if let Some(output) = &run_config.output {
        eprintln!("Report: {}", output.display());
    }
}

fn run_list_symbols(config_path: &PathBuf) -> Result<(), SigtraderError> {
    let config = load_config(config_path)?;
    validate_data_dir(&config)?;
    let adapter = CsvAdapter::new(data_dir(&config));

    let symbols = adapter.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), SigtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let run_config = build_run_config(&adapter, None)?;
    describe_run(&run_config);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(config_path: &PathBuf, code_override: Option<&str>) -> Result<(), SigtraderError> {
    let config = load_config(config_path)?;
    validate_data_dir(&config)?;
    let code = resolve_code(code_override, &config)?;
    let adapter = CsvAdapter::new(data_dir(&config));

    match adapter.get_data_range(&code)? {
        Some((first, last, count)) => {
            println!("{}: {} bars, {} to {}", code, count, first, last);
        }
        None => {
            eprintln!("{}: no data found", code);
        }
    }
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("data", "dir") {
        Some(_) => Ok(()),
        None => Err(SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        }),
    }
}

fn data_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("data", "dir")
        .map(|d| PathBuf::from(d.trim()))
        .unwrap_or_default()
}
