//! Full analysis of one instrument: indicators, every rule's signals and
//! their simulated outcomes.

use tracing::info;

use crate::domain::backtest::{run_rule, simulate, BacktestResult};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{calculate_macd, calculate_rsi, IndicatorSeries, MacdOutput, MacdParams};
use crate::domain::metrics::Metrics;
use crate::domain::price::PriceSeries;
use crate::domain::signal::{
    macd_crossover_signals, rsi_threshold_signals, BuyAndHold, MovingAverageTrend, RsiThreshold,
    SignalSeries, TrendParams,
};

/// Which rules to run and with what parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySettings {
    pub macd: MacdParams,
    pub rsi: RsiThreshold,
    pub trend: Option<TrendParams>,
    pub benchmark: bool,
}

#[derive(Debug, Clone)]
pub struct RuleRun {
    pub signals: SignalSeries,
    pub result: BacktestResult,
    pub metrics: Metrics,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub code: String,
    pub prices: PriceSeries,
    pub macd: MacdOutput,
    pub rsi: IndicatorSeries,
    pub runs: Vec<RuleRun>,
}

impl RunReport {
    pub fn run(&self, rule: &str) -> Option<&RuleRun> {
        self.runs.iter().find(|r| r.result.rule == rule)
    }
}

/// Compute MACD and RSI once, derive each rule's signals and simulate them
/// from the same starting capital.
pub fn analyze(
    code: &str,
    prices: PriceSeries,
    settings: &StrategySettings,
    initial_capital: f64,
    risk_free_rate: f64,
) -> Result<RunReport, SigtraderError> {
    settings.rsi.thresholds.validate()?;

    let macd = calculate_macd(&prices, settings.macd)?;
    let rsi = calculate_rsi(&prices, settings.rsi.period)?;

    let mut runs = Vec::new();
    let evaluate = |signals: SignalSeries, result: BacktestResult| {
        let metrics = Metrics::compute(&result, risk_free_rate);
        info!(
            rule = %result.rule,
            final_capital = result.final_capital,
            trades = result.trades.len(),
            "rule simulated"
        );
        RuleRun {
            signals,
            result,
            metrics,
        }
    };

    let macd_signals = macd_crossover_signals(&macd);
    let result = simulate(&macd_signals, &prices, initial_capital)?;
    runs.push(evaluate(macd_signals, result));

    let rsi_signals = rsi_threshold_signals(&rsi, &settings.rsi.thresholds);
    let result = simulate(&rsi_signals, &prices, initial_capital)?;
    runs.push(evaluate(rsi_signals, result));

    if let Some(params) = settings.trend {
        let (signals, result) = run_rule(&MovingAverageTrend::new(params), &prices, initial_capital)?;
        runs.push(evaluate(signals, result));
    }

    if settings.benchmark {
        let (signals, result) = run_rule(&BuyAndHold, &prices, initial_capital)?;
        runs.push(evaluate(signals, result));
    }

    Ok(RunReport {
        code: code.to_string(),
        prices,
        macd,
        rsi,
        runs,
    })
}
