//! Backtest simulator.
//!
//! Replays a signal series against closing prices with a single long-only
//! lot, recording portfolio value after every bar.

use tracing::debug;

use crate::domain::error::SigtraderError;
use crate::domain::portfolio::{EquityPoint, Portfolio};
use crate::domain::position::ClosedTrade;
use crate::domain::price::PriceSeries;
use crate::domain::signal::{Action, SignalRule, SignalSeries};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub rule: String,
    pub initial_capital: f64,
    /// Cash after liquidating any lot still open at the last close.
    pub final_capital: f64,
    pub portfolio_values: Vec<EquityPoint>,
    pub trades: Vec<ClosedTrade>,
}

impl BacktestResult {
    pub fn last_value(&self) -> f64 {
        self.portfolio_values
            .last()
            .map_or(self.initial_capital, |p| p.value)
    }

    pub fn total_return(&self) -> f64 {
        self.final_capital / self.initial_capital - 1.0
    }
}

/// Run `signals` over `prices` starting from `initial_capital` in cash.
///
/// The recorded portfolio values are not patched by the end-of-data
/// liquidation; `final_capital` carries it. Both use the last close, so the
/// last recorded value and `final_capital` agree.
pub fn simulate(
    signals: &SignalSeries,
    prices: &PriceSeries,
    initial_capital: f64,
) -> Result<BacktestResult, SigtraderError> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(SigtraderError::InvalidCapital {
            capital: initial_capital,
        });
    }
    check_alignment(signals, prices)?;

    let mut portfolio = Portfolio::new(initial_capital);

    for (signal, bar) in signals.points.iter().zip(prices.points()) {
        match signal.action {
            Action::Buy => {
                if portfolio.buy(bar.date, bar.close) {
                    debug!(
                        date = %bar.date,
                        price = bar.close,
                        shares = portfolio.shares(),
                        "buy filled"
                    );
                }
            }
            Action::Sell => {
                if portfolio.sell(bar.date, bar.close) {
                    debug!(date = %bar.date, price = bar.close, cash = portfolio.cash, "sell filled");
                }
            }
            Action::Hold => {}
        }

        let value = portfolio.total_equity(bar.close);
        portfolio.record_equity(bar.date, value);
    }

    if portfolio.liquidate(prices.last_date(), prices.last_close()) {
        debug!(date = %prices.last_date(), price = prices.last_close(), "open lot liquidated");
    }

    Ok(BacktestResult {
        rule: signals.rule.clone(),
        initial_capital,
        final_capital: portfolio.cash,
        portfolio_values: portfolio.equity_curve,
        trades: portfolio.closed_trades,
    })
}

/// Generate the rule's signals and simulate them.
pub fn run_rule(
    rule: &dyn SignalRule,
    prices: &PriceSeries,
    initial_capital: f64,
) -> Result<(SignalSeries, BacktestResult), SigtraderError> {
    let signals = rule.generate(prices)?;
    let result = simulate(&signals, prices, initial_capital)?;
    Ok((signals, result))
}

fn check_alignment(signals: &SignalSeries, prices: &PriceSeries) -> Result<(), SigtraderError> {
    if signals.len() != prices.len() {
        return Err(SigtraderError::AlignmentMismatch {
            reason: format!(
                "{} signals for {} prices",
                signals.len(),
                prices.len()
            ),
        });
    }

    let misaligned = signals
        .points
        .iter()
        .zip(prices.points())
        .position(|(s, p)| s.date != p.date);
    if let Some(i) = misaligned {
        return Err(SigtraderError::AlignmentMismatch {
            reason: format!(
                "index {}: signal dated {} but price dated {}",
                i,
                signals.points[i].date,
                prices.points()[i].date
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn make_prices(closes: &[f64]) -> PriceSeries {
        let rows: Vec<(NaiveDate, f64)> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| (day(i as u32 + 1), c))
            .collect();
        PriceSeries::from_closes(&rows).unwrap()
    }

    fn make_signals(prices: &PriceSeries, actions: &[Action]) -> SignalSeries {
        SignalSeries::from_actions("TEST", &prices.dates(), actions)
    }

    fn values(result: &BacktestResult) -> Vec<f64> {
        result.portfolio_values.iter().map(|p| p.value).collect()
    }

    #[test]
    fn buy_hold_sell_scenario() {
        let prices = make_prices(&[100.0, 105.0, 95.0, 110.0]);
        let signals = make_signals(
            &prices,
            &[Action::Hold, Action::Buy, Action::Hold, Action::Sell],
        );
        let result = simulate(&signals, &prices, 1000.0).unwrap();

        assert_eq!(values(&result), vec![1000.0, 1000.0, 910.0, 1045.0]);
        assert_eq!(result.final_capital, 1045.0);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].shares, 9);
        assert_eq!(result.trades[0].entry_date, day(2));
        assert_eq!(result.trades[0].exit_date, day(4));
        assert!(!result.trades[0].forced);
    }

    #[test]
    fn all_hold_keeps_capital() {
        let prices = make_prices(&[10.0, 20.0, 5.0]);
        let signals = SignalSeries::all_hold("TEST", &prices.dates());
        let result = simulate(&signals, &prices, 500.0).unwrap();

        assert!(values(&result).iter().all(|&v| v == 500.0));
        assert_eq!(result.final_capital, 500.0);
        assert!(result.trades.is_empty());
    }

    #[test]
    fn open_lot_liquidated_at_last_close() {
        let prices = make_prices(&[100.0, 120.0, 130.0]);
        let signals = make_signals(&prices, &[Action::Buy, Action::Hold, Action::Hold]);
        let result = simulate(&signals, &prices, 1000.0).unwrap();

        assert_eq!(result.final_capital, 1300.0);
        assert_eq!(result.last_value(), result.final_capital);
        assert_eq!(result.trades.len(), 1);
        assert!(result.trades[0].forced);
        assert_eq!(result.trades[0].exit_date, day(3));
    }

    #[test]
    fn repeated_buys_and_sells_ignored() {
        let prices = make_prices(&[100.0, 50.0, 200.0, 100.0, 100.0]);
        let signals = make_signals(
            &prices,
            &[Action::Sell, Action::Buy, Action::Buy, Action::Sell, Action::Sell],
        );
        let result = simulate(&signals, &prices, 1000.0).unwrap();

        // Sell while flat ignored, one lot of 20 shares at 50, second buy ignored.
        assert_eq!(values(&result), vec![1000.0, 1000.0, 4000.0, 2000.0, 2000.0]);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].shares, 20);
        assert_eq!(result.final_capital, 2000.0);
    }

    #[test]
    fn rejects_non_positive_capital() {
        let prices = make_prices(&[100.0]);
        let signals = SignalSeries::all_hold("TEST", &prices.dates());
        for capital in [0.0, -1.0, f64::NAN] {
            let err = simulate(&signals, &prices, capital).unwrap_err();
            assert!(matches!(err, SigtraderError::InvalidCapital { .. }));
        }
    }

    #[test]
    fn rejects_length_mismatch() {
        let prices = make_prices(&[100.0, 101.0]);
        let signals = SignalSeries::all_hold("TEST", &[day(1)]);
        let err = simulate(&signals, &prices, 1000.0).unwrap_err();
        assert!(matches!(err, SigtraderError::AlignmentMismatch { .. }));
    }

    #[test]
    fn rejects_date_mismatch() {
        let prices = make_prices(&[100.0, 101.0]);
        let signals = SignalSeries::all_hold("TEST", &[day(1), day(5)]);
        let err = simulate(&signals, &prices, 1000.0).unwrap_err();
        assert!(
            matches!(err, SigtraderError::AlignmentMismatch { reason } if reason.starts_with("index 1"))
        );
    }

    #[test]
    fn run_rule_composes_generation_and_simulation() {
        use crate::domain::signal::BuyAndHold;

        let prices = make_prices(&[10.0, 12.0, 15.0]);
        let (signals, result) = run_rule(&BuyAndHold, &prices, 100.0).unwrap();

        assert_eq!(signals.count(Action::Buy), 1);
        assert_eq!(result.rule, "BUY_AND_HOLD");
        assert_eq!(result.final_capital, 150.0);
        assert!((result.total_return() - 0.5).abs() < 1e-12);
    }
}
