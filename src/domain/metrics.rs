//! Performance metrics and statistics.

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let equity_curve = &result.portfolio_values;
        let trades = &result.trades;

        let total_return = if result.initial_capital > 0.0 {
            result.final_capital / result.initial_capital - 1.0
        } else {
            0.0
        };

        let return_days = equity_curve.len().saturating_sub(1) as f64;
        let annualized_return = if return_days > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / return_days) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trade in trades {
            if trade.pnl > 0.0 {
                trades_won += 1;
                total_wins += trade.pnl;
            } else if trade.pnl < 0.0 {
                trades_lost += 1;
                total_losses += trade.pnl.abs();
            }
            total_duration_days += trade.holding_days();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_trade_duration = if total_trades > 0 {
            total_duration_days as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            avg_trade_duration,
        }
    }
}

/// Largest peak-to-trough fall as a fraction of the peak, and the longest
/// run of bars spent below a peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.value >= peak {
            peak = point.value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.value) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            if w[0].value > 0.0 {
                (w[1].value - w[0].value) / w[0].value
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
