//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses a simple rolling mean (not Wilder's smoothing) for average gain/loss:
//! - avg_gain[i] = mean(gain[i-n+1..=i]), avg_loss likewise, for i >= n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes per window).

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::price::PriceSeries;

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn calculate_rsi(prices: &PriceSeries, period: usize) -> Result<IndicatorSeries, SigtraderError> {
    if period == 0 {
        return Err(SigtraderError::InvalidParameter {
            name: "rsi.period".into(),
            reason: "period must be positive".into(),
        });
    }

    let minimum = period + 1;
    if prices.len() < minimum {
        return Err(SigtraderError::InsufficientHistory {
            indicator: IndicatorType::Rsi(period).to_string(),
            bars: prices.len(),
            minimum,
        });
    }

    let closes = prices.closes();
    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    // Change k sits between bars k and k+1, so change-window end k maps to bar k+1.
    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let mut values = Vec::with_capacity(closes.len());
    values.push(None);
    for (gain, loss) in avg_gain.iter().zip(&avg_loss) {
        values.push(match (gain, loss) {
            (Some(gain), Some(loss)) => Some(rsi_from_averages(*gain, *loss)),
            _ => None,
        });
    }

    Ok(IndicatorSeries::from_values(
        IndicatorType::Rsi(period),
        &prices.dates(),
        &values,
    ))
}

/// A window without losses saturates at 100 instead of dividing by zero.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}
