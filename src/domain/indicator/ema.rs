//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), EMA[0] = C[0], then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Seeded with the first close rather than an SMA, so every bar is defined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price::PriceSeries;

pub fn calculate_ema(prices: &PriceSeries, period: usize) -> IndicatorSeries {
    let closes = prices.closes();
    if period == 0 {
        return IndicatorSeries::from_values(
            IndicatorType::Ema(period),
            &prices.dates(),
            &vec![None; closes.len()],
        );
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(closes.len());
    let mut ema = closes[0];

    for (i, &close) in closes.iter().enumerate() {
        if i > 0 {
            ema = close * k + ema * (1.0 - k);
        }
        values.push(Some(ema));
    }

    IndicatorSeries::from_values(IndicatorType::Ema(period), &prices.dates(), &values)
}
