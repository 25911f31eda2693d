//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::price::PriceSeries;

pub fn calculate_sma(prices: &PriceSeries, period: usize) -> IndicatorSeries {
    let values = rolling_mean(&prices.closes(), period);
    IndicatorSeries::from_values(IndicatorType::Sma(period), &prices.dates(), &values)
}
