//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = SMA(fast) - SMA(slow)
//! Signal Line = mean of the first `signal` valid MACD values, then
//!   signal[i] = (macd[i] - signal[i-1]) * 2/(signal+1) + signal[i-1]
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: MACD line from bar slow-1, signal line from bar slow-1 + signal-1.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::price::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        if self.fast == 0 || self.slow == 0 || self.signal == 0 {
            return Err(SigtraderError::InvalidParameter {
                name: "macd".into(),
                reason: format!("periods must be positive, got {}", self.line_type()),
            });
        }
        if self.fast >= self.slow {
            return Err(SigtraderError::InvalidParameter {
                name: "macd".into(),
                reason: format!(
                    "fast period {} must be shorter than slow period {}",
                    self.fast, self.slow
                ),
            });
        }
        Ok(())
    }

    /// Exponential smoothing factor of the signal line.
    pub fn smoothing(&self) -> f64 {
        2.0 / (self.signal as f64 + 1.0)
    }

    /// Fewest bars that still yield a defined MACD value.
    pub fn min_history(&self) -> usize {
        self.slow
    }

    /// Index of the first defined signal-line value.
    pub fn signal_warmup(&self) -> usize {
        self.slow - 1 + self.signal - 1
    }

    pub fn line_type(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }

    pub fn signal_type(&self) -> IndicatorType {
        IndicatorType::MacdSignal {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }

    pub fn histogram_type(&self) -> IndicatorType {
        IndicatorType::MacdHistogram {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    prices: &PriceSeries,
    params: MacdParams,
) -> Result<MacdOutput, SigtraderError> {
    params.validate()?;

    if prices.len() < params.min_history() {
        return Err(SigtraderError::InsufficientHistory {
            indicator: params.line_type().to_string(),
            bars: prices.len(),
            minimum: params.min_history(),
        });
    }

    let closes = prices.closes();
    let fast = rolling_mean(&closes, params.fast);
    let slow = rolling_mean(&closes, params.slow);

    let line: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = signal_line(&line, params.signal, params.smoothing());

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(&signal)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    let dates = prices.dates();
    Ok(MacdOutput {
        line: IndicatorSeries::from_values(params.line_type(), &dates, &line),
        signal: IndicatorSeries::from_values(params.signal_type(), &dates, &signal),
        histogram: IndicatorSeries::from_values(params.histogram_type(), &dates, &histogram),
    })
}

pub fn calculate_macd_default(prices: &PriceSeries) -> Result<MacdOutput, SigtraderError> {
    calculate_macd(prices, MacdParams::default())
}

/// Seeded with the plain mean of the first `period` defined MACD values, then
/// smoothed exponentially with factor `k`.
fn signal_line(macd: &[Option<f64>], period: usize, k: f64) -> Vec<Option<f64>> {
    let mut signal = vec![None; macd.len()];

    let defined: Vec<usize> = macd
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.map(|_| i))
        .take(period)
        .collect();
    if defined.len() < period {
        return signal;
    }

    let seed_idx = defined[period - 1];
    let seed = defined.iter().filter_map(|&i| macd[i]).sum::<f64>() / period as f64;
    signal[seed_idx] = Some(seed);

    let mut prev = seed;
    for i in (seed_idx + 1)..macd.len() {
        if let Some(m) = macd[i] {
            prev = (m - prev) * k + prev;
            signal[i] = Some(prev);
        }
    }

    signal
}
