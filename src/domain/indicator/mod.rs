//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single dated point; `value` is `None` until the window fills
//! - `IndicatorType`: indicator identity plus parameters, also used as the series name
//! - `IndicatorSeries`: A time series of indicator values aligned with a `PriceSeries`

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdOutput, MacdParams};
pub use rsi::{calculate_rsi, DEFAULT_RSI_PERIOD};
pub use sma::calculate_sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdHistogram {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Zip dates with computed values. Both slices must have the same length.
    pub fn from_values(
        indicator_type: IndicatorType,
        dates: &[NaiveDate],
        values: &[Option<f64>],
    ) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        IndicatorSeries {
            indicator_type,
            values: dates
                .iter()
                .zip(values)
                .map(|(&date, &value)| IndicatorPoint { date, value })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn first_defined_index(&self) -> Option<usize> {
        self.values.iter().position(|p| p.value.is_some())
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_some()).count()
    }

    pub fn raw(&self) -> Vec<Option<f64>> {
        self.values.iter().map(|p| p.value).collect()
    }
}

/// Trailing arithmetic mean over `period` values; `None` until the window is full.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdHistogram { fast, slow, signal } => {
                write!(f, "MACD_HIST({},{},{})", fast, slow, signal)
            }
        }
    }
}
