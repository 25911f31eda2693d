//! Moving-average trend rule.
//!
//! Long while the fast average is above the slow one. The regime is turned
//! into discrete events: Buy when it switches on, Sell when it switches off.
//! Bars where either average is undefined count as out of the market.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{calculate_ema, calculate_sma, IndicatorSeries};
use crate::domain::price::PriceSeries;
use crate::domain::signal::{Action, SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaKind {
    #[default]
    Sma,
    Ema,
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Sma => write!(f, "SMA"),
            MaKind::Ema => write!(f, "EMA"),
        }
    }
}

impl FromStr for MaKind {
    type Err = SigtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sma" => Ok(MaKind::Sma),
            "ema" => Ok(MaKind::Ema),
            other => Err(SigtraderError::InvalidParameter {
                name: "trend.kind".into(),
                reason: format!("unknown moving average '{}', expected sma or ema", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendParams {
    pub kind: MaKind,
    pub fast: usize,
    pub slow: usize,
}

impl Default for TrendParams {
    fn default() -> Self {
        TrendParams {
            kind: MaKind::Sma,
            fast: 20,
            slow: 50,
        }
    }
}

impl TrendParams {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        if self.fast == 0 || self.fast >= self.slow {
            return Err(SigtraderError::InvalidParameter {
                name: "trend".into(),
                reason: format!(
                    "need 0 < fast < slow, got {} / {}",
                    self.fast, self.slow
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverageTrend {
    pub params: TrendParams,
}

impl MovingAverageTrend {
    pub fn new(params: TrendParams) -> Self {
        Self { params }
    }

    fn average(&self, prices: &PriceSeries, period: usize) -> IndicatorSeries {
        match self.params.kind {
            MaKind::Sma => calculate_sma(prices, period),
            MaKind::Ema => calculate_ema(prices, period),
        }
    }
}

impl SignalRule for MovingAverageTrend {
    fn name(&self) -> String {
        format!(
            "{}_TREND({},{})",
            self.params.kind, self.params.fast, self.params.slow
        )
    }

    fn min_history(&self) -> usize {
        self.params.slow
    }

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, SigtraderError> {
        self.params.validate()?;
        if prices.len() < self.min_history() {
            return Err(SigtraderError::InsufficientHistory {
                indicator: self.name(),
                bars: prices.len(),
                minimum: self.min_history(),
            });
        }

        let fast = self.average(prices, self.params.fast);
        let slow = self.average(prices, self.params.slow);
        let mut signals = trend_signals(&fast, &slow);
        signals.rule = self.name();
        Ok(signals)
    }
}

/// Regime edges of `fast > slow`.
pub fn trend_signals(fast: &IndicatorSeries, slow: &IndicatorSeries) -> SignalSeries {
    let in_market: Vec<bool> = (0..fast.len())
        .map(|i| match (fast.value_at(i), slow.value_at(i)) {
            (Some(f), Some(s)) => f > s,
            _ => false,
        })
        .collect();

    let actions: Vec<Action> = in_market
        .iter()
        .enumerate()
        .map(|(i, &now)| {
            let before = i > 0 && in_market[i - 1];
            match (before, now) {
                (false, true) => Action::Buy,
                (true, false) => Action::Sell,
                _ => Action::Hold,
            }
        })
        .collect();

    let dates: Vec<_> = fast.values.iter().map(|p| p.date).collect();
    SignalSeries::from_actions(
        format!("TREND({},{})", fast.indicator_type, slow.indicator_type),
        &dates,
        &actions,
    )
}
