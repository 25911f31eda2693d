//! RSI threshold rule.
//!
//! Buy when RSI drops below the oversold level, sell when it rises above the
//! overbought level. Unlike the MACD crossover this is a two-state latch: a
//! second Buy while in position, or a Sell while flat, is suppressed.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{calculate_rsi, IndicatorSeries, DEFAULT_RSI_PERIOD};
use crate::domain::price::PriceSeries;
use crate::domain::signal::{Action, SignalRule, SignalSeries};

pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        RsiThresholds {
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
        }
    }
}

impl RsiThresholds {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        let ordered = 0.0 < self.oversold
            && self.oversold < self.overbought
            && self.overbought < 100.0;
        if !ordered {
            return Err(SigtraderError::InvalidParameter {
                name: "rsi thresholds".into(),
                reason: format!(
                    "need 0 < oversold < overbought < 100, got {} / {}",
                    self.oversold, self.overbought
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RsiLatch {
    #[default]
    Flat,
    InPosition,
}

impl RsiLatch {
    /// One transition of the latch for the pair `(prev, curr)` of RSI values.
    pub fn step(self, prev: f64, curr: f64, thresholds: &RsiThresholds) -> (RsiLatch, Action) {
        match self {
            RsiLatch::Flat if curr < thresholds.oversold && prev >= thresholds.oversold => {
                (RsiLatch::InPosition, Action::Buy)
            }
            RsiLatch::InPosition
                if curr > thresholds.overbought && prev <= thresholds.overbought =>
            {
                (RsiLatch::Flat, Action::Sell)
            }
            state => (state, Action::Hold),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RsiThreshold {
    pub period: usize,
    pub thresholds: RsiThresholds,
}

impl Default for RsiThreshold {
    fn default() -> Self {
        RsiThreshold {
            period: DEFAULT_RSI_PERIOD,
            thresholds: RsiThresholds::default(),
        }
    }
}

impl SignalRule for RsiThreshold {
    fn name(&self) -> String {
        format!("RSI({})", self.period)
    }

    fn min_history(&self) -> usize {
        self.period + 1
    }

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, SigtraderError> {
        self.thresholds.validate()?;
        let rsi = calculate_rsi(prices, self.period)?;
        Ok(rsi_threshold_signals(&rsi, &self.thresholds))
    }
}

/// Fold the latch over consecutive RSI pairs. Bars whose pair is not fully
/// defined emit `Hold` and leave the latch untouched.
pub fn rsi_threshold_signals(rsi: &IndicatorSeries, thresholds: &RsiThresholds) -> SignalSeries {
    let len = rsi.len();
    let mut actions = Vec::with_capacity(len);
    if len > 0 {
        actions.push(Action::Hold);
    }

    (1..len).fold(RsiLatch::Flat, |latch, i| {
        let (next, action) = match (rsi.value_at(i - 1), rsi.value_at(i)) {
            (Some(prev), Some(curr)) => latch.step(prev, curr, thresholds),
            _ => (latch, Action::Hold),
        };
        actions.push(action);
        next
    });

    let dates: Vec<_> = rsi.values.iter().map(|p| p.date).collect();
    SignalSeries::from_actions(rsi.indicator_type.to_string(), &dates, &actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorType;
    use chrono::NaiveDate;

    fn make_rsi(values: &[Option<f64>]) -> IndicatorSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        IndicatorSeries::from_values(IndicatorType::Rsi(14), &dates, values)
    }

    fn defined(values: &[f64]) -> IndicatorSeries {
        make_rsi(&values.iter().copied().map(Some).collect::<Vec<_>>())
    }

    #[test]
    fn latch_transitions() {
        let t = RsiThresholds::default();
        assert_eq!(RsiLatch::Flat.step(35.0, 25.0, &t), (RsiLatch::InPosition, Action::Buy));
        assert_eq!(RsiLatch::Flat.step(65.0, 75.0, &t), (RsiLatch::Flat, Action::Hold));
        assert_eq!(RsiLatch::InPosition.step(65.0, 75.0, &t), (RsiLatch::Flat, Action::Sell));
        assert_eq!(
            RsiLatch::InPosition.step(35.0, 25.0, &t),
            (RsiLatch::InPosition, Action::Hold)
        );
    }

    #[test]
    fn threshold_boundaries() {
        let t = RsiThresholds::default();
        // prev exactly 30 counts as "at or above"
        assert_eq!(RsiLatch::Flat.step(30.0, 29.9, &t).1, Action::Buy);
        // curr exactly 30 is not below
        assert_eq!(RsiLatch::Flat.step(40.0, 30.0, &t).1, Action::Hold);
        // prev exactly 70 counts as "at or below"
        assert_eq!(RsiLatch::InPosition.step(70.0, 70.1, &t).1, Action::Sell);
        assert_eq!(RsiLatch::InPosition.step(60.0, 70.0, &t).1, Action::Hold);
    }

    #[test]
    fn buy_then_sell() {
        let rsi = defined(&[50.0, 25.0, 40.0, 75.0, 50.0]);
        let signals = rsi_threshold_signals(&rsi, &RsiThresholds::default());
        assert_eq!(
            signals.actions(),
            vec![Action::Hold, Action::Buy, Action::Hold, Action::Sell, Action::Hold]
        );
    }

    #[test]
    fn second_buy_suppressed_while_in_position() {
        let rsi = defined(&[50.0, 25.0, 40.0, 20.0, 75.0]);
        let signals = rsi_threshold_signals(&rsi, &RsiThresholds::default());
        assert_eq!(
            signals.actions(),
            vec![Action::Hold, Action::Buy, Action::Hold, Action::Hold, Action::Sell]
        );
    }

    #[test]
    fn sell_suppressed_while_flat() {
        let rsi = defined(&[50.0, 80.0, 60.0, 25.0]);
        let signals = rsi_threshold_signals(&rsi, &RsiThresholds::default());
        assert_eq!(
            signals.actions(),
            vec![Action::Hold, Action::Hold, Action::Hold, Action::Buy]
        );
    }

    #[test]
    fn undefined_values_hold() {
        let rsi = make_rsi(&[None, None, Some(20.0), Some(35.0), Some(25.0)]);
        let signals = rsi_threshold_signals(&rsi, &RsiThresholds::default());
        // Bar 2 has no defined predecessor; the first real cross is at bar 4.
        assert_eq!(
            signals.actions(),
            vec![Action::Hold, Action::Hold, Action::Hold, Action::Hold, Action::Buy]
        );
    }

    #[test]
    fn empty_series() {
        let signals = rsi_threshold_signals(&make_rsi(&[]), &RsiThresholds::default());
        assert!(signals.is_empty());
    }

    #[test]
    fn thresholds_validation() {
        assert!(RsiThresholds::default().validate().is_ok());
        for (oversold, overbought) in [(0.0, 70.0), (70.0, 30.0), (30.0, 100.0), (50.0, 50.0)] {
            let t = RsiThresholds { oversold, overbought };
            assert!(t.validate().is_err(), "{} / {} should be rejected", oversold, overbought);
        }
    }

    #[test]
    fn rule_min_history() {
        assert_eq!(RsiThreshold::default().min_history(), 15);
        assert_eq!(RsiThreshold::default().name(), "RSI(14)");
    }
}
