//! Trading signals and the rules that derive them from indicators.
//!
//! Every rule implements [`SignalRule`], producing a [`SignalSeries`] aligned
//! one-to-one with the input [`PriceSeries`]. The backtest simulator only
//! ever sees the resulting series, so it is written once for all rules.

pub mod macd_cross;
pub mod rsi_threshold;
pub mod trend;

pub use macd_cross::{macd_crossover_signals, MacdCrossover};
pub use rsi_threshold::{rsi_threshold_signals, RsiLatch, RsiThreshold, RsiThresholds};
pub use trend::{trend_signals, MaKind, MovingAverageTrend, TrendParams};

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::SigtraderError;
use crate::domain::price::PriceSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Action {
    #[default]
    Hold,
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hold => write!(f, "HOLD"),
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub rule: String,
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn from_actions(rule: impl Into<String>, dates: &[NaiveDate], actions: &[Action]) -> Self {
        debug_assert_eq!(dates.len(), actions.len());
        SignalSeries {
            rule: rule.into(),
            points: dates
                .iter()
                .zip(actions)
                .map(|(&date, &action)| SignalPoint { date, action })
                .collect(),
        }
    }

    /// Every date set to `Hold`.
    pub fn all_hold(rule: impl Into<String>, dates: &[NaiveDate]) -> Self {
        Self::from_actions(rule, dates, &vec![Action::Hold; dates.len()])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.points.iter().map(|p| p.action).collect()
    }

    pub fn count(&self, action: Action) -> usize {
        self.points.iter().filter(|p| p.action == action).count()
    }
}

/// A trading rule: price series in, signal series out.
pub trait SignalRule {
    fn name(&self) -> String;

    /// Fewest bars the rule accepts before reporting insufficient history.
    fn min_history(&self) -> usize;

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, SigtraderError>;
}

/// Buy on the first bar and hold to the end. Used as the market benchmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalRule for BuyAndHold {
    fn name(&self) -> String {
        "BUY_AND_HOLD".to_string()
    }

    fn min_history(&self) -> usize {
        1
    }

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, SigtraderError> {
        let mut actions = vec![Action::Hold; prices.len()];
        if let Some(first) = actions.first_mut() {
            *first = Action::Buy;
        }
        Ok(SignalSeries::from_actions(self.name(), &prices.dates(), &actions))
    }
}
