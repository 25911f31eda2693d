//! MACD crossover rule.
//!
//! Buy when the MACD line crosses above the signal line, sell when it crosses
//! below. Memoryless: each bar only looks at itself and the previous bar.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{calculate_macd, MacdOutput, MacdParams};
use crate::domain::price::PriceSeries;
use crate::domain::signal::{Action, SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, Default)]
pub struct MacdCrossover {
    pub params: MacdParams,
}

impl MacdCrossover {
    pub fn new(params: MacdParams) -> Self {
        Self { params }
    }
}

impl SignalRule for MacdCrossover {
    fn name(&self) -> String {
        self.params.line_type().to_string()
    }

    fn min_history(&self) -> usize {
        self.params.min_history()
    }

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, SigtraderError> {
        let macd = calculate_macd(prices, self.params)?;
        Ok(macd_crossover_signals(&macd))
    }
}

/// Edge-triggered crossover detection. Ties land on the `<=`/`>=` side, so a
/// run where the lines are equal never fires.
pub fn macd_crossover_signals(macd: &MacdOutput) -> SignalSeries {
    let len = macd.line.len();
    let mut actions = vec![Action::Hold; len];

    for i in 1..len {
        let operands = (
            macd.line.value_at(i - 1),
            macd.signal.value_at(i - 1),
            macd.line.value_at(i),
            macd.signal.value_at(i),
        );
        let (Some(prev_macd), Some(prev_signal), Some(curr_macd), Some(curr_signal)) = operands
        else {
            continue;
        };

        if curr_macd > curr_signal && prev_macd <= prev_signal {
            actions[i] = Action::Buy;
        } else if curr_macd < curr_signal && prev_macd >= prev_signal {
            actions[i] = Action::Sell;
        }
    }

    let dates: Vec<_> = macd.line.values.iter().map(|p| p.date).collect();
    SignalSeries::from_actions(macd.line.indicator_type.to_string(), &dates, &actions)
}
