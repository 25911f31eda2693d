//! Cash/share state and equity tracking for a single instrument.

use chrono::NaiveDate;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Long-only, unlevered account holding at most one lot.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_holding(&self) -> bool {
        self.position.is_some()
    }

    pub fn shares(&self) -> u64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    /// Spend as much cash as buys whole shares. Returns `false` (and changes
    /// nothing) when a lot is already open.
    pub fn buy(&mut self, date: NaiveDate, price: f64) -> bool {
        if self.is_holding() {
            return false;
        }

        let mut shares = (self.cash / price).floor() as u64;
        // Rounding in the division must never overdraw the account.
        if shares as f64 * price > self.cash {
            shares = shares.saturating_sub(1);
        }

        self.cash -= shares as f64 * price;
        self.position = Some(Position {
            shares,
            entry_price: price,
            entry_date: date,
        });
        true
    }

    /// Sell the open lot. Returns `false` when flat.
    pub fn sell(&mut self, date: NaiveDate, price: f64) -> bool {
        self.close_position(date, price, false)
    }

    /// End-of-data liquidation; the trade is flagged as forced.
    pub fn liquidate(&mut self, date: NaiveDate, price: f64) -> bool {
        self.close_position(date, price, true)
    }

    fn close_position(&mut self, date: NaiveDate, price: f64, forced: bool) -> bool {
        let Some(position) = self.position.take() else {
            return false;
        };

        self.cash += position.market_value(price);
        if position.shares > 0 {
            self.record_trade(position.close(date, price, forced));
        }
        true
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, value: f64) {
        self.equity_curve.push(EquityPoint { date, value });
    }

    /// cash + shares * price
    pub fn total_equity(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map_or(0.0, |pos| pos.market_value(price));
        self.cash + position_value
    }
}
