//! Open lot and completed round-trip records.

use chrono::NaiveDate;

/// The single long lot held between a Buy and the following Sell.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }

    /// Turn the lot into a trade record exiting at `price` on `date`.
    pub fn close(&self, date: NaiveDate, price: f64, forced: bool) -> ClosedTrade {
        ClosedTrade {
            shares: self.shares,
            entry_price: self.entry_price,
            exit_price: price,
            entry_date: self.entry_date,
            exit_date: date,
            pnl: self.unrealized_pnl(price),
            forced,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub shares: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    /// Closed by the end-of-data liquidation rather than a Sell signal.
    pub forced: bool,
}

impl ClosedTrade {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }

    pub fn return_pct(&self) -> f64 {
        if self.entry_price > 0.0 {
            (self.exit_price - self.entry_price) / self.entry_price
        } else {
            0.0
        }
    }
}
