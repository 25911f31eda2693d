//! Price data access port trait.

use crate::domain::error::SigtraderError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily points for `code` dated within `[start_date, end_date]` (either
    /// bound may be open), sorted by date.
    fn fetch_prices(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;

    /// First date, last date and row count, or `None` when `code` has no data.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError>;
}
