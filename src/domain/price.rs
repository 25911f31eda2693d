//! Daily price observations and the validated, date-indexed series built from them.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::error::SigtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
}

impl PricePoint {
    /// A close-only observation.
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PricePoint {
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// Immutable, strictly date-ascending series of daily prices.
///
/// The only way to build one is [`PriceSeries::new`], so every series in the
/// pipeline has positive closes and unique, increasing dates.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SigtraderError> {
        if points.is_empty() {
            return Err(SigtraderError::InvalidPrices {
                reason: "price series is empty".into(),
            });
        }

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(SigtraderError::InvalidPrices {
                    reason: format!("close on {} must be positive, got {}", point.date, point.close),
                });
            }
            if i > 0 && point.date <= points[i - 1].date {
                return Err(SigtraderError::InvalidPrices {
                    reason: format!(
                        "dates must be strictly increasing: {} follows {}",
                        point.date,
                        points[i - 1].date
                    ),
                });
            }
        }

        let date_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();

        Ok(Self { points, date_index })
    }

    /// Build from `(date, close)` pairs.
    pub fn from_closes(rows: &[(NaiveDate, f64)]) -> Result<Self, SigtraderError> {
        Self::new(
            rows.iter()
                .map(|&(date, close)| PricePoint::new(date, close))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.date_index.get(&date).map(|&i| &self.points[i])
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    pub fn last_close(&self) -> f64 {
        self.points[self.points.len() - 1].close
    }
}
