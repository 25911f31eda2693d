#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::price::{PricePoint, PriceSeries};
use sigtrader::domain::report::RunReport;
use sigtrader::ports::data_port::DataPort;
use sigtrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, code: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(code.to_string(), points);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, SigtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|p| start_date.is_none_or(|s| p.date >= s))
            .filter(|p| end_date.is_none_or(|e| p.date <= e))
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(points) if !points.is_empty() => {
                let min = points.iter().map(|p| p.date).min().unwrap();
                let max = points.iter().map(|p| p.date).max().unwrap();
                Ok(Some((min, max, points.len())))
            }
            _ => Ok(None),
        }
    }
}

/// Records every report it is asked to write.
pub struct MockReportPort {
    pub calls: RefCell<Vec<(String, usize, String)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), SigtraderError> {
        self.calls.borrow_mut().push((
            report.code.clone(),
            report.runs.len(),
            output_path.to_string(),
        ));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from `start`, one point per close.
pub fn make_points(start: &str, closes: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn make_series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(make_points("2024-01-01", closes)).unwrap()
}

/// Smooth oscillation around `base`, long enough to produce crossovers.
pub fn wave_closes(count: usize, base: f64, amplitude: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + amplitude * (i as f64 / 5.0).sin())
        .collect()
}

pub fn write_price_csv(dir: &std::path::Path, code: &str, points: &[PricePoint]) {
    let mut content = String::from("date,close\n");
    for p in points {
        content.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.close));
    }
    std::fs::write(dir.join(format!("{}.csv", code)), content).unwrap();
}
