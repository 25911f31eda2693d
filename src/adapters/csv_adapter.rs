//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<CODE>.csv`, with a header row. Columns
//! are found by name so exports from different sources load unchanged.
//! File names are matched case-insensitively, so `bhp.csv` serves `BHP`.

use crate::domain::error::SigtraderError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d-%b-%Y", "%Y/%m/%d"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    /// Exact `<CODE>.csv` first, then any csv file whose stem matches ignoring case.
    fn find_file(&self, code: &str) -> Option<PathBuf> {
        let exact = self.csv_path(code);
        if exact.is_file() {
            return Some(exact);
        }
        fs::read_dir(&self.base_path)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                    && path
                        .file_stem()
                        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(code))
            })
    }

    fn read_points(&self, code: &str) -> Result<Vec<PricePoint>, SigtraderError> {
        let path = self.find_file(code).unwrap_or_else(|| self.csv_path(code));
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SigtraderError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = Columns::from_headers(headers)?;

        let mut points = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            // Blank trailing lines in hand-edited files.
            if record.iter().all(str::is_empty) {
                continue;
            }
            points.push(columns.parse_row(&record).map_err(|e| match e {
                SigtraderError::Data { reason } => SigtraderError::Data {
                    reason: format!("{} row {}: {}", path.display(), line + 2, reason),
                },
                other => other,
            })?);
        }

        points.sort_by_key(|p| p.date);
        let before = points.len();
        points.dedup_by_key(|p| p.date);
        if points.len() != before {
            warn!(code, dropped = before - points.len(), "duplicate dates dropped");
        }

        debug!(code, rows = points.len(), path = %path.display(), "price file loaded");
        Ok(points)
    }
}

/// Positions of the recognised columns in the header row.
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, SigtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| SigtraderError::Data {
                reason: format!("missing {} column", name),
            })
        };

        Ok(Columns {
            date: required("date")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Result<PricePoint, SigtraderError> {
        let date_str = record.get(self.date).unwrap_or_default();
        let date = parse_date(date_str)?;

        let close = parse_optional(record, Some(self.close), "close")?.ok_or_else(|| {
            SigtraderError::Data {
                reason: "missing close value".into(),
            }
        })?;

        Ok(PricePoint {
            date,
            close,
            open: parse_optional(record, self.open, "open")?,
            high: parse_optional(record, self.high, "high")?,
            low: parse_optional(record, self.low, "low")?,
            volume: parse_optional(record, self.volume, "volume")?,
        })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, SigtraderError> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| SigtraderError::Data {
            reason: format!("invalid date format: {:?}", value),
        })
}

/// Empty or absent cells are `None`; anything else must parse.
fn parse_optional(
    record: &StringRecord,
    index: Option<usize>,
    name: &str,
) -> Result<Option<f64>, SigtraderError> {
    let Some(raw) = index.and_then(|i| record.get(i)) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| SigtraderError::Data {
            reason: format!("invalid {} value {:?}: {}", name, raw, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, SigtraderError> {
        let mut points = self.read_points(code)?;
        points.retain(|p| {
            start_date.is_none_or(|start| p.date >= start) && end_date.is_none_or(|end| p.date <= end)
        });
        Ok(points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        if self.find_file(code).is_none() {
            return Ok(None);
        }
        let points = self.read_points(code)?;
        Ok(match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, points.len())),
            _ => None,
        })
    }
}
