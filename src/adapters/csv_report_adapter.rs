//! CSV report adapter implementing ReportPort.
//!
//! One row per bar: the close, the indicator values, then each rule's action
//! and portfolio value. Undefined indicator values are left as empty cells.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::error::SigtraderError;
use crate::domain::report::RunReport;
use crate::ports::report_port::ReportPort;

const INDICATOR_COLUMNS: [&str; 6] = [
    "date",
    "close",
    "macd",
    "macd_signal",
    "macd_histogram",
    "rsi",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

fn report_error(e: csv::Error) -> SigtraderError {
    SigtraderError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), SigtraderError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(report_error)?;

        let mut header: Vec<String> = INDICATOR_COLUMNS.iter().map(|c| c.to_string()).collect();
        for run in &report.runs {
            header.push(format!("{}_action", run.result.rule));
            header.push(format!("{}_value", run.result.rule));
        }
        writer.write_record(&header).map_err(report_error)?;

        for (i, point) in report.prices.points().iter().enumerate() {
            let mut row = vec![
                point.date.format("%Y-%m-%d").to_string(),
                format!("{:.6}", point.close),
                cell(report.macd.line.value_at(i)),
                cell(report.macd.signal.value_at(i)),
                cell(report.macd.histogram.value_at(i)),
                cell(report.rsi.value_at(i)),
            ];
            for run in &report.runs {
                row.push(
                    run.signals
                        .points
                        .get(i)
                        .map(|s| s.action.to_string())
                        .unwrap_or_default(),
                );
                row.push(cell(run.result.portfolio_values.get(i).map(|p| p.value)));
            }
            writer.write_record(&row).map_err(report_error)?;
        }

        writer.flush()?;
        info!(path = output_path, rows = report.prices.len(), "report written");
        Ok(())
    }
}
