//! Report generation port trait.

use crate::domain::error::SigtraderError;
use crate::domain::report::RunReport;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), SigtraderError>;
}
