//! Report generation port trait.

use std::path::Path;

use crate::domain::error::SimfolioError;
use crate::domain::metrics::BacktestResult;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy_name: &str,
        output_path: &Path,
    ) -> Result<(), SimfolioError>;
}
