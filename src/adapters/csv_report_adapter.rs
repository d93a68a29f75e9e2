//! CSV report adapter: value history plus a summary of the statistics.

use std::path::{Path, PathBuf};

use crate::domain::error::SimfolioError;
use crate::domain::metrics::BacktestResult;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    /// `out.csv` -> `out_summary.csv`, next to the history file.
    pub fn summary_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        output_path.with_file_name(format!("{stem}_summary.csv"))
    }
}

fn report_error(path: &Path, e: impl std::fmt::Display) -> SimfolioError {
    SimfolioError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy_name: &str,
        output_path: &Path,
    ) -> Result<(), SimfolioError> {
        let mut history =
            csv::Writer::from_path(output_path).map_err(|e| report_error(output_path, e))?;
        history
            .write_record(["time", "value"])
            .map_err(|e| report_error(output_path, e))?;
        for point in &result.value_history {
            history
                .write_record([point.time.to_rfc3339(), point.value.to_string()])
                .map_err(|e| report_error(output_path, e))?;
        }
        history.flush().map_err(|e| report_error(output_path, e))?;

        let summary_path = Self::summary_path(output_path);
        let mut summary =
            csv::Writer::from_path(&summary_path).map_err(|e| report_error(&summary_path, e))?;
        let rows = [
            ("strategy", strategy_name.to_string()),
            ("snapshots", result.snapshots_processed().to_string()),
            ("initial_value", result.initial_value.to_string()),
            ("final_value", result.final_value.to_string()),
            ("total_return", result.total_return.to_string()),
            (
                "annualized_return",
                result
                    .annualized_return
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
            ),
            ("sharpe", result.sharpe.to_string()),
            ("max_drawdown", result.max_drawdown.to_string()),
            ("max_drawdown_amount", result.max_drawdown_amount.to_string()),
        ];
        summary
            .write_record(["metric", "value"])
            .map_err(|e| report_error(&summary_path, e))?;
        for (metric, value) in rows {
            summary
                .write_record([metric, value.as_str()])
                .map_err(|e| report_error(&summary_path, e))?;
        }
        summary.flush().map_err(|e| report_error(&summary_path, e))?;
        Ok(())
    }
}
