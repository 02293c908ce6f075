//! The `MetricsWriter` trait implemented by all backend writers.

use crate::{MetricRow, OutputResult, StepSummaryRow};

/// Trait implemented by output backends.
///
/// All methods are infallible from the observer's perspective; errors are
/// stored internally and retrieved with
/// [`SimOutputObserver::take_error`](crate::SimOutputObserver::take_error).
pub trait MetricsWriter {
    /// Write one step summary row.  Every row of a run carries the same
    /// count names.
    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()>;

    /// Write the final metrics.
    fn write_metrics(&mut self, rows: &[MetricRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent, safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
