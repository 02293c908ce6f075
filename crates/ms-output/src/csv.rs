//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `step_summaries.csv`: `tick, unix_time_secs, population`, then one
//!   column per tracked state value
//! - `metrics.csv`: `tick, metric, value`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::MetricsWriter;
use crate::{MetricRow, OutputResult, StepSummaryRow};

const SUMMARY_HEADER: [&str; 3] = ["tick", "unix_time_secs", "population"];

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    summaries:      Writer<File>,
    metrics:        Writer<File>,
    /// The summary header depends on the first row's count names.
    summary_header: bool,
    finished:       bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let summaries = Writer::from_path(dir.join("step_summaries.csv"))?;

        let mut metrics = Writer::from_path(dir.join("metrics.csv"))?;
        metrics.write_record(["tick", "metric", "value"])?;

        Ok(Self {
            summaries,
            metrics,
            summary_header: false,
            finished: false,
        })
    }

    fn ensure_summary_header(&mut self, counts: &[(String, u64)]) -> OutputResult<()> {
        if self.summary_header {
            return Ok(());
        }
        let header: Vec<&str> = SUMMARY_HEADER
            .iter()
            .copied()
            .chain(counts.iter().map(|(name, _)| name.as_str()))
            .collect();
        self.summaries.write_record(&header)?;
        self.summary_header = true;
        Ok(())
    }
}

impl MetricsWriter for CsvWriter {
    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.ensure_summary_header(&row.counts)?;
        let mut record = vec![
            row.tick.to_string(),
            row.unix_time_secs.to_string(),
            row.population.to_string(),
        ];
        record.extend(row.counts.iter().map(|(_, count)| count.to_string()));
        self.summaries.write_record(&record)?;
        Ok(())
    }

    fn write_metrics(&mut self, rows: &[MetricRow]) -> OutputResult<()> {
        for row in rows {
            self.metrics.write_record(&[
                row.tick.to_string(),
                row.name.clone(),
                row.value.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.ensure_summary_header(&[])?;
        self.summaries.flush()?;
        self.metrics.flush()?;
        Ok(())
    }
}
