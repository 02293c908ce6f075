//! `SimOutputObserver<W>`: bridges `SimObserver` to a `MetricsWriter`.

use ms_core::{SimConfig, Tick};
use ms_population::PopulationTable;
use ms_sim::{Metrics, SimObserver};

use crate::row::{MetricRow, StepSummaryRow};
use crate::writer::MetricsWriter;
use crate::{OutputError, OutputResult};

/// A column whose per-value counts go into every step summary.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tracked {
    column: String,
    values: Vec<String>,
}

/// A [`SimObserver`] that writes step summaries and final metrics to any
/// [`MetricsWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: MetricsWriter> {
    writer:          W,
    start_unix_secs: i64,
    step_size_secs:  u32,
    tracked:         Vec<Tracked>,
    last_error:      Option<OutputError>,
}

impl<W: MetricsWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for wall-clock
    /// conversion.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            start_unix_secs: config.start_unix_secs,
            step_size_secs:  config.step_size_secs,
            tracked:         Vec::new(),
            last_error:      None,
        }
    }

    /// Count simulants per value of `column` in each step summary.  Values
    /// outside `values` are not counted.
    pub fn track<S: Into<String>>(mut self, column: &str, values: impl IntoIterator<Item = S>) -> Self {
        self.tracked.push(Tracked {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn unix_time(&self, tick: Tick) -> i64 {
        self.start_unix_secs + tick.0 as i64 * self.step_size_secs as i64
    }

    fn summarise(&self, tick: Tick, population: &PopulationTable) -> OutputResult<StepSummaryRow> {
        let mut counts = Vec::new();
        for tracked in &self.tracked {
            let column = population.column(&tracked.column)?;
            let mut per_value = vec![0u64; tracked.values.len()];
            for row in 0..column.len() {
                let Some(value) = column.value(row) else { continue };
                let value = value.to_string();
                if let Some(i) = tracked.values.iter().position(|v| *v == value) {
                    per_value[i] += 1;
                }
            }
            counts.extend(
                tracked
                    .values
                    .iter()
                    .zip(per_value)
                    .map(|(v, n)| (format!("{}.{v}", tracked.column), n)),
            );
        }
        Ok(StepSummaryRow {
            tick: tick.0,
            unix_time_secs: self.unix_time(tick),
            population: population.len() as u64,
            counts,
        })
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: MetricsWriter> SimObserver for SimOutputObserver<W> {
    fn on_step_end(&mut self, tick: Tick, population: &PopulationTable) {
        let result = self
            .summarise(tick, population)
            .and_then(|row| self.writer.write_step_summary(&row));
        self.store_err(result);
    }

    fn on_sim_end(&mut self, final_tick: Tick, metrics: &Metrics) {
        let rows: Vec<MetricRow> = metrics
            .iter()
            .map(|(name, value)| MetricRow { tick: final_tick.0, name: name.to_string(), value })
            .collect();
        let result = self.writer.write_metrics(&rows).and_then(|()| self.writer.finish());
        self.store_err(result);
    }
}
