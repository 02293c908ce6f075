//! Simulation observer trait for progress reporting and data collection.

use ms_component::Metrics;
use ms_core::Tick;
use ms_population::PopulationTable;

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] at key
/// points in the step loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_step_end(&mut self, tick: Tick, population: &PopulationTable) {
///         if tick.0 % self.interval == 0 {
///             println!("{tick}: {} simulants", population.len());
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each step, before any phase is emitted.
    fn on_step_start(&mut self, _tick: Tick) {}

    /// Called after the collect-metrics phase of each step, before the clock
    /// advances.
    fn on_step_end(&mut self, _tick: Tick, _population: &PopulationTable) {}

    /// Called once after the simulation-end phase.
    fn on_sim_end(&mut self, _final_tick: Tick, _metrics: &Metrics) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
