//! The `Simulation` struct and its step loop.

use ms_component::{ComponentManager, Metrics, SimulantData};
use ms_core::{ConfigTree, Randomness, SimClock, SimConfig, SimulantId, Tick};
use ms_events::{Event, Phase};
use ms_population::PopulationTable;
use tracing::{debug, info};

use crate::{SimError, SimObserver, SimResult};

/// A set-up simulation, ready to step.
///
/// Each [`step`](Self::step) emits the step phases in fixed order over every
/// simulant:
///
/// 1. `time_step__prepare`
/// 2. `time_step`
/// 3. `time_step__cleanup`
/// 4. `collect_metrics`
///
/// then advances the clock.  `post_setup` is emitted once by
/// [`SimBuilder::build`][crate::SimBuilder::build] and `simulation_end` once by
/// [`finalize`](Self::finalize).  A failing hook aborts the rest of its phase
/// and the step; the clock does not advance.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation {
    /// Run parameters (total steps, seed, step size, …).
    pub(crate) config: SimConfig,

    /// The frozen model configuration.
    pub(crate) configuration: ConfigTree,

    pub(crate) clock: SimClock,

    pub(crate) randomness: Randomness,

    pub(crate) components: ComponentManager,

    /// The one population table.  Components reach it only through their
    /// views.
    pub(crate) population: PopulationTable,

    pub(crate) metrics: Metrics,

    pub(crate) finalized: bool,
}

impl Simulation {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`, then finalize.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.observed_step(observer)?;
        }
        self.finalize()?;
        observer.on_sim_end(self.clock.current_tick, &self.metrics);
        info!(
            tick = self.clock.current_tick.0,
            simulants = self.population.len(),
            "simulation finished"
        );
        Ok(())
    }

    /// Run exactly `n` steps from the current position (ignores `end_tick`,
    /// does not finalize).
    pub fn run_steps<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.observed_step(observer)?;
        }
        Ok(())
    }

    /// Emit the four step phases over all simulants and advance the clock.
    pub fn step(&mut self) -> SimResult<()> {
        self.ensure_active("step")?;
        let event = self.event();
        for phase in Phase::STEP_SEQUENCE {
            self.emit(phase, &event)?;
        }
        debug!(tick = event.tick.0, "step complete");
        self.clock.advance();
        Ok(())
    }

    /// Emit `simulation_end`.  Only once; later calls to `step`,
    /// `add_simulants` or `finalize` are lifecycle errors.
    pub fn finalize(&mut self) -> SimResult<()> {
        self.ensure_active("finalize")?;
        let event = self.event();
        self.emit(Phase::SimulationEnd, &event)?;
        self.finalized = true;
        Ok(())
    }

    /// Create `n` simulants at the current tick and run every initializer
    /// over them.
    pub fn add_simulants(&mut self, n: usize) -> SimResult<Vec<SimulantId>> {
        self.ensure_active("add_simulants")?;
        let index = self.population.add_simulants(n)?;
        let pop = SimulantData {
            index,
            creation_tick:  self.clock.current_tick,
            step_size_secs: self.config.step_size_secs,
        };
        self.components.initialize_simulants(
            &pop,
            &mut self.population,
            &mut self.metrics,
            self.randomness,
        )?;
        debug!(count = n, "simulants initialized");
        Ok(pop.index)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn configuration(&self) -> &ConfigTree {
        &self.configuration
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn randomness(&self) -> Randomness {
        self.randomness
    }

    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    pub fn population(&self) -> &PopulationTable {
        &self.population
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Values of pipeline `name` for the simulants in `index`, evaluated
    /// against the current table.
    pub fn value(&self, name: &str, index: &[SimulantId]) -> SimResult<Vec<f64>> {
        let values = self.components.values(
            &self.population,
            self.clock.current_tick,
            self.config.step_size_secs,
        );
        Ok(values.evaluate(name, index)?)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    // ── Internals ─────────────────────────────────────────────────────────

    pub(crate) fn emit_post_setup(&mut self) -> SimResult<()> {
        let event = self.event();
        self.emit(Phase::PostSetup, &event)
    }

    fn observed_step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_step_start(now);
        self.step()?;
        observer.on_step_end(now, &self.population);
        Ok(())
    }

    fn event(&self) -> Event {
        Event::new(
            self.population.ids(),
            self.clock.current_tick,
            self.config.step_size_secs,
        )
    }

    fn emit(&mut self, phase: Phase, event: &Event) -> SimResult<()> {
        self.components.emit(
            phase,
            event,
            &mut self.population,
            &mut self.metrics,
            self.randomness,
        )?;
        Ok(())
    }

    fn ensure_active(&self, operation: &str) -> SimResult<()> {
        if self.finalized {
            return Err(SimError::Lifecycle(format!(
                "{operation} called after the simulation was finalized"
            )));
        }
        Ok(())
    }
}
