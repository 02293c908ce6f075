//! What a component can reach during setup and inside hooks.

use ms_core::{ConfigTree, CoreError, Randomness, RandomnessStream, SimulantId, Tick, SECS_PER_YEAR};
use ms_lookup::{DataSource, LookupConfig, LookupTable};
use ms_population::{Frame, PopulationTable, PopulationView};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::manager::Slot;
use crate::{ComponentError, ComponentResult, Metrics, ValueContext, ValueRegistry, Values};

// ── SetupContext ──────────────────────────────────────────────────────────────

/// Passed to [`Component::setup`](crate::Component::setup).
pub struct SetupContext<'a> {
    pub(crate) name:                &'a str,
    pub(crate) configuration:       &'a ConfigTree,
    pub(crate) data:                &'a dyn DataSource,
    pub(crate) randomness:          Randomness,
    pub(crate) step_size_secs:      u32,
    pub(crate) interpolation_order: u8,
    pub(crate) lookups:             &'a mut FxHashMap<String, LookupTable>,
    pub(crate) values:              &'a mut ValueRegistry,
    /// Position of this component in the manager.
    pub(crate) owner:               usize,
}

impl<'a> SetupContext<'a> {
    pub fn component_name(&self) -> &str {
        self.name
    }

    pub fn configuration(&self) -> &ConfigTree {
        self.configuration
    }

    /// Deserialize `configuration[<component name>][path…]`.
    pub fn config_as<T: DeserializeOwned>(&self, path: &[&str]) -> ComponentResult<T> {
        let mut full = vec![self.name];
        full.extend_from_slice(path);
        self.configuration.get_as(&full).map_err(|e| match e {
            CoreError::MissingKey(key) => {
                ComponentError::Configuration(format!("missing configuration key {key:?}"))
            }
            other => ComponentError::Core(other),
        })
    }

    pub fn data_source(&self) -> &dyn DataSource {
        self.data
    }

    pub fn randomness(&self, key: &str) -> RandomnessStream {
        self.randomness.stream(key)
    }

    pub fn step_size_secs(&self) -> u32 {
        self.step_size_secs
    }

    /// A table built from the component's declared lookup tables.
    pub fn lookup_table(&self, name: &str) -> Option<&LookupTable> {
        self.lookups.get(name)
    }

    /// Build an extra lookup table from an explicit configuration and make
    /// it available to hooks under `name`.
    pub fn build_lookup_table(&mut self, name: &str, config: &LookupConfig) -> ComponentResult<()> {
        let table = LookupTable::build(
            &format!("{}.{name}", self.name),
            config,
            self.data,
            self.interpolation_order,
        )?;
        self.lookups.insert(name.to_string(), table);
        Ok(())
    }

    // ── Value pipelines ───────────────────────────────────────────────────

    /// Make this component the source of pipeline `name`.  A pipeline has
    /// exactly one source.
    pub fn register_value_source(
        &mut self,
        name:   &str,
        source: impl Fn(&[SimulantId], &ValueContext<'_>) -> ComponentResult<Vec<f64>> + Send + Sync + 'static,
    ) -> ComponentResult<()> {
        self.values.register_source(name, self.owner, Box::new(source))?;
        debug!(pipeline = name, "value source registered");
        Ok(())
    }

    /// Append a mutator to pipeline `name`.  Mutators run in registration
    /// order.
    pub fn register_value_mutator(
        &mut self,
        name:    &str,
        mutator: impl Fn(&[SimulantId], Vec<f64>, &ValueContext<'_>) -> ComponentResult<Vec<f64>>
            + Send
            + Sync
            + 'static,
    ) {
        self.values.register_mutator(name, self.owner, Box::new(mutator));
        debug!(pipeline = name, "value mutator registered");
    }
}

// ── HookContext ───────────────────────────────────────────────────────────────

/// Passed to every hook.  All population access goes through the
/// component's own view.
pub struct HookContext<'a> {
    pub(crate) name:           &'a str,
    pub(crate) view:           Option<&'a PopulationView>,
    pub(crate) lookups:        &'a FxHashMap<String, LookupTable>,
    pub(crate) values:         &'a ValueRegistry,
    pub(crate) owners:         &'a [Slot],
    pub(crate) table:          &'a mut PopulationTable,
    pub(crate) metrics:        &'a mut Metrics,
    pub(crate) randomness:     Randomness,
    pub(crate) tick:           Tick,
    pub(crate) step_size_secs: u32,
}

impl<'a> HookContext<'a> {
    pub fn component_name(&self) -> &str {
        self.name
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn step_size_secs(&self) -> u32 {
        self.step_size_secs
    }

    pub fn step_size_years(&self) -> f64 {
        self.step_size_secs as f64 / SECS_PER_YEAR
    }

    /// Number of simulants in the table.
    pub fn population_size(&self) -> usize {
        self.table.len()
    }

    // ── Population ────────────────────────────────────────────────────────

    pub fn view(&self) -> ComponentResult<&PopulationView> {
        self.view
            .ok_or_else(|| ComponentError::NoPopulationView(self.name.to_string()))
    }

    /// Every view column for the rows of `index` the view's query accepts.
    pub fn get(&self, index: &[SimulantId]) -> ComponentResult<Frame> {
        Ok(self.view()?.get(&*self.table, index)?)
    }

    pub fn get_columns(&self, index: &[SimulantId], columns: &[&str]) -> ComponentResult<Frame> {
        Ok(self.view()?.get_columns(&*self.table, index, columns)?)
    }

    /// Write `update` back through the view.
    pub fn update(&mut self, update: &Frame) -> ComponentResult<()> {
        let view = self
            .view
            .ok_or_else(|| ComponentError::NoPopulationView(self.name.to_string()))?;
        Ok(view.update(&mut *self.table, update)?)
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    fn lookup_table(&self, name: &str) -> ComponentResult<&LookupTable> {
        self.lookups.get(name).ok_or_else(|| ComponentError::UnknownLookup {
            component: self.name.to_string(),
            table:     name.to_string(),
        })
    }

    /// Values of lookup table `name` for the simulants in `index`.
    pub fn lookup(&self, name: &str, index: &[SimulantId]) -> ComponentResult<Vec<f64>> {
        Ok(self.lookup_table(name)?.evaluate(&*self.table, index)?)
    }

    /// Values of lookup table `name` for the rows of an already read frame.
    pub fn lookup_frame(&self, name: &str, frame: &Frame) -> ComponentResult<Vec<f64>> {
        Ok(self.lookup_table(name)?.evaluate_frame(frame)?)
    }

    // ── Value pipelines ───────────────────────────────────────────────────

    /// Every pipeline, evaluated against the current table.
    pub fn values(&self) -> Values<'_> {
        Values {
            registry:       self.values,
            owners:         self.owners,
            table:          &*self.table,
            tick:           self.tick,
            step_size_secs: self.step_size_secs,
        }
    }

    /// Values of pipeline `name` for the simulants in `index`.
    pub fn value(&self, name: &str, index: &[SimulantId]) -> ComponentResult<Vec<f64>> {
        self.values().evaluate(name, index)
    }

    // ── Randomness / metrics ──────────────────────────────────────────────

    pub fn randomness(&self) -> Randomness {
        self.randomness
    }

    pub fn stream(&self, key: &str) -> RandomnessStream {
        self.randomness.stream(key)
    }

    pub fn metrics(&mut self) -> &mut Metrics {
        &mut *self.metrics
    }
}
