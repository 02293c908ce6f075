//! Named value pipelines.
//!
//! A pipeline yields one `f64` per simulant.  One component registers its
//! source; any number of components register mutators, which run in
//! registration order over the source's output:
//!
//! ```text
//! source(index) → mutator₁(index, v) → … → mutatorₙ(index, v)
//! ```
//!
//! Each source or mutator runs with the population view and lookup tables
//! of the component that registered it, inside that component's span.

use std::fmt;

use ms_core::{CoreError, SimulantId, Tick, SECS_PER_YEAR};
use ms_lookup::LookupTable;
use ms_population::{Frame, PopulationTable, PopulationView};
use rustc_hash::FxHashMap;

use crate::manager::Slot;
use crate::{ComponentError, ComponentResult};

/// Computes a pipeline's base values for `index`.
pub type ValueSourceFn =
    dyn Fn(&[SimulantId], &ValueContext<'_>) -> ComponentResult<Vec<f64>> + Send + Sync;

/// Transforms a pipeline's values for `index`.
pub type ValueMutatorFn =
    dyn Fn(&[SimulantId], Vec<f64>, &ValueContext<'_>) -> ComponentResult<Vec<f64>> + Send + Sync;

#[derive(Default)]
struct Pipeline {
    source:   Option<(usize, Box<ValueSourceFn>)>,
    mutators: Vec<(usize, Box<ValueMutatorFn>)>,
}

// ── ValueRegistry ─────────────────────────────────────────────────────────────

/// Every pipeline of a simulation, keyed by name.  Filled during setup.
#[derive(Default)]
pub struct ValueRegistry {
    pipelines: FxHashMap<String, Pipeline>,
}

impl ValueRegistry {
    pub(crate) fn register_source(
        &mut self,
        name:   &str,
        owner:  usize,
        source: Box<ValueSourceFn>,
    ) -> ComponentResult<()> {
        let pipeline = self.pipelines.entry(name.to_string()).or_default();
        if pipeline.source.is_some() {
            return Err(ComponentError::Configuration(format!(
                "value pipeline {name:?} already has a source"
            )));
        }
        pipeline.source = Some((owner, source));
        Ok(())
    }

    pub(crate) fn register_mutator(&mut self, name: &str, owner: usize, mutator: Box<ValueMutatorFn>) {
        self.pipelines
            .entry(name.to_string())
            .or_default()
            .mutators
            .push((owner, mutator));
    }

    /// Pipeline names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pipelines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.pipelines.get(name).is_some_and(|p| p.source.is_some())
    }

    pub fn mutator_count(&self, name: &str) -> usize {
        self.pipelines.get(name).map_or(0, |p| p.mutators.len())
    }
}

impl fmt::Debug for ValueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRegistry").field("pipelines", &self.names()).finish()
    }
}

// ── Values ────────────────────────────────────────────────────────────────────

/// Read access to every pipeline for one tick.
#[derive(Clone, Copy)]
pub struct Values<'a> {
    pub(crate) registry:       &'a ValueRegistry,
    pub(crate) owners:         &'a [Slot],
    pub(crate) table:          &'a PopulationTable,
    pub(crate) tick:           Tick,
    pub(crate) step_size_secs: u32,
}

impl<'a> Values<'a> {
    /// The values of pipeline `name` for the simulants in `index`.
    pub fn evaluate(&self, name: &str, index: &[SimulantId]) -> ComponentResult<Vec<f64>> {
        let pipeline = self
            .registry
            .pipelines
            .get(name)
            .ok_or_else(|| ComponentError::UnknownValue(name.to_string()))?;
        let (owner, source) = pipeline.source.as_ref().ok_or_else(|| {
            ComponentError::Configuration(format!("value pipeline {name:?} has no source"))
        })?;

        let mut values = {
            let slot = &self.owners[*owner];
            let _entered = slot.span.enter();
            source(index, &self.context(slot))?
        };
        check_len(index.len(), values.len())?;

        for (owner, mutator) in &pipeline.mutators {
            let slot = &self.owners[*owner];
            let _entered = slot.span.enter();
            values = mutator(index, values, &self.context(slot))?;
            check_len(index.len(), values.len())?;
        }
        Ok(values)
    }

    pub fn registry(&self) -> &'a ValueRegistry {
        self.registry
    }

    fn context(&self, slot: &'a Slot) -> ValueContext<'a> {
        ValueContext {
            name:           &slot.identity.name,
            view:           slot.view.as_ref(),
            lookups:        &slot.lookups,
            table:          self.table,
            tick:           self.tick,
            step_size_secs: self.step_size_secs,
        }
    }
}

impl fmt::Debug for Values<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values")
            .field("pipelines", &self.registry.names())
            .field("tick", &self.tick)
            .finish()
    }
}

fn check_len(expected: usize, got: usize) -> ComponentResult<()> {
    if expected != got {
        return Err(CoreError::LengthMismatch { what: "pipeline values", expected, got }.into());
    }
    Ok(())
}

// ── ValueContext ──────────────────────────────────────────────────────────────

/// What a source or mutator can read: its owner's view and lookup tables.
pub struct ValueContext<'a> {
    name:           &'a str,
    view:           Option<&'a PopulationView>,
    lookups:        &'a FxHashMap<String, LookupTable>,
    table:          &'a PopulationTable,
    tick:           Tick,
    step_size_secs: u32,
}

impl ValueContext<'_> {
    /// Name of the component that registered this source or mutator.
    pub fn component_name(&self) -> &str {
        self.name
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn step_size_years(&self) -> f64 {
        self.step_size_secs as f64 / SECS_PER_YEAR
    }

    /// Every simulant in the table.
    pub fn simulants(&self) -> Vec<SimulantId> {
        self.table.ids()
    }

    pub fn get_columns(&self, index: &[SimulantId], columns: &[&str]) -> ComponentResult<Frame> {
        let view = self
            .view
            .ok_or_else(|| ComponentError::NoPopulationView(self.name.to_string()))?;
        Ok(view.get_columns(self.table, index, columns)?)
    }

    pub fn lookup(&self, name: &str, index: &[SimulantId]) -> ComponentResult<Vec<f64>> {
        let table = self.lookups.get(name).ok_or_else(|| ComponentError::UnknownLookup {
            component: self.name.to_string(),
            table:     name.to_string(),
        })?;
        Ok(table.evaluate(self.table, index)?)
    }
}
