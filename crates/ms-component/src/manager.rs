//! `ComponentManager`: owns every component, runs their setup and routes
//! lifecycle events to them.
//!
//! # Setup order (per component, in add order)
//!
//! ```text
//! ① scoped span      info_span!("component", name = …)
//! ② lookup tables    configuration[name][table] → LookupTable
//! ③ custom setup     Component::setup, value sources and mutators
//! ④ population view  created/required precedence → PopulationView
//! ⑤ listeners        one per phase in Component::phases, at its priority
//!    initializer     if Component::initializer is Some
//! ```
//!
//! Components added later are set up later, so a sub-component always sees
//! its parent's setup completed.

use ms_core::{ConfigTree, CoreError, Randomness, Tick};
use ms_events::{Event, EventManager, Phase, Priority};
use ms_lookup::{DataSource, LookupConfig, LookupError, LookupTable};
use ms_population::{resolve_view_columns, PopulationTable, PopulationView};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, info_span, Span};

use crate::{
    Component, ComponentError, ComponentIdentity, ComponentResult, HookContext, HookFailure,
    Metrics, PhaseSet, SetupContext, SimulantData, ValueRegistry, Values,
};

/// Configuration layer component defaults are written to.
pub const COMPONENT_CONFIG_LAYER: &str = "component_configs";

const SETUP: &str = "setup";
const INITIALIZE_SIMULANTS: &str = "initialize_simulants";

/// Run-wide inputs to component setup.
pub struct SetupInputs<'a> {
    pub configuration:  &'a ConfigTree,
    pub data:           &'a dyn DataSource,
    pub randomness:     Randomness,
    pub step_size_secs: u32,
}

/// Everything the manager binds to a component at setup.
pub(crate) struct Slot {
    pub(crate) identity: ComponentIdentity,
    pub(crate) span:     Span,
    pub(crate) view:     Option<PopulationView>,
    pub(crate) lookups:  FxHashMap<String, LookupTable>,
    pub(crate) phases:   PhaseSet,
}

#[derive(Default)]
pub struct ComponentManager {
    /// `components[i]` is bound by `slots[i]`.
    components:     Vec<Box<dyn Component>>,
    slots:          Vec<Slot>,
    values:         ValueRegistry,
    names:          FxHashSet<String>,
    events:         EventManager<usize>,
    initializers:   Vec<usize>,
    setup_complete: bool,
}

impl ComponentManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Add a component and, depth-first, its sub-components.
    ///
    /// The component's identity is fixed here.  Names must be unique.
    pub fn add(&mut self, mut component: Box<dyn Component>) -> ComponentResult<()> {
        if self.setup_complete {
            return Err(ComponentError::Lifecycle(
                "components cannot be added after setup".into(),
            ));
        }
        let identity = ComponentIdentity::of(component.as_ref());
        if !self.names.insert(identity.name.clone()) {
            return Err(ComponentError::DuplicateName(identity.name));
        }
        debug!(component = identity.name.as_str(), repr = identity.repr.as_str(), "component added");

        let children = component.sub_components();
        self.components.push(component);
        self.slots.push(Slot {
            identity,
            span: Span::none(),
            view: None,
            lookups: FxHashMap::default(),
            phases: PhaseSet::new(),
        });
        for child in children {
            self.add(child)?;
        }
        Ok(())
    }

    /// Write every component's configuration defaults into `config`.
    pub fn apply_configuration_defaults(&self, config: &mut ConfigTree) -> ComponentResult<()> {
        for (component, slot) in self.components.iter().zip(&self.slots) {
            if let Some(yaml) = component.configuration_defaults() {
                config.update_yaml(&yaml, COMPONENT_CONFIG_LAYER, &slot.identity.name)?;
            }
        }
        Ok(())
    }

    // ── Setup ─────────────────────────────────────────────────────────────

    /// Set up every component once, in add order.
    pub fn setup(&mut self, inputs: &SetupInputs<'_>) -> Result<(), HookFailure> {
        let failure = |component: &str, source: ComponentError| HookFailure {
            phase: SETUP,
            component: component.to_string(),
            source,
        };
        if self.setup_complete {
            return Err(failure(
                "",
                ComponentError::Lifecycle("components are already set up".into()),
            ));
        }

        let order: u8 = inputs
            .configuration
            .get_or(&["interpolation", "order"], 0u8)
            .map_err(|e| failure("", e.into()))?;
        if order > 1 {
            return Err(failure("", LookupError::UnsupportedOrder(order).into()));
        }

        let mut initialized = FxHashSet::default();
        for idx in 0..self.slots.len() {
            self.setup_slot(idx, inputs, order, &mut initialized)
                .map_err(|source| failure(&self.slots[idx].identity.name, source))?;
        }
        self.setup_complete = true;
        info!(components = self.slots.len(), "component setup complete");
        Ok(())
    }

    fn setup_slot(
        &mut self,
        idx:         usize,
        inputs:      &SetupInputs<'_>,
        order:       u8,
        initialized: &mut FxHashSet<String>,
    ) -> ComponentResult<()> {
        let slot = &mut self.slots[idx];
        let component = &mut self.components[idx];
        let name = slot.identity.name.clone();

        // ① scoped span
        let span = info_span!("component", name = name.as_str());
        let _entered = span.enter();
        slot.span = span.clone();

        // ② lookup tables
        for table_name in component.lookup_tables() {
            let config: LookupConfig = inputs
                .configuration
                .get_as(&[name.as_str(), table_name.as_str()])
                .map_err(|e| match e {
                    CoreError::MissingKey(key) => ComponentError::Configuration(format!(
                        "lookup table {table_name:?} has no configuration at {key:?}"
                    )),
                    other => other.into(),
                })?;
            let table = LookupTable::build(
                &format!("{name}.{table_name}"),
                &config,
                inputs.data,
                order,
            )?;
            slot.lookups.insert(table_name, table);
        }

        // ③ custom setup
        let mut ctx = SetupContext {
            name:                &name,
            configuration:       inputs.configuration,
            data:                inputs.data,
            randomness:          inputs.randomness,
            step_size_secs:      inputs.step_size_secs,
            interpolation_order: order,
            lookups:             &mut slot.lookups,
            values:              &mut self.values,
            owner:               idx,
        };
        component.setup(&mut ctx)?;

        // ④ population view
        let created = component.columns_created();
        let required = component.columns_required();
        let columns = resolve_view_columns(&created, &required)
            .map_err(|e| ComponentError::Configuration(e.to_string()))?;
        slot.view = columns.map(|columns| {
            PopulationView::new(
                name.clone(),
                columns,
                created.clone(),
                component.population_view_query(),
            )
        });

        // ⑤ listeners and initializer
        slot.phases = component.phases();
        for (phase, priority) in slot.phases.iter() {
            self.events.register_listener(phase, idx, priority);
        }

        if let Some(spec) = component.initializer() {
            if let Some(missing) = spec.requires_columns.iter().find(|c| !initialized.contains(*c)) {
                return Err(ComponentError::Configuration(format!(
                    "initializer requires column {missing:?}, which no earlier initializer creates"
                )));
            }
            for column in &created {
                if !initialized.insert(column.clone()) {
                    return Err(ComponentError::Configuration(format!(
                        "column {column:?} is initialized by more than one component"
                    )));
                }
            }
            self.initializers.push(idx);
        }

        debug!(
            view = slot.view.is_some(),
            lookups = slot.lookups.len(),
            listeners = slot.phases.iter().count(),
            "component set up"
        );
        Ok(())
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Run every simulant initializer, in registration order, over `pop`.
    pub fn initialize_simulants(
        &mut self,
        pop:        &SimulantData,
        table:      &mut PopulationTable,
        metrics:    &mut Metrics,
        randomness: Randomness,
    ) -> Result<(), HookFailure> {
        let Self { components, slots, values, initializers, .. } = self;
        let slots: &[Slot] = slots;
        let values: &ValueRegistry = values;
        for &idx in initializers.iter() {
            let Slot { identity, span, view, lookups, .. } = &slots[idx];
            let _entered = span.enter();
            let mut ctx = HookContext {
                name: &identity.name,
                view: view.as_ref(),
                lookups,
                values,
                owners: slots,
                table: &mut *table,
                metrics: &mut *metrics,
                randomness,
                tick: pop.creation_tick,
                step_size_secs: pop.step_size_secs,
            };
            components[idx]
                .on_initialize_simulants(pop, &mut ctx)
                .map_err(|source| HookFailure {
                    phase: INITIALIZE_SIMULANTS,
                    component: identity.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Dispatch `event` to every listener of `phase`, in priority order.
    /// The first failure aborts the rest of the phase.
    pub fn emit(
        &mut self,
        phase:      Phase,
        event:      &Event,
        table:      &mut PopulationTable,
        metrics:    &mut Metrics,
        randomness: Randomness,
    ) -> Result<(), HookFailure> {
        let Self { components, slots, values, events, .. } = self;
        let slots: &[Slot] = slots;
        let values: &ValueRegistry = values;
        events.emit(phase, event, |idx, event| {
            let Slot { identity, span, view, lookups, .. } = &slots[idx];
            let _entered = span.enter();
            let mut ctx = HookContext {
                name: &identity.name,
                view: view.as_ref(),
                lookups,
                values,
                owners: slots,
                table: &mut *table,
                metrics: &mut *metrics,
                randomness,
                tick: event.tick,
                step_size_secs: event.step_size_secs,
            };
            components[idx]
                .on_event(phase, event, &mut ctx)
                .map_err(|source| HookFailure {
                    phase: phase.as_str(),
                    component: identity.name.clone(),
                    source,
                })
        })
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_set_up(&self) -> bool {
        self.setup_complete
    }

    /// Component names in add order.
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.identity.name.as_str()).collect()
    }

    pub fn identity(&self, name: &str) -> Option<&ComponentIdentity> {
        self.slot(name).map(|s| &s.identity)
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.identity.name == name)
    }

    /// `(priority, component name)` for each listener of `phase`, in
    /// dispatch order.
    pub fn listeners(&self, phase: Phase) -> Vec<(Priority, &str)> {
        self.events
            .listeners_with_priority(phase)
            .into_iter()
            .map(|(p, idx)| (p, self.slots[idx].identity.name.as_str()))
            .collect()
    }

    /// Names of the components with simulant initializers, in run order.
    pub fn initializers(&self) -> Vec<&str> {
        self.initializers
            .iter()
            .map(|&idx| self.slots[idx].identity.name.as_str())
            .collect()
    }

    pub fn view(&self, name: &str) -> Option<&PopulationView> {
        self.slot(name).and_then(|s| s.view.as_ref())
    }

    pub fn lookup_table(&self, component: &str, table: &str) -> Option<&LookupTable> {
        self.slot(component).and_then(|s| s.lookups.get(table))
    }

    pub fn value_registry(&self) -> &ValueRegistry {
        &self.values
    }

    /// Pipeline access over `table` outside any hook.
    pub fn values<'a>(&'a self, table: &'a PopulationTable, tick: Tick, step_size_secs: u32) -> Values<'a> {
        Values {
            registry: &self.values,
            owners: &self.slots,
            table,
            tick,
            step_size_secs,
        }
    }

    pub fn phases(&self, name: &str) -> Option<PhaseSet> {
        self.slot(name).map(|s| s.phases)
    }
}
