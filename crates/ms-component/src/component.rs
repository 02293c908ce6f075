//! The `Component` trait: the main extension point for model code.

use ms_core::{SimulantId, Tick};
use ms_events::{Event, Phase, Priority};
use ms_population::{Query, RequiredColumns};

use crate::{ComponentArg, ComponentResult, HookContext, SetupContext};

// ── PhaseSet ──────────────────────────────────────────────────────────────────

/// The phases a component listens to and the priority of each listener.
///
/// Decided once, when the component is set up.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseSet {
    priorities: [Option<Priority>; 6],
}

impl PhaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to `phase` at `priority`.  Replaces any earlier priority for
    /// the same phase.
    pub fn on(mut self, phase: Phase, priority: Priority) -> Self {
        self.priorities[phase.index()] = Some(priority);
        self
    }

    /// Listen to `phase` at [`Priority::DEFAULT`].
    pub fn with(self, phase: Phase) -> Self {
        self.on(phase, Priority::DEFAULT)
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.priorities[phase.index()].is_some()
    }

    pub fn priority(&self, phase: Phase) -> Option<Priority> {
        self.priorities[phase.index()]
    }

    /// `(phase, priority)` pairs in phase order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, Priority)> + '_ {
        Phase::ALL
            .into_iter()
            .filter_map(|phase| self.priority(phase).map(|p| (phase, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.iter().all(Option::is_none)
    }
}

// ── Simulant initialization ───────────────────────────────────────────────────

/// What a component's simulant initializer needs to have run first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitializerSpec {
    /// Columns that earlier initializers must create.
    pub requires_columns: Vec<String>,
}

impl InitializerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requires<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self { requires_columns: names.into_iter().map(Into::into).collect() }
    }
}

/// The batch of newly created simulants passed to initializers.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulantData {
    pub index:          Vec<SimulantId>,
    pub creation_tick:  Tick,
    pub step_size_secs: u32,
}

// ── Component ─────────────────────────────────────────────────────────────────

/// A unit of modular simulation logic.
///
/// Only [`type_name`](Self::type_name) is required.  Everything else
/// defaults to "declares nothing, does nothing", so a component only
/// overrides what it actually uses.
///
/// # Lifecycle
///
/// 1. Added to the manager: its identity is derived from
///    [`type_name`](Self::type_name) and [`arguments`](Self::arguments) and
///    fixed; its [`sub_components`](Self::sub_components) are taken and added
///    after it.
/// 2. Set up once: lookup tables are built, [`setup`](Self::setup) runs, the
///    population view is bound and listeners are registered for every phase
///    in [`phases`](Self::phases).
/// 3. Active: [`on_event`](Self::on_event) is called for each registered
///    phase, [`on_initialize_simulants`](Self::on_initialize_simulants)
///    whenever simulants are created.
///
/// # Example
///
/// ```rust,ignore
/// struct Aging;
///
/// impl Component for Aging {
///     fn type_name(&self) -> &'static str { "Aging" }
///     fn columns_created(&self) -> Vec<String> { vec!["age".into()] }
///     fn phases(&self) -> PhaseSet { PhaseSet::new().with(Phase::TimeStep) }
///
///     fn on_event(&mut self, _: Phase, event: &Event, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
///         let mut pop = ctx.get(&event.index)?;
///         let aged: Vec<f64> = pop.f64s("age")?.iter().map(|a| a + event.step_size_years()).collect();
///         pop.insert_column("age", aged.into())?;
///         ctx.update(&pop)
///     }
/// }
/// ```
pub trait Component: 'static {
    /// The CamelCase type name the component's name is derived from.
    fn type_name(&self) -> &'static str;

    /// Constructor arguments, in declaration order.
    fn arguments(&self) -> Vec<ComponentArg<'_>> {
        Vec::new()
    }

    /// Child components.  Called once, after the identity is fixed; the
    /// children are added (and later set up) right after this component.
    fn sub_components(&mut self) -> Vec<Box<dyn Component>> {
        Vec::new()
    }

    /// YAML applied at the `component_configs` layer before setup.
    fn configuration_defaults(&self) -> Option<String> {
        None
    }

    fn columns_created(&self) -> Vec<String> {
        Vec::new()
    }

    fn columns_required(&self) -> RequiredColumns {
        RequiredColumns::None
    }

    fn population_view_query(&self) -> Option<Query> {
        None
    }

    /// Names of lookup tables to build from
    /// `configuration[<component name>][<table name>]`.
    fn lookup_tables(&self) -> Vec<String> {
        Vec::new()
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::new()
    }

    /// `Some` registers [`on_initialize_simulants`](Self::on_initialize_simulants)
    /// as an initializer for the columns this component creates.
    fn initializer(&self) -> Option<InitializerSpec> {
        None
    }

    fn setup(&mut self, _ctx: &mut SetupContext<'_>) -> ComponentResult<()> {
        Ok(())
    }

    fn on_initialize_simulants(
        &mut self,
        _pop: &SimulantData,
        _ctx: &mut HookContext<'_>,
    ) -> ComponentResult<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        _phase: Phase,
        _event: &Event,
        _ctx:   &mut HookContext<'_>,
    ) -> ComponentResult<()> {
        Ok(())
    }
}
