//! `StateMachineComponent`: a [`Machine`] plugged into the simulation.

use ms_component::{
    Component, ComponentArg, ComponentResult, HookContext, InitializerSpec, PhaseSet, SimulantData,
};
use ms_core::SimulantId;
use ms_events::{Event, Phase, Priority};
use ms_population::{Column, Frame, RequiredColumns, Value};
use rustc_hash::FxHashMap;

use crate::{Machine, StateError, StateResult, StepContext};

/// The state new simulants start in.
#[derive(Clone, Debug, PartialEq)]
pub enum InitialState {
    Fixed(String),
    /// A weighted draw over state ids.
    Weighted(Vec<(String, f64)>),
}

/// Owns the machine's state column.  New simulants get an initial state;
/// on every time step the whole population is transitioned once.
///
/// The view covers all columns so probability functions can read any
/// attribute, but only the state column and any extra columns declared
/// with [`with_column`](Self::with_column) are written back.  Entry counts
/// are accumulated as `<state column>.<from>_to_<to>` metrics.
pub struct StateMachineComponent {
    machine:  Machine,
    initial:  InitialState,
    priority: Priority,
    extra:    Vec<(String, Value)>,
}

impl StateMachineComponent {
    pub fn new(machine: Machine, initial: InitialState) -> StateResult<Self> {
        let ids: Vec<&str> = match &initial {
            InitialState::Fixed(id) => vec![id.as_str()],
            InitialState::Weighted(weights) => weights.iter().map(|(id, _)| id.as_str()).collect(),
        };
        if let Some(unknown) = ids.iter().find(|id| machine.state(id).is_none()) {
            return Err(StateError::Configuration(format!(
                "initial state {unknown:?} is not a state of the {:?} machine",
                machine.state_column()
            )));
        }
        Ok(Self { machine, initial, priority: Priority::DEFAULT, extra: Vec::new() })
    }

    /// Priority of the time-step listener.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Create another column, filled with `initial` for new simulants, that
    /// side effects may update.
    pub fn with_column(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.extra.push((name.into(), initial.into()));
        self
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    fn initial_states(&self, pop: &SimulantData, ctx: &HookContext<'_>) -> ComponentResult<Column> {
        Ok(match &self.initial {
            InitialState::Fixed(id) => Column::filled(&Value::Str(id.clone()), pop.index.len()),
            InitialState::Weighted(weights) => {
                let (ids, weights): (Vec<String>, Vec<f64>) = weights.iter().cloned().unzip();
                let key = format!("{}.initial", self.machine.state_column());
                ctx.stream(&key)
                    .choice(&pop.index, pop.creation_tick, &ids, &weights)?
                    .into()
            }
        })
    }
}

impl Component for StateMachineComponent {
    fn type_name(&self) -> &'static str {
        "StateMachine"
    }

    fn arguments(&self) -> Vec<ComponentArg<'_>> {
        vec![ComponentArg::value("state_column", self.machine.state_column())]
    }

    fn columns_created(&self) -> Vec<String> {
        std::iter::once(self.machine.state_column().to_string())
            .chain(self.extra.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    fn columns_required(&self) -> RequiredColumns {
        RequiredColumns::All
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::new().on(Phase::TimeStep, self.priority)
    }

    fn initializer(&self) -> Option<InitializerSpec> {
        Some(InitializerSpec::new())
    }

    fn on_initialize_simulants(
        &mut self,
        pop: &SimulantData,
        ctx: &mut HookContext<'_>,
    ) -> ComponentResult<()> {
        let mut frame = Frame::new(pop.index.clone());
        frame.insert_column(self.machine.state_column(), self.initial_states(pop, ctx)?)?;
        for (name, value) in &self.extra {
            frame.insert_column(name, Column::filled(value, pop.index.len()))?;
        }
        ctx.update(&frame)
    }

    fn on_event(
        &mut self,
        phase: Phase,
        event: &Event,
        ctx:   &mut HookContext<'_>,
    ) -> ComponentResult<()> {
        if phase != Phase::TimeStep {
            return Ok(());
        }
        let column = self.machine.state_column();
        let population = ctx.get(&event.index)?;
        let before: FxHashMap<SimulantId, String> = population
            .index()
            .iter()
            .copied()
            .zip(population.strs(column)?.iter().cloned())
            .collect();

        let step = StepContext::from_event(event, ctx.randomness()).with_values(ctx.values());
        let result = self.machine.transition(population, &step)?;

        let mut entered: FxHashMap<(&str, &str), usize> = FxHashMap::default();
        for (id, to) in result.index().iter().zip(result.strs(column)?) {
            if let Some(from) = before.get(id) {
                if from != to {
                    *entered.entry((from.as_str(), to.as_str())).or_default() += 1;
                }
            }
        }
        for ((from, to), count) in entered {
            ctx.metrics().add(&format!("{column}.{from}_to_{to}"), count as f64);
        }

        let mut update = Frame::new(result.index().to_vec());
        for name in self.columns_created() {
            update.insert_column(&name, result.column(&name)?.clone())?;
        }
        ctx.update(&update)
    }
}
