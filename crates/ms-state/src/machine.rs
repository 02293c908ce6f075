//! `Machine`: moves a whole population through its states for one step.

use ms_component::Values;
use ms_core::{Randomness, SimulantId, Tick};
use ms_events::Event;
use ms_population::{Frame, Value};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{State, StateError, StateResult};

/// What a transition needs to know about the current step.
///
/// Value pipelines are reachable only when the context comes from a running
/// simulation; see [`with_values`](Self::with_values).
#[derive(Copy, Clone, Debug)]
pub struct StepContext<'a> {
    pub tick:            Tick,
    pub step_size_years: f64,
    pub randomness:      Randomness,
    values:              Option<Values<'a>>,
}

impl<'a> StepContext<'a> {
    pub fn new(tick: Tick, step_size_years: f64, randomness: Randomness) -> Self {
        Self { tick, step_size_years, randomness, values: None }
    }

    pub fn from_event(event: &Event, randomness: Randomness) -> Self {
        Self::new(event.tick, event.step_size_years(), randomness)
    }

    pub fn with_values(mut self, values: Values<'a>) -> Self {
        self.values = Some(values);
        self
    }

    /// Values of pipeline `name` for the simulants in `index`.
    pub fn value(&self, name: &str, index: &[SimulantId]) -> StateResult<Vec<f64>> {
        let values = self.values.ok_or_else(|| {
            StateError::Configuration(format!(
                "value pipeline {name:?} requested without a simulation"
            ))
        })?;
        Ok(values.evaluate(name, index)?)
    }
}

/// An ordered set of states governing one string column.
#[derive(Clone, Debug)]
pub struct Machine {
    state_column: String,
    states:       Vec<State>,
    /// Position of each state by id.
    positions:    FxHashMap<String, usize>,
    /// `targets[state][transition]` is the position of that transition's target.
    targets:      Vec<Vec<usize>>,
}

impl Machine {
    /// Fails if a state id repeats or a transition targets an undeclared state.
    pub fn new(state_column: impl Into<String>, states: Vec<State>) -> StateResult<Self> {
        let state_column = state_column.into();
        if states.is_empty() {
            return Err(StateError::Configuration(format!(
                "machine for {state_column:?} has no states"
            )));
        }

        let mut positions = FxHashMap::default();
        for (i, state) in states.iter().enumerate() {
            if positions.insert(state.id().to_string(), i).is_some() {
                return Err(StateError::DuplicateState(state.id().to_string()));
            }
        }

        let targets = states
            .iter()
            .map(|state| {
                state
                    .transition_set()
                    .transitions()
                    .iter()
                    .map(|t| {
                        positions.get(t.target()).copied().ok_or_else(|| StateError::UnknownTarget {
                            state:  state.id().to_string(),
                            target: t.target().to_string(),
                        })
                    })
                    .collect::<StateResult<Vec<_>>>()
            })
            .collect::<StateResult<Vec<_>>>()?;

        Ok(Self { state_column, states, positions, targets })
    }

    pub fn state_column(&self) -> &str {
        &self.state_column
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: &str) -> Option<&State> {
        self.positions.get(id).map(|&i| &self.states[i])
    }

    pub fn state_ids(&self) -> Vec<&str> {
        self.states.iter().map(State::id).collect()
    }

    /// Randomness stream key for transitions out of `state_id`.
    pub fn stream_key(&self, state_id: &str) -> String {
        format!("{}.{}", self.state_column, state_id)
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Apply one step of transitions to `population`.
    ///
    /// Every row must hold a declared state id in the state column.  The
    /// result has exactly the input rows, grouped by the state they started
    /// in (in declaration order).
    pub fn transition(&self, population: Frame, step: &StepContext<'_>) -> StateResult<Frame> {
        let mut cohorts: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
        {
            let values = population.strs(&self.state_column)?;
            for (row, value) in values.iter().enumerate() {
                let Some(&state) = self.positions.get(value.as_str()) else {
                    return Err(StateError::UnknownState {
                        column:   self.state_column.clone(),
                        simulant: population.index()[row],
                        value:    value.clone(),
                    });
                };
                cohorts[state].push(row);
            }
        }

        let mut parts = Vec::with_capacity(self.states.len());
        for (state, rows) in cohorts.iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            parts.push(self.apply_at(state, population.take(rows), step)?);
        }
        Ok(Frame::concat(&population, parts)?)
    }

    /// Apply the transitions of `state_id` to a cohort occupying it.
    ///
    /// A state without transitions, or an empty cohort, comes back unchanged.
    pub fn apply_to_cohort(&self, state_id: &str, cohort: Frame, step: &StepContext<'_>) -> StateResult<Frame> {
        let state = self.positions.get(state_id).copied().ok_or_else(|| {
            StateError::Configuration(format!(
                "{state_id:?} is not a state of the {:?} machine",
                self.state_column
            ))
        })?;
        self.apply_at(state, cohort, step)
    }

    fn apply_at(&self, state: usize, cohort: Frame, step: &StepContext<'_>) -> StateResult<Frame> {
        let source = &self.states[state];
        let set = source.transition_set();
        if set.is_empty() || cohort.is_empty() {
            return Ok(cohort);
        }

        let probabilities = set.outcome_probabilities(source.id(), &cohort, step)?;
        let draws = step
            .randomness
            .stream(self.stream_key(source.id()))
            .get_draw(cohort.index(), step.tick);
        let buckets = probabilities.partition(&draws)?;

        let mut parts = Vec::with_capacity(buckets.len());
        for (outcome, rows) in buckets.iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            let mut sub = cohort.take(rows);
            if Some(outcome) != probabilities.null_outcome() {
                let target = &self.states[self.targets[state][outcome]];
                sub.set_all(&self.state_column, &Value::Str(target.id().to_string()))?;
                if let Some(effect) = target.side_effect() {
                    let entered = sub.index().to_vec();
                    effect(&mut sub, step)?;
                    if sub.index() != entered.as_slice() {
                        return Err(StateError::CohortRowsChanged {
                            state:    target.id().to_string(),
                            expected: entered.len(),
                            got:      sub.len(),
                        });
                    }
                }
                trace!(from = source.id(), to = target.id(), count = rows.len(), "transition");
            }
            parts.push(sub);
        }

        debug!(
            column = self.state_column.as_str(),
            state = source.id(),
            cohort = cohort.len(),
            "applied transitions"
        );
        Ok(Frame::concat(&cohort, parts)?)
    }
}
