//! Integration tests for ms-sim.

use std::cell::RefCell;
use std::rc::Rc;

use ms_component::{
    Component, ComponentArg, ComponentError, ComponentResult, HookContext, InitializerSpec,
    PhaseSet, SimulantData,
};
use ms_core::{ConfigTree, SimConfig, Tick};
use ms_events::{Event, Phase, Priority};
use ms_population::{Frame, PopulationTable};

use crate::{Metrics, NoopObserver, SimBuilder, SimError, SimObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config(total_steps: u64, population_size: usize) -> SimConfig {
    SimConfig {
        start_unix_secs: 0,
        step_size_secs:  86_400,
        total_steps,
        seed:            42,
        population_size,
    }
}

type Log = Rc<RefCell<Vec<String>>>;

/// Records every phase it sees; optionally fails at a given tick.
struct Recorder {
    label:   &'static str,
    log:     Log,
    fail_at: Option<Tick>,
}

impl Recorder {
    fn new(label: &'static str, log: &Log) -> Self {
        Self { label, log: log.clone(), fail_at: None }
    }
}

impl Component for Recorder {
    fn type_name(&self) -> &'static str {
        "Recorder"
    }
    fn arguments(&self) -> Vec<ComponentArg<'_>> {
        vec![ComponentArg::value("label", self.label)]
    }
    fn phases(&self) -> PhaseSet {
        Phase::ALL.into_iter().fold(PhaseSet::new(), PhaseSet::with)
    }
    fn on_event(&mut self, phase: Phase, event: &Event, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
        self.log.borrow_mut().push(format!("{} {} {}", event.tick, phase, self.label));
        ctx.metrics().add("events", 1.0);
        if self.fail_at == Some(event.tick) && phase == Phase::TimeStep {
            return Err(ComponentError::Configuration("failing on purpose".into()));
        }
        Ok(())
    }
}

/// Creates and ages an `age` column.
struct Aging;

impl Component for Aging {
    fn type_name(&self) -> &'static str {
        "Aging"
    }
    fn columns_created(&self) -> Vec<String> {
        vec!["age".into()]
    }
    fn initializer(&self) -> Option<InitializerSpec> {
        Some(InitializerSpec::new())
    }
    fn configuration_defaults(&self) -> Option<String> {
        Some("aging:\n  initial_age: 20.0\n".into())
    }
    fn phases(&self) -> PhaseSet {
        PhaseSet::new().on(Phase::TimeStep, Priority::new(1).unwrap())
    }
    fn on_initialize_simulants(&mut self, pop: &SimulantData, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
        let frame = Frame::new(pop.index.clone()).with_column("age", vec![20.0; pop.index.len()])?;
        ctx.update(&frame)
    }
    fn on_event(&mut self, _: Phase, event: &Event, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
        let pop = ctx.get(&event.index)?;
        let aged: Vec<f64> = pop.f64s("age")?.iter().map(|a| a + 1.0).collect();
        let frame = Frame::new(event.index.clone()).with_column("age", aged)?;
        ctx.update(&frame)
    }
}

#[derive(Default)]
struct Counter {
    starts:  usize,
    ends:    usize,
    sim_end: Option<(Tick, f64)>,
}

impl SimObserver for Counter {
    fn on_step_start(&mut self, _t: Tick) {
        self.starts += 1;
    }
    fn on_step_end(&mut self, _t: Tick, _p: &PopulationTable) {
        self.ends += 1;
    }
    fn on_sim_end(&mut self, t: Tick, metrics: &Metrics) {
        self.sim_end = Some((t, metrics.get("events").unwrap_or(0.0)));
    }
}

// ── SimBuilder ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_initial_population() {
        let sim = SimBuilder::new(test_config(3, 5)).component(Aging).build().unwrap();
        assert_eq!(sim.population().len(), 5);
        assert_eq!(
            sim.population().column("age").unwrap().as_f64s().unwrap(),
            [20.0; 5]
        );
        assert_eq!(sim.current_tick(), Tick(0));
    }

    #[test]
    fn post_setup_emitted_once_at_build() {
        let log = Log::default();
        SimBuilder::new(test_config(3, 2))
            .component(Recorder::new("r", &log))
            .build()
            .unwrap();
        assert_eq!(*log.borrow(), ["T0 post_setup r"]);
    }

    #[test]
    fn configuration_defaults_applied_and_frozen() {
        let sim = SimBuilder::new(test_config(1, 0)).component(Aging).build().unwrap();
        let tree = sim.configuration();
        assert!(tree.is_frozen());
        assert_eq!(tree.get_as::<f64>(&["aging", "initial_age"]).unwrap(), 20.0);
    }

    #[test]
    fn reads_run_parameters_from_configuration() {
        let mut tree = ConfigTree::new();
        tree.update_yaml(
            "simulation: {total_steps: 4, population_size: 3, seed: 9}",
            "base",
            "test",
        )
        .unwrap();
        let sim = SimBuilder::from_configuration(tree).unwrap().build().unwrap();
        assert_eq!(sim.config().total_steps, 4);
        assert_eq!(sim.config().seed, 9);
        assert_eq!(sim.config().step_size_secs, 86_400);
        assert_eq!(sim.population().len(), 3);
    }

    #[test]
    fn missing_simulation_section_errors() {
        assert!(matches!(
            SimBuilder::from_configuration(ConfigTree::new()),
            Err(SimError::Core(_))
        ));
    }

    #[test]
    fn duplicate_components_error() {
        let log = Log::default();
        let result = SimBuilder::new(test_config(1, 0))
            .component(Recorder::new("same", &log))
            .component(Recorder::new("same", &log))
            .build();
        assert!(matches!(result, Err(SimError::Component(ComponentError::DuplicateName(_)))));
    }

    #[test]
    fn zero_step_size_errors() {
        let mut config = test_config(1, 0);
        config.step_size_secs = 0;
        assert!(matches!(SimBuilder::new(config).build(), Err(SimError::Config(_))));
    }
}

// ── Step loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn step_emits_phases_in_order() {
        let log = Log::default();
        let mut sim = SimBuilder::new(test_config(5, 1))
            .component(Recorder::new("r", &log))
            .build()
            .unwrap();
        log.borrow_mut().clear();
        sim.step().unwrap();
        assert_eq!(
            *log.borrow(),
            [
                "T0 time_step__prepare r",
                "T0 time_step r",
                "T0 time_step__cleanup r",
                "T0 collect_metrics r"
            ]
        );
        assert_eq!(sim.current_tick(), Tick(1));
    }

    #[test]
    fn run_reaches_end_tick_and_finalizes() {
        let log = Log::default();
        let mut sim = SimBuilder::new(test_config(3, 2))
            .component(Recorder::new("r", &log))
            .component(Aging)
            .build()
            .unwrap();
        let mut counter = Counter::default();
        sim.run(&mut counter).unwrap();

        assert_eq!(sim.current_tick(), Tick(3));
        assert!(sim.is_finalized());
        assert_eq!((counter.starts, counter.ends), (3, 3));
        // post_setup + 3 × 4 step phases + simulation_end
        assert_eq!(counter.sim_end, Some((Tick(3), 14.0)));
        assert_eq!(log.borrow().last().unwrap(), "T3 simulation_end r");
        assert_eq!(
            sim.population().column("age").unwrap().as_f64s().unwrap(),
            [23.0, 23.0]
        );
    }

    #[test]
    fn run_steps_does_not_finalize() {
        let mut sim = SimBuilder::new(test_config(10, 1)).component(Aging).build().unwrap();
        sim.run_steps(4, &mut NoopObserver).unwrap();
        assert_eq!(sim.current_tick(), Tick(4));
        assert!(!sim.is_finalized());
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.current_tick(), Tick(10));
    }

    #[test]
    fn step_after_finalize_is_lifecycle_error() {
        let mut sim = SimBuilder::new(test_config(1, 1)).build().unwrap();
        sim.finalize().unwrap();
        assert!(matches!(sim.step(), Err(SimError::Lifecycle(_))));
        assert!(matches!(sim.finalize(), Err(SimError::Lifecycle(_))));
        assert!(matches!(sim.add_simulants(1), Err(SimError::Lifecycle(_))));
    }

    #[test]
    fn hook_failure_aborts_phase_and_step() {
        let log = Log::default();
        let mut failing = Recorder::new("bad", &log);
        failing.fail_at = Some(Tick(1));
        let mut sim = SimBuilder::new(test_config(5, 1))
            .component(failing)
            .component(Recorder::new("after", &log))
            .build()
            .unwrap();
        sim.step().unwrap();
        log.borrow_mut().clear();

        let err = sim.step().unwrap_err();
        match err {
            SimError::Phase { phase, component, .. } => {
                assert_eq!(phase, "time_step");
                assert_eq!(component, "recorder.bad");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            *log.borrow(),
            ["T1 time_step__prepare bad", "T1 time_step__prepare after", "T1 time_step bad"]
        );
        assert_eq!(sim.current_tick(), Tick(1));
    }

    #[test]
    fn added_simulants_are_initialized() {
        let mut sim = SimBuilder::new(test_config(5, 2)).component(Aging).build().unwrap();
        sim.step().unwrap();
        let added = sim.add_simulants(3).unwrap();
        assert_eq!(added.len(), 3);
        assert_eq!(
            sim.population().column("age").unwrap().as_f64s().unwrap(),
            [21.0, 21.0, 20.0, 20.0, 20.0]
        );
    }
}

// ── State machines end to end ─────────────────────────────────────────────────

#[cfg(test)]
mod determinism_tests {
    use super::*;
    use ms_state::{InitialState, Machine, State, StateMachineComponent, Transition};

    fn run(seed: u64) -> Vec<String> {
        let machine = Machine::new(
            "disease",
            vec![
                State::new("susceptible").with_transition(Transition::new("infected", 0.1)),
                State::new("infected").with_transition(Transition::new("recovered", 0.3)),
                State::new("recovered"),
            ],
        )
        .unwrap();
        let component =
            StateMachineComponent::new(machine, InitialState::Fixed("susceptible".into())).unwrap();
        let mut config = test_config(10, 500);
        config.seed = seed;
        let mut sim = SimBuilder::new(config).component(component).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();
        sim.population().column("disease").unwrap().as_strs().unwrap().to_vec()
    }

    #[test]
    fn same_seed_same_outcome() {
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn different_seed_different_outcome() {
        assert_ne!(run(3), run(4));
    }
}
