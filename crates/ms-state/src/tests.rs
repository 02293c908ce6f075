//! Unit tests for ms-state.

#[cfg(test)]
mod helpers {
    use ms_core::{id_range, Randomness, Tick};
    use ms_population::Frame;

    use crate::StepContext;

    pub fn cohort(state: &str, n: usize) -> Frame {
        Frame::new(id_range(0, n).unwrap())
            .with_column("state", vec![state; n])
            .unwrap()
    }

    pub fn step(seed: u64) -> StepContext<'static> {
        StepContext::new(Tick(1), 1.0, Randomness::new(seed))
    }

    pub fn count(frame: &Frame, state: &str) -> usize {
        frame.strs("state").unwrap().iter().filter(|s| *s == state).count()
    }
}

#[cfg(test)]
mod transition_set {
    use super::helpers::{cohort, step};
    use crate::{Probability, StateError, Transition, TransitionSet};

    #[test]
    fn null_transition_takes_the_remainder() {
        let set = TransitionSet::new(true)
            .with(Transition::new("b", 0.3))
            .with(Transition::new("c", 0.2));
        let probs = set.outcome_probabilities("a", &cohort("a", 4), &step(0)).unwrap();
        assert_eq!(probs.outcome_count(), 3);
        assert_eq!(probs.null_outcome(), Some(2));
        for row in 0..4 {
            let p = probs.for_row(row);
            assert!((p[2] - 0.5).abs() < 1e-12);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn without_null_transition_probabilities_are_normalised() {
        let set = TransitionSet::new(false)
            .with(Transition::new("b", 2.0))
            .with(Transition::new("c", 6.0));
        let probs = set.outcome_probabilities("a", &cohort("a", 3), &step(0)).unwrap();
        assert_eq!(probs.null_outcome(), None);
        assert_eq!(probs.for_outcome(0), [0.25; 3]);
        assert_eq!(probs.for_outcome(1), [0.75; 3]);
    }

    #[test]
    fn per_simulant_totals_above_one_fail() {
        let set = TransitionSet::new(true)
            .with(Transition::new("b", 0.7))
            .with(Transition::new("c", 0.5));
        let err = set.outcome_probabilities("a", &cohort("a", 2), &step(0)).unwrap_err();
        match err {
            StateError::ProbabilityConservation { state, total, .. } => {
                assert_eq!(state, "a");
                assert!((total - 1.2).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn conservation_is_checked_per_simulant() {
        // Only the second simulant exceeds one.
        let frame = cohort("a", 2).with_column("p", vec![0.1, 0.9]).unwrap();
        let set = TransitionSet::new(true)
            .with(Transition::new("b", Probability::Column("p".into())))
            .with(Transition::new("c", 0.3));
        let err = set.outcome_probabilities("a", &frame, &step(0)).unwrap_err();
        assert!(matches!(
            err,
            StateError::ProbabilityConservation { simulant, .. } if simulant.0 == 1
        ));
    }

    #[test]
    fn zero_weights_without_null_transition_fail() {
        let set = TransitionSet::new(false).with(Transition::new("b", 0.0));
        let err = set.outcome_probabilities("a", &cohort("a", 1), &step(0)).unwrap_err();
        assert!(matches!(err, StateError::NoOutcome { .. }));
    }

    #[test]
    fn negative_probability_rejected() {
        let set = TransitionSet::new(true).with(Transition::new("b", -0.1));
        let err = set.outcome_probabilities("a", &cohort("a", 1), &step(0)).unwrap_err();
        assert!(matches!(err, StateError::InvalidProbability { ref target, .. } if target == "b"));
    }

    #[test]
    fn rates_convert_over_the_step() {
        let set = TransitionSet::new(true).with(Transition::new("b", Probability::Rate(1.0)));
        let probs = set.outcome_probabilities("a", &cohort("a", 1), &step(0)).unwrap();
        assert!((probs.for_outcome(0)[0] - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn outcome_is_count_of_thresholds_below_draw() {
        let set = TransitionSet::new(true)
            .with(Transition::new("b", 0.3))
            .with(Transition::new("c", 0.2));
        let probs = set.outcome_probabilities("a", &cohort("a", 6), &step(0)).unwrap();
        let chosen = probs.choose(&[0.0, 0.29, 0.31, 0.49, 0.51, 0.999]).unwrap();
        assert_eq!(chosen, [0, 0, 1, 1, 2, 2]);

        let buckets = probs.partition(&[0.0, 0.29, 0.31, 0.49, 0.51, 0.999]).unwrap();
        assert_eq!(buckets, [vec![0, 1], vec![2, 3], vec![4, 5]]);
        assert!(probs.choose(&[0.5]).is_err());
    }
}

#[cfg(test)]
mod machine {
    use std::collections::BTreeSet;

    use super::helpers::{cohort, count, step};
    use crate::{Machine, Probability, State, StateError, StateResult, StepContext, Transition};
    use ms_core::{id_range, SimulantId};
    use ms_population::{Column, Frame};

    fn abc_machine() -> Machine {
        Machine::new(
            "state",
            vec![
                State::new("a")
                    .with_transition(Transition::new("b", 0.3))
                    .with_transition(Transition::new("c", 0.2)),
                State::new("b"),
                State::new("c"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn construction_validates_states() {
        let dup = Machine::new("state", vec![State::new("a"), State::new("a")]);
        assert!(matches!(dup, Err(StateError::DuplicateState(ref s)) if s == "a"));

        let dangling = Machine::new(
            "state",
            vec![State::new("a").with_transition(Transition::always("z"))],
        );
        assert!(matches!(dangling, Err(StateError::UnknownTarget { ref target, .. }) if target == "z"));

        assert!(Machine::new("state", Vec::new()).is_err());
    }

    #[test]
    fn split_between_targets_and_null() {
        let machine = abc_machine();
        let out = machine.transition(cohort("a", 1000), &step(42)).unwrap();
        assert_eq!(out.len(), 1000);

        let (a, b, c) = (count(&out, "a"), count(&out, "b"), count(&out, "c"));
        assert_eq!(a + b + c, 1000);
        assert!((240..=360).contains(&b), "b = {b}");
        assert!((150..=250).contains(&c), "c = {c}");
        assert!((440..=560).contains(&a), "a = {a}");

        let again = machine.transition(cohort("a", 1000), &step(42)).unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn simulants_preserved_regardless_of_input_order() {
        let machine = abc_machine();
        let mut ids = id_range(0, 50).unwrap();
        ids.reverse();
        let states: Vec<&str> = (0..50).map(|i| ["a", "b", "c"][i % 3]).collect();
        let frame = Frame::new(ids.clone()).with_column("state", states).unwrap();

        let out = machine.transition(frame, &step(7)).unwrap();
        let before: BTreeSet<SimulantId> = ids.into_iter().collect();
        let after: BTreeSet<SimulantId> = out.index().iter().copied().collect();
        assert_eq!(out.len(), 50);
        assert_eq!(before, after);
    }

    #[test]
    fn outcome_per_simulant_is_independent_of_cohort_order() {
        let machine = abc_machine();
        let forward = machine.transition(cohort("a", 100), &step(3)).unwrap();
        let mut ids = id_range(0, 100).unwrap();
        ids.reverse();
        let reversed = Frame::new(ids).with_column("state", vec!["a"; 100]).unwrap();
        let backward = machine.transition(reversed, &step(3)).unwrap();

        let state_of = |frame: &Frame| -> Vec<(SimulantId, String)> {
            let mut rows: Vec<_> = frame
                .index()
                .iter()
                .copied()
                .zip(frame.strs("state").unwrap().iter().cloned())
                .collect();
            rows.sort();
            rows
        };
        assert_eq!(state_of(&forward), state_of(&backward));
    }

    #[test]
    fn state_without_transitions_is_unchanged() {
        let machine = abc_machine();
        let input = cohort("b", 10);
        let out = machine.transition(input.clone(), &step(1)).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn empty_cohort_keeps_schema() {
        let machine = abc_machine();
        let empty = cohort("a", 0).with_column("age", Vec::<f64>::new()).unwrap();
        let out = machine.apply_to_cohort("a", empty.clone(), &step(1)).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.schema(), empty.schema());
        assert_eq!(machine.transition(empty, &step(1)).unwrap().len(), 0);
    }

    #[test]
    fn undeclared_state_value_is_an_error() {
        let machine = abc_machine();
        let frame = Frame::new(id_range(0, 2).unwrap())
            .with_column("state", vec!["a", "zombie"])
            .unwrap();
        let err = machine.transition(frame, &step(1)).unwrap_err();
        assert!(matches!(
            err,
            StateError::UnknownState { ref value, simulant, .. } if value == "zombie" && simulant.0 == 1
        ));
    }

    #[test]
    fn side_effect_may_not_drop_simulants() {
        let machine = Machine::new(
            "state",
            vec![
                State::new("a").with_transition(Transition::always("b")),
                State::new("b").with_side_effect(|frame, _| {
                    let first_half: Vec<usize> = (0..frame.len() / 2).collect();
                    *frame = frame.take(&first_half);
                    Ok(())
                }),
            ],
        )
        .unwrap();
        let err = machine.transition(cohort("a", 10), &step(1)).unwrap_err();
        assert!(
            matches!(err, StateError::CohortRowsChanged { ref state, expected: 10, got: 5 } if state == "b"),
            "{err}"
        );
    }

    #[test]
    fn side_effect_may_not_duplicate_simulants() {
        let machine = Machine::new(
            "state",
            vec![
                State::new("a").with_transition(Transition::always("b")),
                State::new("b").with_side_effect(|frame, _| {
                    let rows_twice: Vec<usize> = (0..frame.len()).chain(0..frame.len()).collect();
                    *frame = frame.take(&rows_twice);
                    Ok(())
                }),
            ],
        )
        .unwrap();
        let err = machine.transition(cohort("a", 10), &step(1)).unwrap_err();
        assert!(matches!(err, StateError::CohortRowsChanged { expected: 10, got: 20, .. }), "{err}");
    }

    #[test]
    fn value_probability_needs_a_simulation() {
        let machine = Machine::new(
            "state",
            vec![
                State::new("a").with_transition(Transition::new("b", Probability::Value("p".into()))),
                State::new("b"),
            ],
        )
        .unwrap();
        let err = machine.transition(cohort("a", 3), &step(1)).unwrap_err();
        assert!(matches!(err, StateError::Configuration(_)));
    }

    #[test]
    fn certain_transition_moves_everyone() {
        let machine = Machine::new(
            "state",
            vec![State::new("start").with_transition(Transition::always("done")), State::new("done")],
        )
        .unwrap();
        let out = machine.transition(cohort("start", 25), &step(1)).unwrap();
        assert_eq!(count(&out, "done"), 25);
    }

    #[test]
    fn without_null_transition_everyone_moves() {
        let machine = Machine::new(
            "state",
            vec![
                State::new("start")
                    .with_transition(Transition::always("a"))
                    .with_transition(Transition::always("b"))
                    .without_null_transition(),
                State::new("a"),
                State::new("b"),
            ],
        )
        .unwrap();
        let out = machine.transition(cohort("start", 2000), &step(9)).unwrap();
        let a = count(&out, "a");
        assert_eq!(a + count(&out, "b"), 2000);
        assert!((900..=1100).contains(&a), "a = {a}");
    }

    #[test]
    fn side_effect_runs_on_every_entry() {
        let bump = |frame: &mut Frame, _: &StepContext<'_>| -> StateResult<()> {
            let counts: Vec<i64> = frame.ints("count")?.iter().map(|c| c + 1).collect();
            frame.insert_column("count", Column::from(counts))?;
            Ok(())
        };
        let machine = Machine::new(
            "state",
            vec![
                State::new("start").with_transition(Transition::always("done")),
                State::new("done")
                    .with_transition(Transition::always("done"))
                    .with_side_effect(bump),
            ],
        )
        .unwrap();

        let frame = cohort("start", 5).with_column("count", vec![0i64; 5]).unwrap();
        let once = machine.transition(frame, &step(1)).unwrap();
        assert_eq!(once.ints("count").unwrap(), [1; 5]);
        let twice = machine.transition(once, &step(2)).unwrap();
        assert_eq!(twice.ints("count").unwrap(), [2; 5]);
        assert_eq!(count(&twice, "done"), 5);
    }

    #[test]
    fn custom_probability_sees_the_cohort() {
        // Only simulants older than 50 may move.
        let old_only = Probability::custom(|frame, _| {
            Ok(frame.f64s("age")?.iter().map(|&a| if a > 50.0 { 1.0 } else { 0.0 }).collect())
        });
        let machine = Machine::new(
            "state",
            vec![State::new("a").with_transition(Transition::new("b", old_only)), State::new("b")],
        )
        .unwrap();
        let frame = cohort("a", 4).with_column("age", vec![10.0, 60.0, 30.0, 80.0]).unwrap();
        let out = machine.transition(frame, &step(1)).unwrap();
        for (age, state) in out.f64s("age").unwrap().iter().zip(out.strs("state").unwrap()) {
            assert_eq!(state == "b", *age > 50.0);
        }
    }
}

#[cfg(test)]
mod component {
    use crate::{
        InitialState, Machine, Probability, State, StateError, StateMachineComponent, Transition,
    };
    use ms_component::{
        Component, ComponentError, ComponentManager, ComponentResult, Metrics, SetupContext,
        SetupInputs, SimulantData,
    };
    use ms_core::{ConfigTree, Randomness, SimulantId, Tick};
    use ms_events::{Event, Phase, Priority};
    use ms_lookup::EmptyDataSource;
    use ms_population::PopulationTable;

    fn set_up(manager: &mut ComponentManager) {
        manager
            .setup(&SetupInputs {
                configuration:  &ConfigTree::new(),
                data:           &EmptyDataSource,
                randomness:     Randomness::new(11),
                step_size_secs: 86_400,
            })
            .unwrap();
    }

    fn populate(manager: &mut ComponentManager, table: &mut PopulationTable, n: usize) -> Vec<SimulantId> {
        let index = table.add_simulants(n).unwrap();
        let pop = SimulantData { index: index.clone(), creation_tick: Tick(0), step_size_secs: 86_400 };
        manager
            .initialize_simulants(&pop, table, &mut Metrics::new(), Randomness::new(11))
            .unwrap();
        index
    }

    /// Source of `move_probability`: 1 for even ids, 0 for odd ones.
    struct EvenIds;

    impl Component for EvenIds {
        fn type_name(&self) -> &'static str {
            "EvenIds"
        }
        fn setup(&mut self, ctx: &mut SetupContext<'_>) -> ComponentResult<()> {
            ctx.register_value_source("move_probability", |index, _| {
                Ok(index.iter().map(|id| if id.0 % 2 == 0 { 1.0 } else { 0.0 }).collect())
            })
        }
    }

    /// Zeroes `move_probability` for the first ten ids.
    struct HoldFirstTen;

    impl Component for HoldFirstTen {
        fn type_name(&self) -> &'static str {
            "HoldFirstTen"
        }
        fn setup(&mut self, ctx: &mut SetupContext<'_>) -> ComponentResult<()> {
            ctx.register_value_mutator("move_probability", |index, values, _| {
                Ok(index.iter().zip(values).map(|(id, p)| if id.0 < 10 { 0.0 } else { p }).collect())
            });
            Ok(())
        }
    }

    fn sir() -> Machine {
        Machine::new(
            "disease",
            vec![
                State::new("susceptible").with_transition(Transition::new("infected", 0.5)),
                State::new("infected").with_transition(Transition::always("recovered")),
                State::new("recovered"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn identity_and_declarations() {
        let component = StateMachineComponent::new(sir(), InitialState::Fixed("susceptible".into()))
            .unwrap()
            .priority(Priority::new(2).unwrap())
            .with_column("infections", 0i64);
        let mut manager = ComponentManager::new();
        manager.add(Box::new(component)).unwrap();
        assert_eq!(manager.names(), ["state_machine.disease"]);
    }

    #[test]
    fn unknown_initial_state_rejected() {
        assert!(StateMachineComponent::new(sir(), InitialState::Fixed("dead".into())).is_err());
        let weighted = InitialState::Weighted(vec![("susceptible".into(), 1.0), ("x".into(), 1.0)]);
        assert!(StateMachineComponent::new(sir(), weighted).is_err());
    }

    #[test]
    fn initializes_and_steps_the_population() {
        let component = StateMachineComponent::new(
            sir(),
            InitialState::Weighted(vec![("susceptible".into(), 0.9), ("infected".into(), 0.1)]),
        )
        .unwrap()
        .priority(Priority::new(2).unwrap());

        let mut manager = ComponentManager::new();
        manager.add(Box::new(component)).unwrap();
        let config = ConfigTree::new();
        manager
            .setup(&SetupInputs {
                configuration:  &config,
                data:           &EmptyDataSource,
                randomness:     Randomness::new(11),
                step_size_secs: 86_400,
            })
            .unwrap();
        assert_eq!(
            manager.listeners(Phase::TimeStep),
            [(Priority::new(2).unwrap(), "state_machine.disease")]
        );

        let mut table = PopulationTable::new();
        let mut metrics = Metrics::new();
        let index = table.add_simulants(1000).unwrap();
        let pop = SimulantData { index: index.clone(), creation_tick: Tick(0), step_size_secs: 86_400 };
        manager
            .initialize_simulants(&pop, &mut table, &mut metrics, Randomness::new(11))
            .unwrap();

        let states = table.column("disease").unwrap().as_strs().unwrap().to_vec();
        let infected = states.iter().filter(|s| *s == "infected").count();
        assert!((50..=150).contains(&infected), "infected = {infected}");

        let event = Event::new(index, Tick(0), 86_400);
        manager
            .emit(Phase::TimeStep, &event, &mut table, &mut metrics, Randomness::new(11))
            .unwrap();

        let after = table.column("disease").unwrap().as_strs().unwrap();
        let recovered = after.iter().filter(|s| *s == "recovered").count();
        assert_eq!(recovered, infected);
        assert_eq!(metrics.get("disease.infected_to_recovered"), Some(infected as f64));
        let newly = metrics.get("disease.susceptible_to_infected").unwrap_or(0.0);
        assert_eq!(
            after.iter().filter(|s| *s == "infected").count() as f64,
            newly
        );
    }

    #[test]
    fn ignores_other_phases() {
        let component =
            StateMachineComponent::new(sir(), InitialState::Fixed("susceptible".into())).unwrap();
        assert!(component.phases().contains(Phase::TimeStep));
        assert!(!component.phases().contains(Phase::CollectMetrics));
        assert_eq!(component.columns_created(), ["disease"]);
    }

    #[test]
    fn conservation_failure_leaves_the_table_untouched() {
        let machine = Machine::new(
            "state",
            vec![
                State::new("a")
                    .with_transition(Transition::new("b", 0.6))
                    .with_transition(Transition::new("c", 0.6)),
                State::new("b"),
                State::new("c"),
            ],
        )
        .unwrap();
        let component = StateMachineComponent::new(machine, InitialState::Fixed("a".into())).unwrap();
        let mut manager = ComponentManager::new();
        manager.add(Box::new(component)).unwrap();
        set_up(&mut manager);

        let mut table = PopulationTable::new();
        let index = populate(&mut manager, &mut table, 20);
        let before = table.column("state").unwrap().clone();

        let event = Event::new(index, Tick(0), 86_400);
        let failure = manager
            .emit(Phase::TimeStep, &event, &mut table, &mut Metrics::new(), Randomness::new(11))
            .unwrap_err();
        assert_eq!(failure.phase, "time_step");
        let ComponentError::Model(source) = &failure.source else {
            panic!("unexpected failure: {failure}");
        };
        assert!(matches!(
            source.downcast_ref::<StateError>(),
            Some(StateError::ProbabilityConservation { .. })
        ));
        assert_eq!(table.column("state").unwrap(), &before);
        assert!(table.column("state").unwrap().as_strs().unwrap().iter().all(|s| s == "a"));
    }

    #[test]
    fn transitions_read_value_pipelines() {
        let machine = Machine::new(
            "state",
            vec![
                State::new("a")
                    .with_transition(Transition::new("b", Probability::Value("move_probability".into()))),
                State::new("b"),
            ],
        )
        .unwrap();
        let component = StateMachineComponent::new(machine, InitialState::Fixed("a".into())).unwrap();
        let mut manager = ComponentManager::new();
        manager.add(Box::new(HoldFirstTen)).unwrap();
        manager.add(Box::new(EvenIds)).unwrap();
        manager.add(Box::new(component)).unwrap();
        set_up(&mut manager);

        let mut table = PopulationTable::new();
        let index = populate(&mut manager, &mut table, 30);
        let event = Event::new(index.clone(), Tick(0), 86_400);
        manager
            .emit(Phase::TimeStep, &event, &mut table, &mut Metrics::new(), Randomness::new(11))
            .unwrap();

        let states = table.column("state").unwrap().as_strs().unwrap();
        for (id, state) in index.iter().zip(states) {
            let moved = id.0 % 2 == 0 && id.0 >= 10;
            assert_eq!(state == "b", moved, "{id}");
        }
    }
}
