//! Unit tests for ms-events.

#[cfg(test)]
mod phase {
    use crate::{EventError, Phase, Priority};

    #[test]
    fn step_sequence_order() {
        assert_eq!(
            Phase::STEP_SEQUENCE,
            [
                Phase::TimeStepPrepare,
                Phase::TimeStep,
                Phase::TimeStepCleanup,
                Phase::CollectMetrics
            ]
        );
        assert!(!Phase::STEP_SEQUENCE.contains(&Phase::PostSetup));
    }

    #[test]
    fn indices_match_all() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn names() {
        assert_eq!(Phase::TimeStepPrepare.to_string(), "time_step__prepare");
        assert_eq!(Phase::SimulationEnd.as_str(), "simulation_end");
    }

    #[test]
    fn priority_bounds() {
        assert_eq!(Priority::default().value(), 5);
        assert_eq!(Priority::new(0).unwrap(), Priority::FIRST);
        assert_eq!(Priority::try_from(9u8).unwrap(), Priority::LAST);
        assert!(matches!(Priority::new(10), Err(EventError::InvalidPriority(10))));
    }
}

#[cfg(test)]
mod event {
    use crate::Event;
    use ms_core::{id_range, SimulantId, Tick};

    #[test]
    fn split_keeps_time() {
        let event = Event::new(id_range(0, 5).unwrap(), Tick(3), 86_400);
        let sub = event.split(vec![SimulantId(2)]);
        assert_eq!(sub.tick, Tick(3));
        assert_eq!(sub.step_size_secs, 86_400);
        assert_eq!(sub.index, [SimulantId(2)]);
    }

    #[test]
    fn step_size_years() {
        let event = Event::new(vec![], Tick(0), 31_557_600);
        assert!((event.step_size_years() - 1.0).abs() < 1e-12);
    }
}

#[cfg(test)]
mod manager {
    use crate::{Event, EventManager, Phase, Priority};
    use ms_core::Tick;

    fn p(v: u8) -> Priority {
        Priority::new(v).unwrap()
    }

    fn event() -> Event {
        Event::new(vec![], Tick(0), 1)
    }

    #[test]
    fn ascending_priority_then_registration_order() {
        let mut events = EventManager::new();
        events.register_listener(Phase::TimeStep, 'a', p(5));
        events.register_listener(Phase::TimeStep, 'b', p(0));
        events.register_listener(Phase::TimeStep, 'c', p(5));
        events.register_listener(Phase::TimeStep, 'd', p(9));
        events.register_listener(Phase::TimeStep, 'e', p(0));
        assert_eq!(events.listeners(Phase::TimeStep), ['b', 'e', 'a', 'c', 'd']);
    }

    #[test]
    fn phases_are_independent() {
        let mut events = EventManager::new();
        events.register_listener(Phase::TimeStep, 1u32, Priority::DEFAULT);
        assert_eq!(events.listener_count(Phase::TimeStep), 1);
        for phase in Phase::ALL.into_iter().filter(|&ph| ph != Phase::TimeStep) {
            assert_eq!(events.listener_count(phase), 0);
        }
    }

    #[test]
    fn emit_runs_in_order() {
        let mut events = EventManager::new();
        events.register_listener(Phase::CollectMetrics, 2u32, p(7));
        events.register_listener(Phase::CollectMetrics, 1u32, p(1));
        let mut seen = Vec::new();
        events
            .emit::<()>(Phase::CollectMetrics, &event(), |l, _| {
                seen.push(l);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, [1, 2]);
    }

    #[test]
    fn first_error_stops_phase() {
        let mut events = EventManager::new();
        for l in 0..4u32 {
            events.register_listener(Phase::TimeStep, l, Priority::DEFAULT);
        }
        let mut seen = Vec::new();
        let result = events.emit(Phase::TimeStep, &event(), |l, _| {
            seen.push(l);
            if l == 1 { Err("boom") } else { Ok(()) }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(seen, [0, 1]);
    }

    #[test]
    fn priorities_reported() {
        let mut events = EventManager::new();
        events.register_listener(Phase::TimeStep, 'x', p(3));
        assert_eq!(events.listeners_with_priority(Phase::TimeStep), [(p(3), 'x')]);
    }
}
