//! Unit tests for ms-core primitives.

#[cfg(test)]
mod ids {
    use crate::{id_range, CoreError, SimulantId};

    #[test]
    fn index_roundtrip() {
        let id = SimulantId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(SimulantId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinel_is_max() {
        assert_eq!(SimulantId::INVALID.0, u32::MAX);
        assert_eq!(SimulantId::default(), SimulantId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(SimulantId(7).to_string(), "SimulantId(7)");
    }

    #[test]
    fn range_is_contiguous() {
        let ids = id_range(10, 3).unwrap();
        assert_eq!(ids, vec![SimulantId(10), SimulantId(11), SimulantId(12)]);
        assert!(id_range(0, 0).unwrap().is_empty());
    }

    #[test]
    fn range_stops_short_of_the_sentinel() {
        let top = id_range(u32::MAX - 2, 2).unwrap();
        assert_eq!(top, vec![SimulantId(u32::MAX - 2), SimulantId(u32::MAX - 1)]);
        assert!(matches!(
            id_range(u32::MAX - 2, 3),
            Err(CoreError::IdOverflow { count: 3, .. })
        ));
        assert!(id_range(0, u32::MAX as usize + 1).is_err());
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        assert_eq!(Tick(3) + 2, Tick(5));
        assert_eq!(Tick(3).offset(4), Tick(7));
        assert_eq!(Tick(3).since(Tick(5)), 0);
        assert_eq!(Tick(5).since(Tick(3)), 2);
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimClock::new(1_000, 3_600);
        assert_eq!(clock.current_tick, Tick::ZERO);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick, Tick(2));
        assert_eq!(clock.elapsed_secs(), 7_200);
        assert_eq!(clock.unix_secs_at(Tick(1)), 4_600);
    }

    #[test]
    fn step_size_in_years() {
        let clock = SimClock::new(0, 86_400);
        assert!((clock.step_size_years() * 365.25 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn config_defaults() {
        let cfg: SimConfig = serde_yml::from_str("total_steps: 10").unwrap();
        assert_eq!(cfg.step_size_secs, 86_400);
        assert_eq!(cfg.seed, 0);
        assert_eq!(cfg.end_tick(), Tick(10));
        assert_eq!(cfg.make_clock().step_size_secs, 86_400);
    }
}

#[cfg(test)]
mod rng {
    use crate::{id_range, rate_to_probability, CoreError, Randomness, SimulantId, Tick};

    #[test]
    fn same_inputs_same_draw() {
        let a = Randomness::new(7).stream("disease.infection");
        let b = Randomness::new(7).stream("disease.infection");
        assert_eq!(a.draw(SimulantId(3), Tick(9)), b.draw(SimulantId(3), Tick(9)));
    }

    #[test]
    fn draws_depend_on_every_input() {
        let r = Randomness::new(7);
        let base = r.stream("a").draw(SimulantId(1), Tick(1));
        assert_ne!(base, r.stream("b").draw(SimulantId(1), Tick(1)));
        assert_ne!(base, r.stream("a").draw(SimulantId(2), Tick(1)));
        assert_ne!(base, r.stream("a").draw(SimulantId(1), Tick(2)));
        assert_ne!(base, Randomness::new(8).stream("a").draw(SimulantId(1), Tick(1)));
        assert_ne!(base, r.stream("a").draw_keyed(SimulantId(1), Tick(1), 1));
    }

    #[test]
    fn draws_are_unit_interval() {
        let stream = Randomness::new(1).stream("u");
        for d in stream.get_draw(&id_range(0, 1_000).unwrap(), Tick(0)) {
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn draw_is_independent_of_population() {
        let stream = Randomness::new(1).stream("u");
        let small = stream.get_draw(&id_range(0, 5).unwrap(), Tick(4));
        let large = stream.get_draw(&id_range(0, 50).unwrap(), Tick(4));
        assert_eq!(small[..], large[..5]);
    }

    #[test]
    fn filter_for_probability_extremes() {
        let stream = Randomness::new(3).stream("f");
        let index = id_range(0, 100).unwrap();
        let all = stream.filter_for_probability(&index, Tick(0), &[1.0; 100]).unwrap();
        let none = stream.filter_for_probability(&index, Tick(0), &[0.0; 100]).unwrap();
        assert_eq!(all, index);
        assert!(none.is_empty());
    }

    #[test]
    fn filter_length_mismatch() {
        let stream = Randomness::new(3).stream("f");
        let err = stream
            .filter_for_probability(&id_range(0, 3).unwrap(), Tick(0), &[0.5])
            .unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { expected: 3, got: 1, .. }));
    }

    #[test]
    fn rate_conversion() {
        assert_eq!(rate_to_probability(0.0, 1.0), 0.0);
        let p = rate_to_probability(1.0, 1.0);
        assert!((p - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn choice_respects_zero_weights() {
        let stream = Randomness::new(11).stream("c");
        let picks = stream
            .choice(&id_range(0, 200).unwrap(), Tick(0), &["a", "b", "c"], &[0.0, 2.0, 0.0])
            .unwrap();
        assert!(picks.iter().all(|p| *p == "b"));
    }

    #[test]
    fn choice_roughly_follows_weights() {
        let stream = Randomness::new(11).stream("c");
        let picks = stream
            .choice(&id_range(0, 10_000).unwrap(), Tick(0), &[0u8, 1u8], &[1.0, 3.0])
            .unwrap();
        let ones = picks.iter().filter(|&&p| p == 1).count() as f64 / 10_000.0;
        assert!((ones - 0.75).abs() < 0.03, "got {ones}");
    }

    #[test]
    fn choice_rejects_bad_weights() {
        let stream = Randomness::new(11).stream("c");
        assert!(stream.choice(&id_range(0, 1).unwrap(), Tick(0), &[1, 2], &[0.0, 0.0]).is_err());
        assert!(stream.choice(&id_range(0, 1).unwrap(), Tick(0), &[1, 2], &[1.0]).is_err());
    }
}

#[cfg(test)]
mod config {
    use crate::{ConfigTree, CoreError};
    use serde::Deserialize;

    const BASE: &str = "
simulation:
  total_steps: 10
  seed: 1
disease:
  incidence: 0.2
";

    #[test]
    fn later_layer_wins() {
        let mut tree = ConfigTree::new();
        tree.update_yaml(BASE, "base", "base.yaml").unwrap();
        tree.update_yaml("disease: {incidence: 0.5}", "override", "cli").unwrap();
        tree.update_yaml("disease: {incidence: 0.3}", "component_configs", "disease").unwrap();

        let v: f64 = tree.get_as(&["disease", "incidence"]).unwrap();
        assert_eq!(v, 0.5);

        let history = tree.source(&["disease", "incidence"]).unwrap();
        let layers: Vec<_> = history.iter().map(|h| h.layer.as_str()).collect();
        assert_eq!(layers, ["base", "component_configs", "override"]);
    }

    #[test]
    fn same_layer_overwrites() {
        let mut tree = ConfigTree::new();
        tree.update_yaml("a: {b: 1}", "base", "first").unwrap();
        tree.update_yaml("a: {b: 2}", "base", "second").unwrap();
        assert_eq!(tree.get_as::<i64>(&["a", "b"]).unwrap(), 2);
        let history = tree.source(&["a", "b"]).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source, "second");
    }

    #[test]
    fn branch_materialises_to_struct() {
        #[derive(Deserialize)]
        struct Sim {
            total_steps: u64,
            seed:        u64,
        }

        let mut tree = ConfigTree::new();
        tree.update_yaml(BASE, "base", "base.yaml").unwrap();
        tree.update_yaml("simulation: {seed: 9}", "override", "cli").unwrap();
        let sim: Sim = tree.get_as(&["simulation"]).unwrap();
        assert_eq!(sim.total_steps, 10);
        assert_eq!(sim.seed, 9);
    }

    #[test]
    fn missing_key_and_defaults() {
        let tree = ConfigTree::new();
        assert!(!tree.contains(&["nope"]));
        assert!(matches!(tree.get_as::<f64>(&["nope"]), Err(CoreError::MissingKey(_))));
        assert_eq!(tree.get_or(&["nope"], 4u32).unwrap(), 4);
    }

    #[test]
    fn unknown_layer_rejected() {
        let mut tree = ConfigTree::new();
        let err = tree.update_yaml("a: 1", "bogus", "test").unwrap_err();
        assert!(matches!(err, CoreError::UnknownLayer(_)));
    }

    #[test]
    fn shape_conflicts_rejected() {
        let mut tree = ConfigTree::new();
        tree.update_yaml("a: 1", "base", "test").unwrap();
        assert!(tree.update_yaml("a: {b: 1}", "override", "test").is_err());
    }

    #[test]
    fn frozen_tree_rejects_writes() {
        let mut tree = ConfigTree::new();
        tree.update_yaml("a: 1", "base", "test").unwrap();
        tree.freeze();
        let err = tree.update_yaml("a: 2", "override", "late").unwrap_err();
        assert!(matches!(err, CoreError::Frozen(_)));
        assert_eq!(tree.get_as::<i64>(&["a"]).unwrap(), 1);
    }

    #[test]
    fn update_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");
        std::fs::write(&path, BASE).unwrap();
        let mut tree = ConfigTree::new();
        tree.update_file(&path, "base").unwrap();
        assert_eq!(tree.get_as::<f64>(&["disease", "incidence"]).unwrap(), 0.2);
    }
}
