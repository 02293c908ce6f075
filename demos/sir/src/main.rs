//! sir: an SIR epidemic on the microsim kernel.
//!
//! Simulates 5 000 simulants for 180 daily steps.  Each step:
//!
//! 1. The disease state machine (step) moves susceptible → infected →
//!    recovered.  Infection uses the `infection.incidence_rate` pipeline:
//!    `ForceOfInfection` supplies it from an age/sex contact-rate lookup
//!    table and current prevalence, and `SocialDistancing` scales it down.
//! 2. `Demographics` (cleanup) ages everyone.
//! 3. `ForceOfInfection` (collect_metrics) counts infected person-steps.
//!
//! Output goes to `step_summaries.csv` and `metrics.csv` in the directory
//! given as the first argument (default `sir_output`).  Set `RUST_LOG=debug`
//! for per-phase logs.

mod components;
mod model;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ms_output::{CsvWriter, SimOutputObserver};
use ms_sim::SimBuilder;

use components::{Demographics, ForceOfInfection, SocialDistancing};
use model::DISEASE_STATES;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sir_output"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    // 1. Configuration and data.
    let configuration = model::configuration()?;
    let disease = model::disease(&configuration)?;

    // 2. Build: setup, initial population, post_setup.
    let t0 = Instant::now();
    let mut sim = SimBuilder::from_configuration(configuration)?
        .data_source(Box::new(model::data_source()?))
        .component(Demographics::new())
        .component(ForceOfInfection::new())
        .component(SocialDistancing)
        .component(disease)
        .build()?;
    info!(
        simulants = sim.population().len(),
        components = ?sim.components().names(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "model built"
    );

    // 3. Run with CSV output.
    let writer = CsvWriter::new(&out_dir)?;
    let mut observer = SimOutputObserver::new(writer, sim.config()).track("disease", DISEASE_STATES);
    let t1 = Instant::now();
    sim.run(&mut observer)?;
    if let Some(e) = observer.take_error() {
        return Err(e).context("writing output");
    }

    // 4. Report.
    let states = sim.population().column("disease")?;
    for state in DISEASE_STATES {
        let count = (0..states.len())
            .filter_map(|row| states.value(row))
            .filter(|v| v.as_str() == Some(state))
            .count();
        println!("{state:>12}: {count}");
    }
    for (name, value) in sim.metrics().iter() {
        println!("{name:>40}: {value}");
    }
    println!(
        "Ran {} steps in {:.2?}; output in {}",
        sim.current_tick().0,
        t1.elapsed(),
        out_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use ms_sim::{NoopObserver, SimBuilder};

    use crate::components::{Demographics, ForceOfInfection, SocialDistancing, INCIDENCE_RATE};
    use crate::model;

    fn build(configuration: ms_core::ConfigTree, distancing: bool) -> ms_sim::Simulation {
        let disease = model::disease(&configuration).unwrap();
        let mut builder = SimBuilder::from_configuration(configuration)
            .unwrap()
            .data_source(Box::new(model::data_source().unwrap()))
            .component(Demographics::new())
            .component(ForceOfInfection::new());
        if distancing {
            builder = builder.component(SocialDistancing);
        }
        builder.component(disease).build().unwrap()
    }

    #[test]
    fn short_run_spreads_and_recovers() {
        let mut sim = build(model::configuration().unwrap(), true);
        sim.run_steps(30, &mut NoopObserver).unwrap();

        let states = sim.population().column("disease").unwrap().as_strs().unwrap();
        assert_eq!(states.len(), 5000);
        assert!(states.iter().any(|s| s == "recovered"));
        let infected_at = sim.population().column("infected_at").unwrap().as_ints().unwrap();
        assert!(infected_at.iter().any(|&t| t > 0));
    }

    #[test]
    fn distancing_scales_the_incidence_rate() {
        let plain = build(model::configuration().unwrap(), false);
        let distanced = build(model::configuration().unwrap(), true);
        let index = plain.population().ids();
        let base = plain.value(INCIDENCE_RATE, &index).unwrap();
        let scaled = distanced.value(INCIDENCE_RATE, &index).unwrap();
        assert!(base.iter().any(|&r| r > 0.0));
        for (b, s) in base.iter().zip(&scaled) {
            assert!((s - b * 0.8).abs() < 1e-9, "{s} vs {b}");
        }
    }
}
