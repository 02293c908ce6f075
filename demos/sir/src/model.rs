//! Disease model and embedded inputs for the SIR demo.

use std::io::Cursor;

use anyhow::Result;
use ms_core::ConfigTree;
use ms_lookup::{DataTable, InMemoryDataSource};
use ms_population::Value;
use ms_state::{InitialState, Machine, Probability, State, StateMachineComponent, Transition};

use crate::components::INCIDENCE_RATE;

pub const DISEASE_STATES: [&str; 3] = ["susceptible", "infected", "recovered"];

// ── Configuration ─────────────────────────────────────────────────────────────

pub const CONFIG_YAML: &str = "\
simulation:
  start_unix_secs: 1700000000
  step_size_secs: 86400
  total_steps: 180
  seed: 42
  population_size: 5000
interpolation:
  order: 1
disease:
  initial_prevalence: 0.01
  recovery_rate: 36.5
social_distancing:
  effect: 0.2
force_of_infection:
  transmission_probability: 0.03
  contact_rate:
    value: data
    key_name: contact.rate
    categorical_columns: [sex]
    continuous_columns: [age]
";

// Annual contacts by sex and age, interpolated linearly over age.
const CONTACT_RATE_CSV: &str = "\
sex,age,value\n\
Male,0,2900\n\
Male,20,4400\n\
Male,60,2200\n\
Male,90,900\n\
Female,0,3000\n\
Female,20,4000\n\
Female,60,2600\n\
Female,90,1100\n\
";

pub fn configuration() -> Result<ConfigTree> {
    let mut tree = ConfigTree::new();
    tree.update_yaml(CONFIG_YAML, "base", "sir demo")?;
    Ok(tree)
}

pub fn data_source() -> Result<InMemoryDataSource> {
    let contact_rate = DataTable::from_csv_reader(Cursor::new(CONTACT_RATE_CSV))?;
    Ok(InMemoryDataSource::new().with("contact.rate", contact_rate))
}

// ── Disease state machine ─────────────────────────────────────────────────────

/// Susceptible → infected at each simulant's incidence rate, infected →
/// recovered at the configured recovery rate.  `infected_at` records the
/// tick of the most recent infection.
pub fn disease(configuration: &ConfigTree) -> Result<StateMachineComponent> {
    let prevalence: f64 = configuration.get_as(&["disease", "initial_prevalence"])?;
    let recovery_rate: f64 = configuration.get_as(&["disease", "recovery_rate"])?;

    let machine = Machine::new(
        "disease",
        vec![
            State::new("susceptible")
                .with_transition(Transition::new("infected", Probability::RateValue(INCIDENCE_RATE.into()))),
            State::new("infected")
                .with_transition(Transition::new("recovered", Probability::Rate(recovery_rate)))
                .with_side_effect(|cohort, step| {
                    cohort.set_all("infected_at", &Value::Int(step.tick.0 as i64))?;
                    Ok(())
                }),
            State::new("recovered"),
        ],
    )?;

    let initial = InitialState::Weighted(vec![
        ("susceptible".into(), 1.0 - prevalence),
        ("infected".into(), prevalence),
    ]);
    Ok(StateMachineComponent::new(machine, initial)?.with_column("infected_at", -1i64))
}
