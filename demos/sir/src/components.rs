//! Model components for the SIR demo.

use ms_component::{
    Component, ComponentError, ComponentResult, HookContext, InitializerSpec, PhaseSet, SetupContext,
    SimulantData,
};
use ms_events::{Event, Phase};
use ms_population::{Frame, RequiredColumns};

// ── Demographics ──────────────────────────────────────────────────────────────

/// Creates `age` and `sex` and ages everyone at the end of each step.
pub struct Demographics {
    max_age: f64,
}

impl Demographics {
    pub fn new() -> Self {
        Self { max_age: 90.0 }
    }
}

impl Component for Demographics {
    fn type_name(&self) -> &'static str {
        "Demographics"
    }

    fn configuration_defaults(&self) -> Option<String> {
        Some("demographics:\n  max_initial_age: 90.0\n".into())
    }

    fn columns_created(&self) -> Vec<String> {
        vec!["age".into(), "sex".into()]
    }

    fn initializer(&self) -> Option<InitializerSpec> {
        Some(InitializerSpec::new())
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::new().with(Phase::TimeStepCleanup)
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> ComponentResult<()> {
        self.max_age = ctx.config_as(&["max_initial_age"])?;
        Ok(())
    }

    fn on_initialize_simulants(&mut self, pop: &SimulantData, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
        let ages: Vec<f64> = ctx
            .stream("demographics.age")
            .get_draw(&pop.index, pop.creation_tick)
            .into_iter()
            .map(|d| d * self.max_age)
            .collect();
        let sexes = ctx.stream("demographics.sex").choice(
            &pop.index,
            pop.creation_tick,
            &["Male".to_string(), "Female".to_string()],
            &[0.5, 0.5],
        )?;
        let frame = Frame::new(pop.index.clone())
            .with_column("age", ages)?
            .with_column("sex", sexes)?;
        ctx.update(&frame)
    }

    fn on_event(&mut self, _phase: Phase, event: &Event, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
        let pop = ctx.get_columns(&event.index, &["age"])?;
        let years = event.step_size_years();
        let aged: Vec<f64> = pop.f64s("age")?.iter().map(|a| a + years).collect();
        ctx.update(&Frame::new(event.index.clone()).with_column("age", aged)?)
    }
}

// ── Force of infection ────────────────────────────────────────────────────────

/// Pipeline of each simulant's annual infection rate.
pub const INCIDENCE_RATE: &str = "infection.incidence_rate";

/// Source of [`INCIDENCE_RATE`]:
///
/// ```text
/// rate = contact_rate(sex, age) × transmission_probability × prevalence
/// ```
///
/// Also counts infected person-steps after every step.
pub struct ForceOfInfection {
    transmission_probability: f64,
}

impl ForceOfInfection {
    pub fn new() -> Self {
        Self { transmission_probability: 0.0 }
    }
}

impl Component for ForceOfInfection {
    fn type_name(&self) -> &'static str {
        "ForceOfInfection"
    }

    fn columns_required(&self) -> RequiredColumns {
        RequiredColumns::columns(["disease", "age", "sex"])
    }

    fn lookup_tables(&self) -> Vec<String> {
        vec!["contact_rate".into()]
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::new().with(Phase::CollectMetrics)
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> ComponentResult<()> {
        self.transmission_probability = ctx.config_as(&["transmission_probability"])?;
        let transmission = self.transmission_probability;
        ctx.register_value_source(INCIDENCE_RATE, move |index, values| {
            let everyone = values.simulants();
            if everyone.is_empty() {
                return Ok(vec![0.0; index.len()]);
            }
            let pop = values.get_columns(&everyone, &["disease"])?;
            let prevalence = infected(&pop)? as f64 / everyone.len() as f64;
            Ok(values
                .lookup("contact_rate", index)?
                .into_iter()
                .map(|contacts| contacts * transmission * prevalence)
                .collect())
        })
    }

    fn on_event(&mut self, _phase: Phase, event: &Event, ctx: &mut HookContext<'_>) -> ComponentResult<()> {
        let pop = ctx.get_columns(&event.index, &["disease"])?;
        let count = infected(&pop)?;
        ctx.metrics().add("infected_person_steps", count as f64);
        Ok(())
    }
}

fn infected(pop: &Frame) -> ComponentResult<usize> {
    Ok(pop.strs("disease")?.iter().filter(|s| *s == "infected").count())
}

// ── Social distancing ─────────────────────────────────────────────────────────

/// Scales [`INCIDENCE_RATE`] down by the configured `effect`.
pub struct SocialDistancing;

impl Component for SocialDistancing {
    fn type_name(&self) -> &'static str {
        "SocialDistancing"
    }

    fn configuration_defaults(&self) -> Option<String> {
        Some("social_distancing:\n  effect: 0.0\n".into())
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> ComponentResult<()> {
        let effect: f64 = ctx.config_as(&["effect"])?;
        if !(0.0..=1.0).contains(&effect) {
            return Err(ComponentError::Configuration(format!(
                "social_distancing.effect must be in [0, 1], got {effect}"
            )));
        }
        ctx.register_value_mutator(INCIDENCE_RATE, move |_, rates, _| {
            Ok(rates.into_iter().map(|r| r * (1.0 - effect)).collect())
        });
        Ok(())
    }
}
