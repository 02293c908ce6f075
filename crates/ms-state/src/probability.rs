//! Per-simulant transition probabilities.

use std::fmt;
use std::sync::Arc;

use ms_core::{rate_to_probability, CoreError};
use ms_population::Frame;

use crate::{StateResult, StepContext};

/// A custom probability function: one value per cohort row.
pub type ProbabilityFn = dyn Fn(&Frame, &StepContext<'_>) -> StateResult<Vec<f64>> + Send + Sync;

/// How a transition's probability is computed for a cohort.
#[derive(Clone)]
pub enum Probability {
    /// The same probability for every simulant.
    Constant(f64),
    /// An annual rate, converted over the step size.
    Rate(f64),
    /// Read per simulant from a float column of the cohort.
    Column(String),
    /// Read an annual rate per simulant from a float column of the cohort.
    RateColumn(String),
    /// Evaluate a value pipeline for the cohort.
    Value(String),
    /// Evaluate a value pipeline of annual rates for the cohort.
    RateValue(String),
    Custom(Arc<ProbabilityFn>),
}

impl Probability {
    pub fn custom(
        f: impl Fn(&Frame, &StepContext<'_>) -> StateResult<Vec<f64>> + Send + Sync + 'static,
    ) -> Self {
        Probability::Custom(Arc::new(f))
    }

    /// One probability per row of `cohort`.
    pub fn evaluate(&self, cohort: &Frame, step: &StepContext<'_>) -> StateResult<Vec<f64>> {
        let n = cohort.len();
        let values = match self {
            Probability::Constant(p) => vec![*p; n],
            Probability::Rate(r) => vec![rate_to_probability(*r, step.step_size_years); n],
            Probability::Column(name) => cohort.f64s(name)?.to_vec(),
            Probability::RateColumn(name) => cohort
                .f64s(name)?
                .iter()
                .map(|&r| rate_to_probability(r, step.step_size_years))
                .collect(),
            Probability::Value(name) => step.value(name, cohort.index())?,
            Probability::RateValue(name) => step
                .value(name, cohort.index())?
                .into_iter()
                .map(|r| rate_to_probability(r, step.step_size_years))
                .collect(),
            Probability::Custom(f) => f(cohort, step)?,
        };
        if values.len() != n {
            return Err(CoreError::LengthMismatch {
                what:     "transition probabilities",
                expected: n,
                got:      values.len(),
            }
            .into());
        }
        Ok(values)
    }
}

impl fmt::Debug for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probability::Constant(p) => write!(f, "Constant({p})"),
            Probability::Rate(r) => write!(f, "Rate({r})"),
            Probability::Column(c) => write!(f, "Column({c:?})"),
            Probability::RateColumn(c) => write!(f, "RateColumn({c:?})"),
            Probability::Value(v) => write!(f, "Value({v:?})"),
            Probability::RateValue(v) => write!(f, "RateValue({v:?})"),
            Probability::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<f64> for Probability {
    fn from(p: f64) -> Self {
        Probability::Constant(p)
    }
}
