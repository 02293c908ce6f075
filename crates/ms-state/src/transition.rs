//! Transitions, transition sets and per-simulant outcome sampling.

use ms_core::CoreError;
use ms_population::Frame;

use crate::{Probability, StateError, StateResult, StepContext};

/// Slack allowed when checking that outgoing probabilities sum to at most one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

// ── Transition ────────────────────────────────────────────────────────────────

/// An edge to `target`, taken with a per-simulant probability.
#[derive(Clone, Debug)]
pub struct Transition {
    target:      String,
    probability: Probability,
}

impl Transition {
    pub fn new(target: impl Into<String>, probability: impl Into<Probability>) -> Self {
        Self { target: target.into(), probability: probability.into() }
    }

    /// A transition taken with probability one (or, without a null
    /// transition, with equal weight to its siblings).
    pub fn always(target: impl Into<String>) -> Self {
        Self::new(target, Probability::Constant(1.0))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn probability(&self) -> &Probability {
        &self.probability
    }
}

// ── TransitionSet ─────────────────────────────────────────────────────────────

/// The ordered outgoing transitions of one state.
///
/// With `allow_null_transition`, probabilities are absolute and whatever is
/// left over (`1 - sum`) is the chance of staying put.  Without it, the
/// probabilities are relative weights, normalised per simulant.
#[derive(Clone, Debug)]
pub struct TransitionSet {
    transitions:           Vec<Transition>,
    allow_null_transition: bool,
}

impl TransitionSet {
    pub fn new(allow_null_transition: bool) -> Self {
        Self { transitions: Vec::new(), allow_null_transition }
    }

    pub fn with(mut self, transition: Transition) -> Self {
        self.push(transition);
        self
    }

    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn allow_null_transition(&self) -> bool {
        self.allow_null_transition
    }

    pub fn set_allow_null_transition(&mut self, allow: bool) {
        self.allow_null_transition = allow;
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Evaluate every transition over `cohort` and turn the results into a
    /// proper distribution per simulant.
    ///
    /// Fails without side effects if any probability is negative or not
    /// finite, if the null transition is allowed and a simulant's total
    /// exceeds one, or if it is not allowed and a simulant's total is zero.
    pub fn outcome_probabilities(
        &self,
        state:  &str,
        cohort: &Frame,
        step:   &StepContext<'_>,
    ) -> StateResult<OutcomeProbabilities> {
        let n = cohort.len();
        let index = cohort.index();

        let mut outcomes = Vec::with_capacity(self.transitions.len() + 1);
        for transition in &self.transitions {
            let values = transition.probability.evaluate(cohort, step)?;
            if let Some(row) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(StateError::InvalidProbability {
                    state:    state.to_string(),
                    target:   transition.target.clone(),
                    simulant: index[row],
                    value:    values[row],
                });
            }
            outcomes.push(values);
        }

        let totals: Vec<f64> = (0..n)
            .map(|row| outcomes.iter().map(|o| o[row]).sum())
            .collect();

        if self.allow_null_transition {
            if let Some(row) = totals.iter().position(|t| *t > 1.0 + PROBABILITY_TOLERANCE) {
                return Err(StateError::ProbabilityConservation {
                    state:    state.to_string(),
                    simulant: index[row],
                    total:    totals[row],
                });
            }
            outcomes.push(totals.iter().map(|t| (1.0 - t).max(0.0)).collect());
        } else {
            if let Some(row) = totals.iter().position(|t| *t <= 0.0) {
                return Err(StateError::NoOutcome { state: state.to_string(), simulant: index[row] });
            }
            for values in &mut outcomes {
                for (v, t) in values.iter_mut().zip(&totals) {
                    *v /= t;
                }
            }
        }

        Ok(OutcomeProbabilities {
            outcomes,
            null_outcome: self.allow_null_transition,
            len: n,
        })
    }
}

// ── OutcomeProbabilities ──────────────────────────────────────────────────────

/// Per-simulant probability of each outcome of a transition set: the
/// declared transitions in order, then the null transition when allowed.
#[derive(Clone, Debug, PartialEq)]
pub struct OutcomeProbabilities {
    /// `outcomes[outcome][row]`.
    outcomes:     Vec<Vec<f64>>,
    null_outcome: bool,
    len:          usize,
}

impl OutcomeProbabilities {
    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of simulants covered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the stay-in-place outcome, if there is one.
    pub fn null_outcome(&self) -> Option<usize> {
        self.null_outcome.then(|| self.outcomes.len() - 1)
    }

    pub fn for_outcome(&self, outcome: usize) -> &[f64] {
        &self.outcomes[outcome]
    }

    pub fn for_row(&self, row: usize) -> Vec<f64> {
        self.outcomes.iter().map(|o| o[row]).collect()
    }

    /// The outcome each row lands in for its draw: the number of cumulative
    /// thresholds strictly below the draw, capped at the last outcome.
    pub fn choose(&self, draws: &[f64]) -> StateResult<Vec<usize>> {
        if draws.len() != self.len {
            return Err(CoreError::LengthMismatch {
                what:     "draws",
                expected: self.len,
                got:      draws.len(),
            }
            .into());
        }
        let last = self.outcomes.len().saturating_sub(1);
        Ok(draws
            .iter()
            .enumerate()
            .map(|(row, &draw)| {
                let mut cumulative = 0.0;
                let mut below = 0;
                for outcome in &self.outcomes {
                    cumulative += outcome[row];
                    if cumulative < draw {
                        below += 1;
                    }
                }
                below.min(last)
            })
            .collect())
    }

    /// Row positions per outcome, in one pass over the draws.
    pub fn partition(&self, draws: &[f64]) -> StateResult<Vec<Vec<usize>>> {
        let mut buckets = vec![Vec::new(); self.outcomes.len()];
        for (row, outcome) in self.choose(draws)?.into_iter().enumerate() {
            buckets[outcome].push(row);
        }
        Ok(buckets)
    }
}

