//! Hash-keyed, reproducible randomness.
//!
//! # Determinism strategy
//!
//! A draw is never taken from a shared, advancing generator.  Instead every
//! draw is a pure function of:
//!
//!   (global seed, stream key, tick, simulant id, optional extra key)
//!
//! Those inputs are folded with `FxHasher` into a 64-bit seed for a fresh
//! `SmallRng`, and the first `f64` it produces is the draw.  This means:
//!
//! - Adding a new randomness consumer does not shift the draws seen by any
//!   existing consumer (no shared stream position).
//! - Two runs with the same seed and configuration see identical draws even
//!   if components consume randomness in a different order.
//! - A simulant keeps its draws when other simulants are added or removed.

use std::hash::Hasher;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;

use crate::{CoreError, CoreResult, SimulantId, Tick};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Convert an annual rate into the probability of at least one event during
/// a step of `dt_years`.
#[inline]
pub fn rate_to_probability(rate: f64, dt_years: f64) -> f64 {
    1.0 - (-rate * dt_years).exp()
}

// ── Randomness ────────────────────────────────────────────────────────────────

/// Factory for keyed streams, bound to the run's master seed.
#[derive(Copy, Clone, Debug)]
pub struct Randomness {
    seed: u64,
}

impl Randomness {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the stream for a named decision point.
    pub fn stream(&self, key: impl Into<String>) -> RandomnessStream {
        RandomnessStream::new(key, self.seed)
    }
}

// ── RandomnessStream ──────────────────────────────────────────────────────────

/// Uniform draws for one named decision point (e.g. `"disease.susceptible"`).
#[derive(Clone, Debug)]
pub struct RandomnessStream {
    key: String,
    seed: u64,
    key_hash: u64,
}

impl RandomnessStream {
    pub fn new(key: impl Into<String>, seed: u64) -> Self {
        let key = key.into();
        let mut hasher = FxHasher::default();
        hasher.write(key.as_bytes());
        let key_hash = hasher.finish();
        Self { key, seed, key_hash }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn draw_seed(&self, simulant: SimulantId, tick: Tick, extra: u64) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write_u64(self.seed);
        hasher.write_u64(self.key_hash);
        hasher.write_u64(tick.0);
        hasher.write_u64((simulant.0 as u64).wrapping_mul(MIXING_CONSTANT));
        hasher.write_u64(extra);
        hasher.finish()
    }

    /// A single uniform draw in `[0, 1)`.
    #[inline]
    pub fn draw(&self, simulant: SimulantId, tick: Tick) -> f64 {
        self.draw_keyed(simulant, tick, 0)
    }

    /// Like [`draw`](Self::draw) with an extra key, for decision points that
    /// need more than one independent draw per simulant per step.
    #[inline]
    pub fn draw_keyed(&self, simulant: SimulantId, tick: Tick, extra: u64) -> f64 {
        SmallRng::seed_from_u64(self.draw_seed(simulant, tick, extra)).r#gen::<f64>()
    }

    /// One uniform draw per simulant in `index`, in index order.
    pub fn get_draw(&self, index: &[SimulantId], tick: Tick) -> Vec<f64> {
        index.iter().map(|&s| self.draw(s, tick)).collect()
    }

    /// The simulants whose draw falls below their probability.
    pub fn filter_for_probability(
        &self,
        index:         &[SimulantId],
        tick:          Tick,
        probabilities: &[f64],
    ) -> CoreResult<Vec<SimulantId>> {
        check_len("probabilities", index.len(), probabilities.len())?;
        Ok(index
            .iter()
            .zip(probabilities)
            .filter(|&(&s, &p)| self.draw(s, tick) < p)
            .map(|(&s, _)| s)
            .collect())
    }

    /// Like [`filter_for_probability`](Self::filter_for_probability) for
    /// annual rates over a step of `dt_years`.
    pub fn filter_for_rate(
        &self,
        index:    &[SimulantId],
        tick:     Tick,
        rates:    &[f64],
        dt_years: f64,
    ) -> CoreResult<Vec<SimulantId>> {
        let probabilities: Vec<f64> = rates
            .iter()
            .map(|&r| rate_to_probability(r, dt_years))
            .collect();
        self.filter_for_probability(index, tick, &probabilities)
    }

    /// Weighted categorical choice, one option per simulant.
    ///
    /// Weights are normalised to sum to one; they must be non-negative and
    /// not all zero.
    pub fn choice<T: Clone>(
        &self,
        index:   &[SimulantId],
        tick:    Tick,
        options: &[T],
        weights: &[f64],
    ) -> CoreResult<Vec<T>> {
        check_len("weights", options.len(), weights.len())?;
        let total: f64 = weights.iter().sum();
        if options.is_empty() || total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
            return Err(CoreError::Config(format!(
                "choice on stream {:?} needs non-negative weights with a positive sum, got {weights:?}",
                self.key
            )));
        }

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for w in weights {
            acc += w / total;
            cumulative.push(acc);
        }

        let last = options.len() - 1;
        Ok(index
            .iter()
            .map(|&s| {
                let draw = self.draw(s, tick);
                let chosen = cumulative.iter().filter(|&&c| c < draw).count().min(last);
                options[chosen].clone()
            })
            .collect())
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> CoreResult<()> {
    if expected != got {
        return Err(CoreError::LengthMismatch { what, expected, got });
    }
    Ok(())
}
