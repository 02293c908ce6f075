//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter (one tick
//! per simulation step).  The mapping to wall-clock time is held in
//! `SimClock`:
//!
//!   wall_time = start_unix_secs + tick * step_size_secs
//!
//! Using an integer tick as the canonical time unit keeps randomness keys
//! exact: the same step always hashes to the same draw context.

use std::fmt;

use serde::Deserialize;

/// Seconds in an average year, used to turn annual rates into per-step
/// probabilities.
pub const SECS_PER_YEAR: f64 = 365.25 * 86_400.0;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between step counts and Unix wall-clock seconds.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of tick 0.
    pub start_unix_secs: i64,
    /// How many simulated seconds one step represents.
    pub step_size_secs: u32,
    /// The current tick, advanced by `SimClock::advance()` after each step.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_unix_secs: i64, step_size_secs: u32) -> Self {
        Self {
            start_unix_secs,
            step_size_secs,
            current_tick: Tick::ZERO,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> i64 {
        self.current_tick.0 as i64 * self.step_size_secs as i64
    }

    /// Unix timestamp of `tick`.
    #[inline]
    pub fn unix_secs_at(&self, tick: Tick) -> i64 {
        self.start_unix_secs + tick.0 as i64 * self.step_size_secs as i64
    }

    /// Step size expressed in (fractional) years.
    #[inline]
    pub fn step_size_years(&self) -> f64 {
        self.step_size_secs as f64 / SECS_PER_YEAR
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.elapsed_secs().max(0) / 86_400;
        write!(f, "{} (day {})", self.current_tick, days)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run parameters.
///
/// Usually read from the `simulation` section of a
/// [`ConfigTree`](crate::ConfigTree) with `get_as::<SimConfig>(&["simulation"])`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimConfig {
    /// Unix timestamp for tick 0.
    #[serde(default)]
    pub start_unix_secs: i64,

    /// Seconds per step.  Default: one day.
    #[serde(default = "default_step_size_secs")]
    pub step_size_secs: u32,

    /// Total steps to simulate.
    pub total_steps: u64,

    /// Master randomness seed.  The same seed always produces identical runs.
    #[serde(default)]
    pub seed: u64,

    /// Simulants created before the first step.
    #[serde(default)]
    pub population_size: usize,
}

fn default_step_size_secs() -> u32 {
    86_400
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_steps)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.step_size_secs)
    }
}
