//! `ms-state`: probabilistic state machines over population cohorts.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`probability`] | `Probability`: constant, rate, column or custom per simulant    |
//! | [`transition`]  | `Transition`, `TransitionSet`, `OutcomeProbabilities`           |
//! | [`state`]       | `State`: id, outgoing transitions, entry side effect            |
//! | [`machine`]     | `Machine`, `StepContext`                                        |
//! | [`component`]   | `StateMachineComponent`, `InitialState`                         |
//! | [`error`]       | `StateError`, `StateResult<T>`                                  |
//!
//! # One step of a machine
//!
//! 1. The population is split into cohorts by state-column value.  A value
//!    matching no state is an error.
//! 2. Per cohort, every outgoing transition's probability is evaluated and
//!    turned into a per-simulant distribution over outcomes (normalised, or
//!    topped up with a "stay" outcome when null transitions are allowed).
//! 3. One draw per simulant from the stream `"<state column>.<state id>"`
//!    picks an outcome; simulants are bucketed by outcome in a single pass.
//! 4. Each moved bucket gets the target id written to the state column and
//!    the target's side effect applied.  Buckets are stacked back together.
//!
//! All checks in step 2 happen before anything is written.

pub mod component;
pub mod error;
pub mod machine;
pub mod probability;
pub mod state;
pub mod transition;

#[cfg(test)]
mod tests;

pub use component::{InitialState, StateMachineComponent};
pub use error::{StateError, StateResult};
pub use machine::{Machine, StepContext};
pub use probability::{Probability, ProbabilityFn};
pub use state::{SideEffectFn, State};
pub use transition::{OutcomeProbabilities, Transition, TransitionSet, PROBABILITY_TOLERANCE};
