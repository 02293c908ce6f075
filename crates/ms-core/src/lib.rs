//! `ms-core`: foundational types for the microsimulation kernel.
//!
//! Every other `ms-*` crate depends on this one.  It has no `ms-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `SimulantId`, `id_range`                                  |
//! | [`time`]   | `Tick`, `SimClock`, `SimConfig`                           |
//! | [`rng`]    | `Randomness`, `RandomnessStream`, `rate_to_probability`   |
//! | [`config`] | `ConfigTree` (layered YAML configuration)                 |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ConfigTree, ValueSource, DEFAULT_LAYERS};
pub use error::{CoreError, CoreResult};
pub use ids::{id_range, SimulantId};
pub use rng::{rate_to_probability, Randomness, RandomnessStream};
pub use time::{SimClock, SimConfig, Tick, SECS_PER_YEAR};
