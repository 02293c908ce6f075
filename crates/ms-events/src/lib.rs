//! `ms-events`: the phase model and ordered multi-listener dispatch.
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`phase`]    | `Phase` (closed set of lifecycle phases), `Priority`  |
//! | [`event`]    | `Event` (what a listener receives)                    |
//! | [`manager`]  | `EventManager<L>` (per-phase prioritized listeners)   |
//! | [`error`]    | `EventError`, `EventResult<T>`                        |
//!
//! # Phase order
//!
//! ```text
//! post_setup                                    (once)
//! for each step:
//!   time_step__prepare → time_step → time_step__cleanup → collect_metrics
//! simulation_end                                (once)
//! ```
//!
//! Within a phase, listeners run in ascending priority (0 first, 9 last);
//! equal priorities run in registration order.

pub mod error;
pub mod event;
pub mod manager;
pub mod phase;

#[cfg(test)]
mod tests;

pub use error::{EventError, EventResult};
pub use event::Event;
pub use manager::EventManager;
pub use phase::{Phase, Priority};
