//! `ms-sim`: simulation builder and step loop for the microsim kernel.
//!
//! # Lifecycle
//!
//! ```text
//! SimBuilder::build:
//!   ① add components (and their sub-components), apply their
//!     configuration defaults, freeze the configuration
//!   ② set up every component in add order
//!   ③ create `population_size` simulants and run initializers
//!   ④ emit post_setup
//!
//! Simulation::run:
//!   for tick in current..config.end_tick():
//!     emit time_step__prepare, time_step, time_step__cleanup, collect_metrics
//!     advance the clock
//!   emit simulation_end
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ms_core::SimConfig;
//! use ms_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config).component(my_component).build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use ms_component::Metrics;
pub use observer::{NoopObserver, SimObserver};
pub use sim::Simulation;
