//! `ms-output`: simulation output writers for the microsim kernel.
//!
//! | Backend     | Files created                          |
//! |-------------|----------------------------------------|
//! | CSV         | `step_summaries.csv`, `metrics.csv`    |
//!
//! Backends implement [`MetricsWriter`] and are driven by
//! [`SimOutputObserver`], which implements `ms_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ms_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer, &config)
//!     .track("disease", ["susceptible", "infected", "recovered"]);
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{MetricRow, StepSummaryRow};
pub use writer::MetricsWriter;
