//! `ms-lookup`: lookup tables for components.
//!
//! # Crate layout
//!
//! | Module            | Contents                                              |
//! |-------------------|-------------------------------------------------------|
//! | [`config`]        | `LookupConfig`, `LookupValue`                         |
//! | [`data`]          | `DataTable`, `DataSource`, `CsvDataSource`, `InMemoryDataSource` |
//! | [`interpolation`] | `Interpolation` (order 0 step / order 1 linear)       |
//! | [`table`]         | `LookupTable` (scalar or interpolated)                |
//! | [`error`]         | `LookupError`, `LookupResult<T>`                      |
//!
//! A component names its tables; at setup each name is resolved against the
//! configuration and either becomes a constant or is fitted to external
//! data keyed by categorical and continuous population columns.

pub mod config;
pub mod data;
pub mod error;
pub mod interpolation;
pub mod table;


pub use config::{LookupConfig, LookupValue, DATA_VALUE};
pub use data::{CsvDataSource, DataSource, DataTable, EmptyDataSource, InMemoryDataSource};
pub use error::{LookupError, LookupResult};
pub use interpolation::{categorical_key, Interpolation};
pub use table::LookupTable;
