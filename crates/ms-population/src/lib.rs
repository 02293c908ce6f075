//! `ms-population`: the population table and the views components use to
//! reach it.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`column`]   | `ColumnKind`, `Value`, `Column`, `ColumnMap`              |
//! | [`frame`]    | `Frame` (an owned cohort of rows), `RowRef`               |
//! | [`table`]    | `PopulationTable` (shared columnar store)                 |
//! | [`view`]     | `PopulationView`, `Query`, `RequiredColumns`, column precedence |
//! | [`builder`]  | `PopulationBuilder` (fluent construction)                 |
//! | [`error`]    | `PopulationError`, `PopulationResult`, `Access`           |

pub mod builder;
pub mod column;
pub mod error;
pub mod frame;
pub mod table;
pub mod view;


pub use builder::PopulationBuilder;
pub use column::{Column, ColumnKind, ColumnMap, Value};
pub use error::{Access, PopulationError, PopulationResult};
pub use frame::{Frame, RowRef};
pub use table::PopulationTable;
pub use view::{resolve_view_columns, PopulationView, Query, RequiredColumns, ViewColumns};
