//! Fluent builder for a pre-populated `PopulationTable`.
//!
//! # Usage
//!
//! ```rust
//! use ms_population::{ColumnKind, PopulationBuilder};
//!
//! let table = PopulationBuilder::new(3)
//!     .column("alive", ColumnKind::Bool)
//!     .values("state", vec!["S", "I", "S"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.len(), 3);
//! assert!(table.has_column("state"));
//! ```
//!
//! Mostly used to seed tables for tests and for loading a starting
//! population from a file.  A running simulation grows its table through
//! [`PopulationTable::add_simulants`] instead.

use crate::{Column, ColumnKind, ColumnMap, PopulationError, PopulationResult, PopulationTable};

pub struct PopulationBuilder {
    count:   usize,
    columns: Vec<(String, Column)>,
}

impl PopulationBuilder {
    pub fn new(count: usize) -> Self {
        Self { count, columns: Vec::new() }
    }

    /// Add a column filled with the kind's defaults.
    pub fn column(mut self, name: &str, kind: ColumnKind) -> Self {
        self.columns
            .push((name.to_string(), Column::with_defaults(kind, self.count)));
        self
    }

    /// Add a column with explicit values, one per simulant.
    pub fn values(mut self, name: &str, values: impl Into<Column>) -> Self {
        self.columns.push((name.to_string(), values.into()));
        self
    }

    /// Construct the table.  Fails if any column has the wrong length or a
    /// name is used twice.
    pub fn build(self) -> PopulationResult<PopulationTable> {
        PopulationTable::check_capacity(self.count)?;
        let mut map = ColumnMap::new();
        for (name, column) in self.columns {
            if column.len() != self.count {
                return Err(PopulationError::LengthMismatch {
                    column:   name,
                    expected: self.count,
                    got:      column.len(),
                });
            }
            if map.contains(&name) {
                return Err(PopulationError::InvalidDeclaration(format!(
                    "column {name:?} declared twice"
                )));
            }
            map.insert(&name, column);
        }
        Ok(PopulationTable::from_parts(self.count, map))
    }
}
