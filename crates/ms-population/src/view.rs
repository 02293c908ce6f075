//! Scoped, column-restricted access to the population table.
//!
//! # Effective columns
//!
//! A component declares the columns it creates and the columns it requires.
//! [`resolve_view_columns`] turns those two declarations into the set of
//! columns its view may read, once, at setup:
//!
//! | `required`          | `created`   | View columns              |
//! |---------------------|-------------|---------------------------|
//! | `Columns(list)`     | any         | created ∪ list            |
//! | `All`               | any         | every column in the table |
//! | `None`              | non-empty   | created                   |
//! | `None`              | empty       | no view                   |
//!
//! A view may write only the columns its component creates.

use std::fmt;
use std::sync::Arc;

use ms_core::SimulantId;
use rustc_hash::FxHashSet;

use crate::{Access, Frame, PopulationError, PopulationResult, PopulationTable, RowRef};

// ── Declarations ──────────────────────────────────────────────────────────────

/// Columns a component needs to read beyond those it creates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequiredColumns {
    /// Nothing beyond the created columns.
    #[default]
    None,
    /// Every column in the table.
    All,
    /// The created columns plus this list.
    Columns(Vec<String>),
}

impl RequiredColumns {
    pub fn columns<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        RequiredColumns::Columns(names.into_iter().map(Into::into).collect())
    }
}

/// The resolved column set of a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewColumns {
    All,
    Named(Vec<String>),
}

fn check_unique(what: &str, names: &[String]) -> PopulationResult<()> {
    let mut seen = FxHashSet::default();
    for name in names {
        if name.is_empty() {
            return Err(PopulationError::InvalidDeclaration(format!("empty {what} column name")));
        }
        if !seen.insert(name.as_str()) {
            return Err(PopulationError::InvalidDeclaration(format!(
                "{what} column {name:?} declared twice"
            )));
        }
    }
    Ok(())
}

/// Apply the precedence table in the module docs.
///
/// Returns `Ok(None)` when the component gets no view.  Duplicate or empty
/// names in either declaration are rejected.
pub fn resolve_view_columns(
    created:  &[String],
    required: &RequiredColumns,
) -> PopulationResult<Option<ViewColumns>> {
    check_unique("created", created)?;
    match required {
        RequiredColumns::Columns(list) => {
            check_unique("required", list)?;
            let mut columns = created.to_vec();
            columns.extend(list.iter().filter(|c| !created.contains(c)).cloned());
            if columns.is_empty() {
                return Ok(None);
            }
            Ok(Some(ViewColumns::Named(columns)))
        }
        RequiredColumns::All => Ok(Some(ViewColumns::All)),
        RequiredColumns::None if created.is_empty() => Ok(None),
        RequiredColumns::None => Ok(Some(ViewColumns::Named(created.to_vec()))),
    }
}

// ── Query ─────────────────────────────────────────────────────────────────────

/// A named row filter.
///
/// The predicate sees the whole table row, including columns outside the
/// view, so a component can filter on attributes it may not read.
#[derive(Clone)]
pub struct Query {
    name:      String,
    predicate: Arc<dyn Fn(RowRef<'_>) -> bool + Send + Sync>,
}

impl Query {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(RowRef<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), predicate: Arc::new(predicate) }
    }

    /// Rows whose string column `column` equals `value`.
    pub fn str_eq(column: &str, value: &str) -> Self {
        let (column, value) = (column.to_string(), value.to_string());
        Self::new(format!("{column} == {value:?}"), move |row| {
            row.str(&column) == Some(value.as_str())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn matches(&self, row: RowRef<'_>) -> bool {
        (self.predicate)(row)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.name).finish()
    }
}

// ── PopulationView ────────────────────────────────────────────────────────────

/// A component's handle onto the population table.
///
/// The view owns no data; every read copies into a [`Frame`] and every write
/// copies a frame back.
#[derive(Clone, Debug)]
pub struct PopulationView {
    name:     String,
    columns:  ViewColumns,
    writable: Vec<String>,
    query:    Option<Query>,
}

impl PopulationView {
    /// `name` identifies the owner in contract-violation errors.
    pub fn new(
        name:     impl Into<String>,
        columns:  ViewColumns,
        writable: Vec<String>,
        query:    Option<Query>,
    ) -> Self {
        Self { name: name.into(), columns, writable, query }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view_columns(&self) -> &ViewColumns {
        &self.columns
    }

    pub fn writable(&self) -> &[String] {
        &self.writable
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// The concrete readable columns against `table`.
    pub fn columns(&self, table: &PopulationTable) -> Vec<String> {
        match &self.columns {
            ViewColumns::All => table.column_names().to_vec(),
            ViewColumns::Named(names) => names.clone(),
        }
    }

    pub fn can_read(&self, column: &str) -> bool {
        match &self.columns {
            ViewColumns::All => true,
            ViewColumns::Named(names) => names.iter().any(|c| c == column),
        }
    }

    pub fn can_write(&self, column: &str) -> bool {
        self.writable.iter().any(|c| c == column)
    }

    fn violation(&self, column: &str, access: Access) -> PopulationError {
        PopulationError::ContractViolation {
            view:   self.name.clone(),
            column: column.to_string(),
            access,
        }
    }

    /// `index` narrowed to the rows the view's query accepts.
    pub fn filter(&self, table: &PopulationTable, index: &[SimulantId]) -> PopulationResult<Vec<SimulantId>> {
        let Some(query) = &self.query else {
            return Ok(index.to_vec());
        };
        let mut kept = Vec::with_capacity(index.len());
        for &simulant in index {
            if query.matches(table.row(simulant)?) {
                kept.push(simulant);
            }
        }
        Ok(kept)
    }

    /// Every view column for the rows of `index` the query accepts.
    pub fn get(&self, table: &PopulationTable, index: &[SimulantId]) -> PopulationResult<Frame> {
        let rows = self.filter(table, index)?;
        table.get(&rows, &self.columns(table))
    }

    /// A subset of the view columns.  Naming a column outside the view is a
    /// contract violation.
    pub fn get_columns(
        &self,
        table:   &PopulationTable,
        index:   &[SimulantId],
        columns: &[&str],
    ) -> PopulationResult<Frame> {
        if let Some(bad) = columns.iter().find(|c| !self.can_read(c)) {
            return Err(self.violation(bad, Access::Read));
        }
        let rows = self.filter(table, index)?;
        table.get(&rows, columns)
    }

    /// Write `update` back to the table.  Every column of `update` must be
    /// one this view's owner creates.
    pub fn update(&self, table: &mut PopulationTable, update: &Frame) -> PopulationResult<()> {
        if let Some(bad) = update.column_names().iter().find(|c| !self.can_write(c)) {
            return Err(self.violation(bad, Access::Write));
        }
        table.write(update)
    }

    /// A narrower view over `columns`, which must all be readable here.
    pub fn subview(&self, columns: &[&str]) -> PopulationResult<PopulationView> {
        if let Some(bad) = columns.iter().find(|c| !self.can_read(c)) {
            return Err(self.violation(bad, Access::Read));
        }
        Ok(PopulationView {
            name:     self.name.clone(),
            columns:  ViewColumns::Named(columns.iter().map(|c| c.to_string()).collect()),
            writable: self
                .writable
                .iter()
                .filter(|w| columns.contains(&w.as_str()))
                .cloned()
                .collect(),
            query:    self.query.clone(),
        })
    }
}
