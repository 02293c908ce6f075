//! `Frame`: an owned, column-subset copy of some population rows.
//!
//! Frames are what hooks and the state machine actually work with.  A frame
//! is read out of the [`PopulationTable`](crate::PopulationTable) through a
//! view, transformed, and written back through the same view.  The `index`
//! carries the simulant id of each row so that row order can change freely
//! between read and write.

use ms_core::SimulantId;

use crate::{Column, ColumnKind, ColumnMap, PopulationError, PopulationResult, Value};

// ── RowRef ────────────────────────────────────────────────────────────────────

/// Borrowed access to one row of a column map.  Used by query predicates.
#[derive(Copy, Clone)]
pub struct RowRef<'a> {
    columns: &'a ColumnMap,
    row:     usize,
}

impl<'a> RowRef<'a> {
    pub(crate) fn new(columns: &'a ColumnMap, row: usize) -> Self {
        Self { columns, row }
    }

    /// Cell in column `name`, or `None` if the column does not exist.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.columns.get(name).and_then(|c| c.value(self.row))
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.columns.get(name)?.as_f64s()?.get(self.row).copied()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.columns.get(name)?.as_ints()?.get(self.row).copied()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.columns.get(name)?.as_bools()?.get(self.row).copied()
    }

    pub fn str(&self, name: &str) -> Option<&'a str> {
        self.columns
            .get(name)?
            .as_strs()?
            .get(self.row)
            .map(String::as_str)
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    index:   Vec<SimulantId>,
    columns: ColumnMap,
}

impl Frame {
    /// A frame over `index` with no columns yet.
    pub fn new(index: Vec<SimulantId>) -> Self {
        Self { index, columns: ColumnMap::new() }
    }

    /// Builder-style [`insert_column`](Self::insert_column).
    pub fn with_column(mut self, name: &str, column: impl Into<Column>) -> PopulationResult<Self> {
        self.insert_column(name, column.into())?;
        Ok(self)
    }

    /// Insert or replace a column.  Its length must equal the row count.
    pub fn insert_column(&mut self, name: &str, column: Column) -> PopulationResult<()> {
        if column.len() != self.index.len() {
            return Err(PopulationError::LengthMismatch {
                column:   name.to_string(),
                expected: self.index.len(),
                got:      column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    // ── Shape ─────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Simulant id of each row.
    pub fn index(&self) -> &[SimulantId] {
        &self.index
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// `(name, kind)` pairs in column order.
    pub fn schema(&self) -> Vec<(String, ColumnKind)> {
        self.columns
            .iter()
            .map(|(name, c)| (name.to_string(), c.kind()))
            .collect()
    }

    pub fn row(&self, row: usize) -> RowRef<'_> {
        RowRef::new(&self.columns, row)
    }

    // ── Typed column access ───────────────────────────────────────────────

    pub fn column(&self, name: &str) -> PopulationResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| PopulationError::MissingColumn(name.to_string()))
    }

    fn typed<'a, T: ?Sized>(
        &'a self,
        name: &str,
        kind: ColumnKind,
        pick: impl FnOnce(&'a Column) -> Option<&'a T>,
    ) -> PopulationResult<&'a T> {
        let column = self.column(name)?;
        pick(column).ok_or_else(|| PopulationError::KindMismatch {
            column:   name.to_string(),
            expected: kind,
            got:      column.kind(),
        })
    }

    pub fn f64s(&self, name: &str) -> PopulationResult<&[f64]> {
        self.typed(name, ColumnKind::Float, Column::as_f64s)
    }

    pub fn ints(&self, name: &str) -> PopulationResult<&[i64]> {
        self.typed(name, ColumnKind::Int, Column::as_ints)
    }

    pub fn bools(&self, name: &str) -> PopulationResult<&[bool]> {
        self.typed(name, ColumnKind::Bool, Column::as_bools)
    }

    pub fn strs(&self, name: &str) -> PopulationResult<&[String]> {
        self.typed(name, ColumnKind::Str, Column::as_strs)
    }

    // ── Row / column operations ───────────────────────────────────────────

    /// New frame with the rows at positions `rows`, in that order.
    pub fn take(&self, rows: &[usize]) -> Frame {
        let mut columns = ColumnMap::new();
        for (name, column) in self.columns.iter() {
            columns.insert(name, column.take(rows));
        }
        Frame {
            index: rows.iter().map(|&r| self.index[r]).collect(),
            columns,
        }
    }

    /// A zero-row frame with the same columns and kinds.
    pub fn empty_like(&self) -> Frame {
        self.take(&[])
    }

    /// Stack `parts` vertically.  Every part must have the schema of
    /// `template`; an empty `parts` gives `template.empty_like()`.
    pub fn concat(template: &Frame, parts: Vec<Frame>) -> PopulationResult<Frame> {
        let schema = template.schema();
        let mut out = template.empty_like();
        for part in parts {
            if part.schema() != schema {
                return Err(PopulationError::SchemaMismatch(format!(
                    "expected {:?}, got {:?}",
                    schema,
                    part.schema()
                )));
            }
            out.index.extend_from_slice(&part.index);
            for (name, column) in part.columns.iter() {
                if let Some(dst) = out.columns.get_mut(name) {
                    dst.extend_from(column);
                }
            }
        }
        Ok(out)
    }

    /// Overwrite every cell of an existing column with `value`.
    pub fn set_all(&mut self, name: &str, value: &Value) -> PopulationResult<()> {
        let len = self.len();
        let column = self
            .columns
            .get_mut(name)
            .ok_or_else(|| PopulationError::MissingColumn(name.to_string()))?;
        if column.kind() != value.kind() {
            return Err(PopulationError::KindMismatch {
                column:   name.to_string(),
                expected: column.kind(),
                got:      value.kind(),
            });
        }
        *column = Column::filled(value, len);
        Ok(())
    }

    /// Row positions whose string column `name` equals `value`.
    pub fn select_where_str(&self, name: &str, value: &str) -> PopulationResult<Vec<usize>> {
        Ok(self
            .strs(name)?
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_str() == value)
            .map(|(i, _)| i)
            .collect())
    }

    /// Row positions for which `predicate` holds.
    pub fn select(&self, predicate: impl Fn(RowRef<'_>) -> bool) -> Vec<usize> {
        (0..self.len()).filter(|&r| predicate(self.row(r))).collect()
    }
}
