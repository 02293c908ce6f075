//! `PopulationTable`: the single shared, mutable columnar store.
//!
//! Rows are simulants; `SimulantId(i)` is row `i`.  Rows are only ever
//! appended, so ids are stable for the whole run.  Columns appear lazily the
//! first time something writes them, which lets components declare the
//! columns they create without the table knowing their kinds up front.

use ms_core::{id_range, SimulantId};

use crate::{Column, ColumnMap, Frame, PopulationError, PopulationResult, RowRef};

#[derive(Clone, Debug, Default)]
pub struct PopulationTable {
    /// Number of simulants.  Equals the length of every column.
    count:   usize,
    columns: ColumnMap,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(count: usize, columns: ColumnMap) -> Self {
        Self { count, columns }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Every simulant id, ascending.
    pub fn ids(&self) -> Vec<SimulantId> {
        // `count` never exceeds the id space; see `reserve_ids`.
        id_range(0, self.count).unwrap_or_default()
    }

    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn column(&self, name: &str) -> PopulationResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| PopulationError::MissingColumn(name.to_string()))
    }

    pub fn row(&self, simulant: SimulantId) -> PopulationResult<RowRef<'_>> {
        self.check_ids(&[simulant])?;
        Ok(RowRef::new(&self.columns, simulant.index()))
    }

    pub(crate) fn check_capacity(count: usize) -> PopulationResult<()> {
        u32::try_from(count)
            .map(|_| ())
            .map_err(|_| PopulationError::TooManySimulants { existing: 0, requested: count })
    }

    fn check_ids(&self, index: &[SimulantId]) -> PopulationResult<()> {
        match index.iter().find(|s| s.index() >= self.count) {
            Some(&s) => Err(PopulationError::UnknownSimulant(s)),
            None => Ok(()),
        }
    }

    // ── Growth ────────────────────────────────────────────────────────────

    /// Append `n` rows with default cells in every existing column and
    /// return their ids.  Fails, leaving the table unchanged, if the new
    /// ids would not fit.
    pub fn add_simulants(&mut self, n: usize) -> PopulationResult<Vec<SimulantId>> {
        let ids = reserve_ids(self.count, n)?;
        for _ in 0..n {
            self.columns.push_defaults();
        }
        self.count += n;
        Ok(ids)
    }

    // ── Read ──────────────────────────────────────────────────────────────

    /// Copy `columns` for the rows in `index` into a new frame.
    pub fn get<S: AsRef<str>>(&self, index: &[SimulantId], columns: &[S]) -> PopulationResult<Frame> {
        self.check_ids(index)?;
        let rows: Vec<usize> = index.iter().map(|s| s.index()).collect();
        let mut frame = Frame::new(index.to_vec());
        for name in columns {
            let name = name.as_ref();
            frame.insert_column(name, self.column(name)?.take(&rows))?;
        }
        Ok(frame)
    }

    // ── Write ─────────────────────────────────────────────────────────────

    /// Write every column of `update` into the rows named by its index.
    ///
    /// Columns not yet in the table are created with default cells for rows
    /// outside the update.  The whole update is validated before any cell
    /// changes, so a failed write leaves the table untouched.
    pub fn write(&mut self, update: &Frame) -> PopulationResult<()> {
        self.check_ids(update.index())?;
        for (name, column) in update.columns().iter() {
            if let Some(existing) = self.columns.get(name) {
                if existing.kind() != column.kind() {
                    return Err(PopulationError::KindMismatch {
                        column:   name.to_string(),
                        expected: existing.kind(),
                        got:      column.kind(),
                    });
                }
            }
        }

        for (name, column) in update.columns().iter() {
            self.columns.register(name, column.kind(), self.count);
            if let Some(dst) = self.columns.get_mut(name) {
                for (src_row, simulant) in update.index().iter().enumerate() {
                    dst.copy_cell(simulant.index(), column, src_row);
                }
            }
        }
        Ok(())
    }
}

/// Ids for `requested` rows appended after `existing`.
pub(crate) fn reserve_ids(existing: usize, requested: usize) -> PopulationResult<Vec<SimulantId>> {
    let overflow = || PopulationError::TooManySimulants { existing, requested };
    let start = u32::try_from(existing).map_err(|_| overflow())?;
    id_range(start, requested).map_err(|_| overflow())
}
