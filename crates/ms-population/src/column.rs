//! Typed, name-addressed column storage.
//!
//! # Design
//!
//! Each attribute is stored as one `Vec` of a single scalar kind behind the
//! [`Column`] enum.  A [`ColumnMap`] keeps columns addressable by name while
//! remembering insertion order, so frames and summaries print their columns
//! in the order they were declared.  Every column in a map has the same
//! length; row `i` of every column belongs to the same simulant.

use std::fmt;

use rustc_hash::FxHashMap;

// ── ColumnKind / Value ────────────────────────────────────────────────────────

/// The scalar kind stored in a column.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ColumnKind {
    Float,
    Int,
    Bool,
    Str,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnKind::Float => "float",
            ColumnKind::Int => "int",
            ColumnKind::Bool => "bool",
            ColumnKind::Str => "str",
        })
    }
}

/// A single cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Float(_) => ColumnKind::Float,
            Value::Int(_) => ColumnKind::Int,
            Value::Bool(_) => ColumnKind::Bool,
            Value::Str(_) => ColumnKind::Str,
        }
    }

    /// Numeric view of the cell; ints widen, other kinds give `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

// ── Column ────────────────────────────────────────────────────────────────────

/// One attribute for a set of rows.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl Column {
    /// A column of `len` default cells: `NaN`, `0`, `false` or `""`.
    ///
    /// Floats default to `NaN` so that a value nobody initialised is never
    /// mistaken for a real zero.
    pub fn with_defaults(kind: ColumnKind, len: usize) -> Self {
        match kind {
            ColumnKind::Float => Column::Float(vec![f64::NAN; len]),
            ColumnKind::Int => Column::Int(vec![0; len]),
            ColumnKind::Bool => Column::Bool(vec![false; len]),
            ColumnKind::Str => Column::Str(vec![String::new(); len]),
        }
    }

    /// A column of `len` copies of `value`.
    pub fn filled(value: &Value, len: usize) -> Self {
        match value {
            Value::Float(v) => Column::Float(vec![*v; len]),
            Value::Int(v) => Column::Int(vec![*v; len]),
            Value::Bool(v) => Column::Bool(vec![*v; len]),
            Value::Str(v) => Column::Str(vec![v.clone(); len]),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Float(_) => ColumnKind::Float,
            Column::Int(_) => ColumnKind::Int,
            Column::Bool(_) => ColumnKind::Bool,
            Column::Str(_) => ColumnKind::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one default cell.
    pub fn push_default(&mut self) {
        match self {
            Column::Float(v) => v.push(f64::NAN),
            Column::Int(v) => v.push(0),
            Column::Bool(v) => v.push(false),
            Column::Str(v) => v.push(String::new()),
        }
    }

    /// Cell at `row`, or `None` if out of range.
    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            Column::Float(v) => v.get(row).map(|x| Value::Float(*x)),
            Column::Int(v) => v.get(row).map(|x| Value::Int(*x)),
            Column::Bool(v) => v.get(row).map(|x| Value::Bool(*x)),
            Column::Str(v) => v.get(row).map(|x| Value::Str(x.clone())),
        }
    }

    /// Copy cell `src_row` of `src` into `row` of `self`.
    ///
    /// Returns `false` (and writes nothing) if the kinds differ.
    pub(crate) fn copy_cell(&mut self, row: usize, src: &Column, src_row: usize) -> bool {
        match (self, src) {
            (Column::Float(d), Column::Float(s)) => d[row] = s[src_row],
            (Column::Int(d), Column::Int(s)) => d[row] = s[src_row],
            (Column::Bool(d), Column::Bool(s)) => d[row] = s[src_row],
            (Column::Str(d), Column::Str(s)) => d[row].clone_from(&s[src_row]),
            _ => return false,
        }
        true
    }

    /// New column holding the cells at `rows`, in that order.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Float(v) => Column::Float(rows.iter().map(|&r| v[r]).collect()),
            Column::Int(v) => Column::Int(rows.iter().map(|&r| v[r]).collect()),
            Column::Bool(v) => Column::Bool(rows.iter().map(|&r| v[r]).collect()),
            Column::Str(v) => Column::Str(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }

    /// Append every cell of `other`.  Returns `false` if the kinds differ.
    pub(crate) fn extend_from(&mut self, other: &Column) -> bool {
        match (self, other) {
            (Column::Float(d), Column::Float(s)) => d.extend_from_slice(s),
            (Column::Int(d), Column::Int(s)) => d.extend_from_slice(s),
            (Column::Bool(d), Column::Bool(s)) => d.extend_from_slice(s),
            (Column::Str(d), Column::Str(s)) => d.extend(s.iter().cloned()),
            _ => return false,
        }
        true
    }

    pub fn as_f64s(&self) -> Option<&[f64]> {
        match self {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bools(&self) -> Option<&[bool]> {
        match self {
            Column::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strs(&self) -> Option<&[String]> {
        match self {
            Column::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Float(v)
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Column::Int(v)
    }
}

impl From<Vec<bool>> for Column {
    fn from(v: Vec<bool>) -> Self {
        Column::Bool(v)
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Column::Str(v)
    }
}

impl From<Vec<&str>> for Column {
    fn from(v: Vec<&str>) -> Self {
        Column::Str(v.into_iter().map(str::to_string).collect())
    }
}

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Named columns in insertion order.
///
/// The map does not enforce equal lengths itself; [`Frame`](crate::Frame)
/// and [`PopulationTable`](crate::PopulationTable) check lengths before
/// inserting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMap {
    order: Vec<String>,
    map:   FxHashMap<String, Column>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a column of `kind`, pre-filled with `len` defaults.
    ///
    /// Calling this for a name that is already present is a no-op, existing
    /// data is not disturbed.
    pub fn register(&mut self, name: &str, kind: ColumnKind, len: usize) {
        if self.map.contains_key(name) {
            return;
        }
        self.insert(name, Column::with_defaults(kind, len));
    }

    /// Insert or replace a column.  A replaced column keeps its position.
    pub fn insert(&mut self, name: &str, column: Column) {
        if self.map.insert(name.to_string(), column).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Append one default cell to every column.
    pub fn push_defaults(&mut self) {
        for column in self.map.values_mut() {
            column.push_default();
        }
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.map.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// `(name, column)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.map.get(name).map(|c| (name.as_str(), c)))
    }

    /// Number of distinct columns.
    pub fn column_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
