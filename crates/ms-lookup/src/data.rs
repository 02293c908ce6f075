//! Tabular data and the sources that provide it.
//!
//! # CSV layout
//!
//! `CsvDataSource` maps a dotted key onto a path under its root directory:
//!
//! ```text
//! key   cause.diarrhea.incidence
//! file  <root>/cause/diarrhea/incidence.csv
//! ```
//!
//! The first row is a header.  Cells are kept as trimmed strings; the
//! interpolation decides which columns are numeric.

use std::io::Read;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::{LookupError, LookupResult};

// ── DataTable ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows:    Vec<Vec<String>>,
}

impl DataTable {
    /// Build from headers and rows.  Every row must have one cell per
    /// header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> LookupResult<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(LookupError::Parse {
                key:     String::new(),
                row:     i,
                message: format!("expected {} cells, got {}", columns.len(), row.len()),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Parse a CSV document with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> LookupResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Self::new(columns, rows)
    }

    pub fn from_csv_path(path: &Path) -> LookupResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cells of column `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let pos = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[pos].as_str()).collect())
    }
}

// ── DataSource ────────────────────────────────────────────────────────────────

/// Loads tables by key.
pub trait DataSource {
    fn load(&self, key: &str) -> LookupResult<DataTable>;
}

/// Reads `<root>/<a>/<b>/<c>.csv` for key `a.b.c`.
#[derive(Clone, Debug)]
pub struct CsvDataSource {
    root: PathBuf,
}

impl CsvDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The file a key resolves to.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in key.split('.') {
            path.push(part);
        }
        path.set_extension("csv");
        path
    }
}

impl DataSource for CsvDataSource {
    fn load(&self, key: &str) -> LookupResult<DataTable> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(LookupError::DataNotFound(key.to_string()));
        }
        DataTable::from_csv_path(&path)
    }
}

/// Tables held in memory, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDataSource {
    tables: FxHashMap<String, DataTable>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, table: DataTable) {
        self.tables.insert(key.to_string(), table);
    }

    pub fn with(mut self, key: &str, table: DataTable) -> Self {
        self.insert(key, table);
        self
    }
}

impl DataSource for InMemoryDataSource {
    fn load(&self, key: &str) -> LookupResult<DataTable> {
        self.tables
            .get(key)
            .cloned()
            .ok_or_else(|| LookupError::DataNotFound(key.to_string()))
    }
}

/// A source with no data.  Any `value: data` lookup fails against it.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyDataSource;

impl DataSource for EmptyDataSource {
    fn load(&self, key: &str) -> LookupResult<DataTable> {
        Err(LookupError::DataNotFound(key.to_string()))
    }
}
