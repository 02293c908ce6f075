use ms_population::PopulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup configuration error: {0}")]
    Config(String),

    #[error("only order 0 and order 1 interpolations are supported, got {0}")]
    UnsupportedOrder(u8),

    #[error("data {key:?} has no column {column:?}")]
    MissingColumn { key: String, column: String },

    #[error("data {0:?} is empty")]
    EmptyData(String),

    #[error("data {key:?} must have exactly one value column, found {found:?}")]
    ValueColumns { key: String, found: Vec<String> },

    #[error("data {key:?} row {row}: {message}")]
    Parse {
        key:     String,
        row:     usize,
        message: String,
    },

    #[error("data {key:?} has no rows for key {group:?}")]
    MissingGroup { key: String, group: Vec<String> },

    #[error("no data source provides {0:?}")]
    DataNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Population(#[from] PopulationError),
}

/// Shorthand result type for `ms-lookup`.
pub type LookupResult<T> = Result<T, LookupError>;
