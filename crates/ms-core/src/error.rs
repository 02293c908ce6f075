//! Kernel-wide base error type.
//!
//! Higher crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown configuration layer {0:?}")]
    UnknownLayer(String),

    #[error("configuration key {0:?} not found")]
    MissingKey(String),

    #[error("configuration tree is frozen; cannot set {0:?}")]
    Frozen(String),

    #[error("{what} length {got} does not match expected {expected}")]
    LengthMismatch {
        what:     &'static str,
        expected: usize,
        got:      usize,
    },

    #[error("{count} simulant ids starting at {start} exceed the id space")]
    IdOverflow { start: u32, count: usize },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ms-core`.
pub type CoreResult<T> = Result<T, CoreError>;
