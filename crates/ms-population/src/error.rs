use std::fmt;

use ms_core::SimulantId;
use thiserror::Error;

use crate::ColumnKind;

/// Direction of a population access, reported by contract violations.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Read => "read",
            Access::Write => "write",
        })
    }
}

#[derive(Debug, Error)]
pub enum PopulationError {
    /// A view was asked to read or write a column outside its contract.
    #[error("view {view:?} may not {access} column {column:?}")]
    ContractViolation {
        view:   String,
        column: String,
        access: Access,
    },

    #[error("column {0:?} does not exist in the population table")]
    MissingColumn(String),

    #[error("column {column:?} holds {expected} values, got {got}")]
    KindMismatch {
        column:   String,
        expected: ColumnKind,
        got:      ColumnKind,
    },

    #[error("{0} is not in the population table")]
    UnknownSimulant(SimulantId),

    #[error("column {column:?} has {got} rows, expected {expected}")]
    LengthMismatch {
        column:   String,
        expected: usize,
        got:      usize,
    },

    #[error("frames with different columns cannot be combined: {0}")]
    SchemaMismatch(String),

    #[error("cannot add {requested} simulants to a table of {existing}: out of simulant ids")]
    TooManySimulants { existing: usize, requested: usize },

    #[error("invalid column declaration: {0}")]
    InvalidDeclaration(String),
}

/// Shorthand result type for `ms-population`.
pub type PopulationResult<T> = Result<T, PopulationError>;
