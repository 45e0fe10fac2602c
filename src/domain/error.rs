//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the parameter tree structure.
/// These are independent of document parsing and I/O concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("parameter list not found: {path}")]
    MissingPath { path: String },

    #[error("entry \"{name}\" not found in list \"{parent}\"")]
    MissingName { name: String, parent: String },

    #[error("duplicate entry \"{name}\" in list \"{parent}\"")]
    DuplicateName { name: String, parent: String },

    #[error("not a parameter list: \"{name}\"")]
    NotAList { name: String },

    #[error("entry \"{name}\" is not a {expected} value")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("cannot move \"{name}\" into its own subtree")]
    MoveIntoSelf { name: String },
}

/// Result type for parameter tree operations.
pub type TreeResult<T> = Result<T, DomainError>;
