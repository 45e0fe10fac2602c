//! Infrastructure-level errors (wraps application errors)

use std::path::Path;

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add I/O concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("cannot read {context}: {source}")]
    Read {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {context}: {source}")]
    Write {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input deck ({context}): {message}")]
    Parse { context: String, message: String },
}

impl InfraError {
    /// Create a read error carrying the file path.
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            context: path.display().to_string(),
            source,
        }
    }

    /// Create a write error carrying the file path.
    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            context: path.display().to_string(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
