//! Infrastructure layer: deck file I/O
//!
//! This layer reads and writes the ParameterList XML dialect and maps I/O
//! failures onto the error chain.

pub mod error;
pub mod xml;

pub use error::{InfraError, InfraResult};
