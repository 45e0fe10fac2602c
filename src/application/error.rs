//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add migration-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("got {actual} desiccated zone thickness values for {expected} soil types")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("no desiccated zone thickness given for soil type \"{soil_type}\"")]
    MissingThickness { soil_type: String },

    #[error("desiccated zone thickness given for unknown soil type \"{soil_type}\"")]
    UnknownSoilType { soil_type: String },

    #[error("invalid {option} value \"{value}\" (expected {expected})")]
    InvalidOption {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid parameter \"{name}\": {message}")]
    InvalidParameter { name: String, message: String },

    #[error("soil type \"{soil_type}\": {source}")]
    SoilType {
        soil_type: String,
        source: Box<ApplicationError>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
