//! Application layer: migration steps and orchestration
//!
//! This layer mutates the domain tree; reading and writing deck files is
//! the infrastructure layer's business.

pub mod error;
pub mod options;
pub mod steps;
pub mod update;
pub mod vg2bc;

pub use error::{ApplicationError, ApplicationResult};
pub use options::{DesiccatedZone, MigrationOptions, RelPermModel, SoilResistanceModel};
pub use update::update;
pub use vg2bc::{n_from_m, vg_to_bc, BrooksCorey};
