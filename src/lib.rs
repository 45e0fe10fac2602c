//! atsup: migrate ATS input decks from the 1.4 to the 1.5 state schema
//!
//! An input deck is one named parameter tree serialized as ParameterList
//! XML. The migration rewires soil resistance and relative permeability
//! evaluators, relocates water retention parameters under the state list,
//! fills in desiccated zone thicknesses, and for arctic runs derives
//! Brooks-Corey curve parameters from van Genuchten ones.
//!
//! Layers:
//! - `domain`: the parameter tree, path lookup, subtree relocation
//! - `application`: the migration steps, their orchestration, and the
//!   water retention curve conversion
//! - `infrastructure`: deck parsing and atomic serialization
//! - `cli`: argument handling, terminal output, exit codes

pub mod application;
pub mod cli;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;

pub use application::{update, MigrationOptions};
pub use domain::{ParamTree, ParamValue};
