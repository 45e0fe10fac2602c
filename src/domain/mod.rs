//! Domain layer: the parameter tree and its structural operations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no
//! document syntax).

pub mod error;
pub mod path;
pub mod tree;

pub use error::{DomainError, TreeResult};
pub use tree::{DetachedNode, NodeKind, ParamNode, ParamTree, ParamValue, TreeIterator};
