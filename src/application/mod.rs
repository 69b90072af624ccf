//! Application layer: the staging workspace
//!
//! This layer orchestrates domain logic; it performs no I/O.

pub mod error;
pub mod workspace;

pub use error::{ApplicationError, ApplicationResult, UNEXPECTED_MESSAGE};
pub use workspace::Workspace;
