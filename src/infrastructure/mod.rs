//! Infrastructure layer: I/O boundaries

pub mod error;
pub mod script;

pub use error::{InfraError, InfraResult};
pub use script::ScriptSource;
