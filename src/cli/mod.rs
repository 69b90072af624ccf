//! CLI layer: argument parsing, sessions and command dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod output;
pub mod session;

pub use args::{Cli, Commands};
pub use error::{CliError, CliResult};
pub use session::{Session, SessionCommand, SessionSummary};
