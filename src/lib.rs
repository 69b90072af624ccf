//! stagetree: an in-memory forest of labeled nodes with a two-tree staging
//! workflow.
//!
//! Edits accumulate in a scratch [`domain::Forest`] and are merged into a
//! store forest on apply (see [`application::Workspace`]).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
