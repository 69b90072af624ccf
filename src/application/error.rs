//! Application-level errors (wraps domain errors)

use thiserror::Error;
use tracing::error;

use crate::domain::{DomainError, NodeId};

/// Shown to users for failures that carry no user-facing meaning.
pub const UNEXPECTED_MESSAGE: &str = "unexpected error, see log output for details";

/// Application errors wrap domain errors and add workspace-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("select a node to {action}")]
    NoSelection { action: &'static str },

    #[error("node {0} is not in the store, pick another node")]
    NotInStore(NodeId),

    #[error("node {0} is already in the scratch tree, pick another node")]
    AlreadyCopied(NodeId),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Message for the end user.
    ///
    /// Known failures pass their text through unmodified; anything else is
    /// logged with detail and reported as an opaque unexpected error.
    pub fn user_message(&self) -> String {
        match self {
            ApplicationError::OperationFailed { context, source } => {
                error!("{}: {}", context, source);
                UNEXPECTED_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
