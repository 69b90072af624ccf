//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::{NodeId, MAX_VALUE_LEN};

/// Domain errors represent violations of the forest's contracts.
///
/// The `Display` text is meant for end users and is surfaced unmodified by
/// the outer layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tree already contains a node with identifier {0}")]
    DuplicateIdentifier(NodeId),

    #[error("node not found: {0}")]
    NotFound(NodeId),

    #[error("{}", invalid_value_message(.id, .length))]
    InvalidValue { id: Option<NodeId>, length: usize },
}

fn invalid_value_message(id: &Option<NodeId>, length: &usize) -> String {
    match id {
        Some(id) => format!(
            "value of node {id} must have 1 to {MAX_VALUE_LEN} characters (got {length})"
        ),
        None => format!("value must have 1 to {MAX_VALUE_LEN} characters (got {length})"),
    }
}

/// Result type for forest operations.
pub type DomainResult<T> = Result<T, DomainError>;
