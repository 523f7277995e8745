//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of the hierarchy rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("industry not found: {0}")]
    NodeNotFound(NodeId),

    #[error("industry {0} cannot become its own parent")]
    SelfDrop(NodeId),

    #[error("moving {child} under {new_parent} would create a cycle")]
    CycleDetected { child: NodeId, new_parent: NodeId },

    #[error("invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("malformed drag payload: {0}")]
    MalformedPayload(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
