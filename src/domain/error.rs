//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Malformed source records rejected while building a tree.
///
/// Construction is all-or-nothing: any of these aborts the build and no
/// tree instance is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record at {path} has no '{field}' field")]
    MissingId { path: String, field: String },

    #[error("record at {path} has an id that is neither a string nor a number")]
    InvalidId { path: String },

    #[error("record at {path} is not an object")]
    NotAnObject { path: String },

    #[error("duplicate id: {0}")]
    DuplicateId(NodeId),

    #[error("cycle detected in hierarchy at: {0}")]
    CycleDetected(NodeId),

    #[error("record {id} references unknown parent {parent}")]
    UnknownParent { id: NodeId, parent: NodeId },

    #[error("record {id}: field '{field}' must be {expected}")]
    InvalidField {
        id: NodeId,
        field: String,
        expected: &'static str,
    },
}

/// An operation referenced an id that is not part of the current tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node not found: {0}")]
pub struct NotFoundError(pub NodeId);

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;
