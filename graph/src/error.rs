//! Rate graph error types.

use ratemesh_common::Currency;
use thiserror::Error;

/// Errors reported by rate graph queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The currency never appeared in a published rate.
    #[error("Vertex {0} not found")]
    VertexNotFound(Currency),

    /// Both currencies are known but no chain of rates connects them.
    #[error("Path from {from} to {to} not found")]
    PathNotFound { from: Currency, to: Currency },
}

/// Result type for rate graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
