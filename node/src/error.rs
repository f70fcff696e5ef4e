//! Node error types.

use ratemesh_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised while serving connections.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;
