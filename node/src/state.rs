//! Node lifecycle states.

/// Node operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Created, listener not bound yet.
    Starting,
    /// Accepting connections.
    Running,
    /// No new connections; open ones are draining.
    ShuttingDown,
    /// All connections closed.
    Stopped,
}

impl NodeState {
    /// Check if the node is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Stopped)
    }
}
