//! Core error types for noderig-core.
//!
//! Uses `thiserror` for structured, matchable variants covering the failure
//! modes of the host graph primitives.

use thiserror::Error;

use crate::id::{LinkId, NodeId, SocketRef};

/// Errors produced by host graph operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A graph with this name already exists in the host.
    #[error("duplicate graph name: '{name}'")]
    DuplicateGraph { name: String },

    /// A node index was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// A socket address does not resolve to a socket.
    #[error("socket not found: {socket}")]
    SocketNotFound { socket: SocketRef },

    /// A link index was not found in the graph.
    #[error("link not found: LinkId({id})", id = id.0)]
    LinkNotFound { id: LinkId },

    /// A link request failed validation.
    #[error("invalid link: {reason}")]
    InvalidLink { reason: String },
}
