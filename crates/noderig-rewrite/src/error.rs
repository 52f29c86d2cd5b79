//! Rewrite error types.
//!
//! [`RewriteError`] covers the failure classes a rewrite can hit: the
//! graph vanished, an expected socket or node is missing or of the wrong
//! kind, or the host rejected a primitive. None of them are fatal; the
//! caller logs and moves on to the next unit of work.

use noderig_core::{CoreError, NodeId, SocketDirection};
use thiserror::Error;

/// Errors produced while rewriting a graph.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The graph was deleted between scheduling and execution.
    #[error("graph not found: '{graph}'")]
    GraphNotFound { graph: String },

    /// A node referenced by a link snapshot no longer exists.
    #[error("node not found: NodeId({id})", id = node.0)]
    NodeNotFound { node: NodeId },

    /// The node is expected to instance another graph but does not.
    #[error("node {node} is not a group instance")]
    NotAGroup { node: NodeId },

    /// A node lacks a socket the rewrite needs.
    #[error("node {node} has no {direction} socket named '{name}'")]
    SocketNotFound {
        node: NodeId,
        direction: SocketDirection,
        name: String,
    },

    /// The host rejected a graph primitive.
    #[error("host error: {0}")]
    Host(#[from] CoreError),

    /// A handler failed in a way not covered above, including panics caught
    /// at the dispatch boundary.
    #[error("handler failure: {reason}")]
    Internal { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderig_core::LinkId;

    #[test]
    fn error_messages() {
        insta::assert_snapshot!(
            RewriteError::SocketNotFound {
                node: NodeId(5),
                direction: SocketDirection::Input,
                name: "Seed".into(),
            }
            .to_string(),
            @"node 5 has no input socket named 'Seed'"
        );
        insta::assert_snapshot!(
            RewriteError::from(CoreError::LinkNotFound { id: LinkId(7) }).to_string(),
            @"host error: link not found: LinkId(7)"
        );
    }
}
