//! Links between sockets.

use serde::{Deserialize, Serialize};

use crate::id::{LinkId, SocketRef};

/// Edge weight stored in the host graph: which output of the source node
/// feeds which input of the destination node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_socket: u16,
    pub to_socket: u16,
}

/// Resolved view of a link with both endpoints spelled out.
///
/// Views are snapshots: they stay valid as values after the graph mutates,
/// but `id` may since have been recycled for a different link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkView {
    pub id: LinkId,
    pub from: SocketRef,
    pub to: SocketRef,
}

impl LinkView {
    /// Returns `true` if `other` connects the same two sockets.
    pub fn same_endpoints(&self, other: &LinkView) -> bool {
        self.from == other.from && self.to == other.to
    }
}

/// Serialized form of a link inside a graph document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: SocketRef,
    pub to: SocketRef,
}
