//! Stable ID newtypes for graph entities.
//!
//! Node and link IDs are distinct newtype wrappers over `u32`, so a `NodeId`
//! cannot be passed where a `LinkId` is expected. Sockets have no identity of
//! their own; a [`SocketRef`] addresses one by owning node, direction and
//! position.

use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

/// Stable node identifier. Maps to a petgraph `NodeIndex<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Stable link identifier. Maps to a petgraph `EdgeIndex<u32>`.
///
/// The host may recycle the index of a removed link, so a `LinkId` held
/// across mutations must be re-checked against the expected endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u32);

/// Which side of a node a socket sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketDirection {
    Input,
    Output,
}

/// Address of one socket: owning node, side, and position in that side's
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    pub node: NodeId,
    pub direction: SocketDirection,
    pub index: u16,
}

impl SocketRef {
    pub fn input(node: NodeId, index: u16) -> Self {
        SocketRef {
            node,
            direction: SocketDirection::Input,
            index,
        }
    }

    pub fn output(node: NodeId, index: u16) -> Self {
        SocketRef {
            node,
            direction: SocketDirection::Output,
            index,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SocketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketDirection::Input => f.write_str("input"),
            SocketDirection::Output => f.write_str("output"),
        }
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} {} #{}", self.node, self.direction, self.index)
    }
}

// Bridges between our IDs and petgraph's indices.

impl From<NodeIndex<u32>> for NodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        NodeId(idx.index() as u32)
    }
}

impl From<NodeId> for NodeIndex<u32> {
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

impl From<EdgeIndex<u32>> for LinkId {
    fn from(idx: EdgeIndex<u32>) -> Self {
        LinkId(idx.index() as u32)
    }
}

impl From<LinkId> for EdgeIndex<u32> {
    fn from(id: LinkId) -> Self {
        EdgeIndex::new(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_to_node_index_roundtrip() {
        let idx = NodeIndex::<u32>::new(42);
        let node_id = NodeId::from(idx);
        assert_eq!(node_id.0, 42);

        let back: NodeIndex<u32> = node_id.into();
        assert_eq!(back.index(), 42);
    }

    #[test]
    fn link_id_to_edge_index_roundtrip() {
        let link = LinkId::from(EdgeIndex::<u32>::new(7));
        let back: EdgeIndex<u32> = link.into();
        assert_eq!(back.index(), 7);
    }

    #[test]
    fn socket_ref_display() {
        assert_eq!(SocketRef::output(NodeId(3), 1).to_string(), "node 3 output #1");
        assert_eq!(SocketRef::input(NodeId(0), 0).to_string(), "node 0 input #0");
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&SocketDirection::Input).unwrap();
        assert_eq!(json, "\"input\"");
    }
}
