//! Capability traits the rewrite core uses to reach host-owned graphs.
//!
//! The core never holds graph references across a deferred boundary. It
//! keeps graph names and re-resolves them through [`GraphHost`] right before
//! mutating. [`HostGraph`] is the per-graph CRUD surface; every node and
//! link the core creates goes through it.

use crate::error::CoreError;
use crate::id::{LinkId, NodeId, SocketRef};
use crate::interface::GraphInterface;
use crate::link::LinkView;
use crate::node::{Node, NodeKind};
use crate::socket::Socket;
use crate::update::ChangeRecord;

/// Mutable access to one host graph.
pub trait HostGraph {
    /// Stable name used for re-lookup.
    fn name(&self) -> &str;

    /// Declared external interface of the graph.
    fn interface(&self) -> &GraphInterface;

    /// Mutable interface access. Existing group pseudo-nodes keep their
    /// sockets; only nodes created afterwards see the new declarations.
    fn interface_mut(&mut self) -> &mut GraphInterface;

    /// All node IDs in iteration order.
    fn node_ids(&self) -> Vec<NodeId>;

    fn node(&self, id: NodeId) -> Option<&Node>;

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// Creates a node of `kind` with the host's socket layout for that kind.
    fn add_node(&mut self, kind: NodeKind) -> NodeId;

    /// Deletes a node together with every link touching it. Nodes framed by
    /// the removed node lose their parent.
    fn remove_node(&mut self, id: NodeId) -> Result<(), CoreError>;

    /// Snapshot of all links in iteration order.
    fn links(&self) -> Vec<LinkView>;

    fn link(&self, id: LinkId) -> Option<LinkView>;

    /// Connects an output socket to an input socket. An input holds at most
    /// one incoming link; an existing one is replaced.
    fn add_link(&mut self, from: SocketRef, to: SocketRef) -> Result<LinkId, CoreError>;

    fn remove_link(&mut self, id: LinkId) -> Result<(), CoreError>;

    /// Resolves a socket address.
    fn socket(&self, at: SocketRef) -> Option<&Socket> {
        self.node(at.node)?
            .sockets(at.direction)
            .get(at.index as usize)
    }
}

/// Lookup of host graphs by stable name.
pub trait GraphHost {
    type Graph: HostGraph;

    fn graph(&self, name: &str) -> Option<&Self::Graph>;

    fn graph_mut(&mut self, name: &str) -> Option<&mut Self::Graph>;
}

/// Source of host notification batches.
pub trait UpdateSource {
    /// Returns the change records accumulated since the previous call.
    fn take_updates(&mut self) -> Vec<ChangeRecord>;
}
