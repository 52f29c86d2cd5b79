//! NodeGraph: the in-memory reference implementation of [`HostGraph`].
//!
//! Nodes and links live in a private `StableGraph`; link weights record the
//! socket positions on either end. All mutations go through `NodeGraph`
//! methods so the host-maintained socket state (`linked` flags, the
//! single-incoming-link rule) stays consistent, and every mutation marks the
//! graph as changed for the next notification batch.
//!
//! Removed nodes leave holes in the index space, which `StableGraph` may
//! hand out again. The serialized [`GraphDocument`] is always compact, so
//! node IDs are renumbered on a save/load roundtrip after a removal.

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::host::HostGraph;
use crate::id::{LinkId, NodeId, SocketDirection, SocketRef};
use crate::interface::GraphInterface;
use crate::link::{Link, LinkSpec, LinkView};
use crate::node::{Node, NodeKind};

/// A named, mutable container of nodes and links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GraphDocument", try_from = "GraphDocument")]
pub struct NodeGraph {
    name: String,
    interface: GraphInterface,
    graph: StableGraph<Node, Link, Directed, u32>,
    /// Set by every mutation, cleared when the host drains its updates.
    dirty: bool,
}

impl NodeGraph {
    /// Creates an empty graph with an empty interface.
    pub fn new(name: &str) -> Self {
        NodeGraph {
            name: name.to_string(),
            interface: GraphInterface::new(),
            graph: StableGraph::new(),
            dirty: true,
        }
    }

    /// Creates an empty graph with the given interface.
    pub fn with_interface(name: &str, interface: GraphInterface) -> Self {
        NodeGraph {
            interface,
            ..Self::new(name)
        }
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Inserts a fully specified node as-is.
    ///
    /// Socket identifiers default to their names and link flags are reset;
    /// the graph owns link state.
    pub fn insert_node(&mut self, mut node: Node) -> NodeId {
        for socket in node.inputs.iter_mut().chain(node.outputs.iter_mut()) {
            if socket.identifier.is_empty() {
                socket.identifier = socket.name.clone();
            }
            socket.linked = false;
        }
        self.dirty = true;
        NodeId::from(self.graph.add_node(node))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    // -----------------------------------------------------------------------
    // Change tracking
    // -----------------------------------------------------------------------

    /// Returns `true` if the graph changed since the last drain.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears and returns the change flag.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    // -----------------------------------------------------------------------
    // Link helpers
    // -----------------------------------------------------------------------

    fn view(&self, idx: EdgeIndex<u32>) -> Option<LinkView> {
        let (source, target) = self.graph.edge_endpoints(idx)?;
        let link = self.graph.edge_weight(idx)?;
        Some(LinkView {
            id: LinkId::from(idx),
            from: SocketRef::output(NodeId::from(source), link.from_socket),
            to: SocketRef::input(NodeId::from(target), link.to_socket),
        })
    }

    fn validate_link(&self, from: SocketRef, to: SocketRef) -> Result<(), CoreError> {
        if from.direction != SocketDirection::Output {
            return Err(CoreError::InvalidLink {
                reason: format!("link source {} is not an output", from),
            });
        }
        if to.direction != SocketDirection::Input {
            return Err(CoreError::InvalidLink {
                reason: format!("link destination {} is not an input", to),
            });
        }
        if from.node == to.node {
            return Err(CoreError::InvalidLink {
                reason: format!("node {} cannot link to itself", from.node),
            });
        }
        for at in [from, to] {
            if self.graph.node_weight(at.node.into()).is_none() {
                return Err(CoreError::NodeNotFound { id: at.node });
            }
            if self.socket(at).is_none() {
                return Err(CoreError::SocketNotFound { socket: at });
            }
        }
        Ok(())
    }

    fn set_linked(&mut self, at: SocketRef, linked: bool) {
        if let Some(socket) = self
            .graph
            .node_weight_mut(at.node.into())
            .and_then(|node| node.sockets_mut(at.direction).get_mut(at.index as usize))
        {
            socket.linked = linked;
        }
    }

    /// Returns `true` if any remaining link leaves the given output.
    fn output_has_links(&self, at: SocketRef) -> bool {
        self.graph
            .edges_directed(at.node.into(), Direction::Outgoing)
            .any(|e| e.weight().from_socket == at.index)
    }
}

impl HostGraph for NodeGraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn interface(&self) -> &GraphInterface {
        &self.interface
    }

    fn interface_mut(&mut self) -> &mut GraphInterface {
        self.dirty = true;
        &mut self.interface
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_indices().map(NodeId::from).collect()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let idx: NodeIndex<u32> = id.into();
        self.graph.node_weight(idx)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let idx: NodeIndex<u32> = id.into();
        let node = self.graph.node_weight_mut(idx)?;
        self.dirty = true;
        Some(node)
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let mut node = Node::new(kind);
        match node.kind {
            NodeKind::GroupInput => node.outputs.extend(self.interface.group_input_sockets()),
            NodeKind::GroupOutput => node.inputs.extend(self.interface.group_output_sockets()),
            _ => {}
        }
        self.insert_node(node)
    }

    fn remove_node(&mut self, id: NodeId) -> Result<(), CoreError> {
        let idx: NodeIndex<u32> = id.into();
        if self.graph.node_weight(idx).is_none() {
            return Err(CoreError::NodeNotFound { id });
        }
        // Go through remove_link so the far ends get their flags updated.
        let touching: Vec<LinkId> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .chain(self.graph.edges_directed(idx, Direction::Outgoing))
            .map(|e| LinkId::from(e.id()))
            .collect();
        for link in touching {
            self.remove_link(link)?;
        }
        self.graph.remove_node(idx);
        for node in self.graph.node_weights_mut() {
            if node.parent == Some(id) {
                node.parent = None;
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn links(&self) -> Vec<LinkView> {
        self.graph
            .edge_indices()
            .filter_map(|idx| self.view(idx))
            .collect()
    }

    fn link(&self, id: LinkId) -> Option<LinkView> {
        self.view(id.into())
    }

    fn add_link(&mut self, from: SocketRef, to: SocketRef) -> Result<LinkId, CoreError> {
        self.validate_link(from, to)?;

        // An input accepts a single incoming link: drop whatever feeds it now.
        let replaced: Vec<LinkId> = self
            .graph
            .edges_directed(to.node.into(), Direction::Incoming)
            .filter(|e| e.weight().to_socket == to.index)
            .map(|e| LinkId::from(e.id()))
            .collect();
        for id in replaced {
            self.remove_link(id)?;
        }

        let idx = self.graph.add_edge(
            from.node.into(),
            to.node.into(),
            Link {
                from_socket: from.index,
                to_socket: to.index,
            },
        );
        self.set_linked(from, true);
        self.set_linked(to, true);
        self.dirty = true;
        Ok(LinkId::from(idx))
    }

    fn remove_link(&mut self, id: LinkId) -> Result<(), CoreError> {
        let view = self.view(id.into()).ok_or(CoreError::LinkNotFound { id })?;
        self.graph.remove_edge(id.into());
        self.set_linked(view.to, false);
        let still_linked = self.output_has_links(view.from);
        self.set_linked(view.from, still_linked);
        self.dirty = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// Flat, hand-editable form of a [`NodeGraph`]. Node positions in `nodes`
/// are the node IDs that `links` and `parent` fields refer to; live nodes
/// are packed in index order, skipping holes left by removals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub name: String,
    #[serde(default)]
    pub interface: GraphInterface,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

impl From<NodeGraph> for GraphDocument {
    fn from(graph: NodeGraph) -> Self {
        let position: HashMap<NodeId, NodeId> = graph
            .graph
            .node_indices()
            .enumerate()
            .map(|(pos, idx)| (NodeId::from(idx), NodeId(pos as u32)))
            .collect();
        let renumber = |at: SocketRef| SocketRef {
            node: position.get(&at.node).copied().unwrap_or(at.node),
            ..at
        };
        let links = graph
            .links()
            .into_iter()
            .map(|view| LinkSpec {
                from: renumber(view.from),
                to: renumber(view.to),
            })
            .collect();
        let nodes = graph
            .graph
            .node_indices()
            .filter_map(|idx| graph.graph.node_weight(idx).cloned())
            .map(|mut node| {
                node.parent = node.parent.and_then(|p| position.get(&p).copied());
                node
            })
            .collect();
        GraphDocument {
            name: graph.name,
            interface: graph.interface,
            nodes,
            links,
        }
    }
}

impl TryFrom<GraphDocument> for NodeGraph {
    type Error = CoreError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        let mut graph = NodeGraph::with_interface(&doc.name, doc.interface);
        let count = doc.nodes.len() as u32;
        for node in doc.nodes {
            if let Some(parent) = node.parent {
                if parent.0 >= count {
                    return Err(CoreError::NodeNotFound { id: parent });
                }
            }
            graph.insert_node(node);
        }
        for spec in doc.links {
            graph.add_link(spec.from, spec.to)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{Socket, SocketType};

    fn two_node_graph() -> (NodeGraph, NodeId, NodeId) {
        let mut graph = NodeGraph::new("g");
        let a = graph.insert_node(
            Node::new(NodeKind::Custom("Source".into()))
                .with_socket(Socket::output("Out", SocketType::Float))
                .with_socket(Socket::output("Other", SocketType::Float)),
        );
        let b = graph.insert_node(
            Node::new(NodeKind::Custom("Sink".into()))
                .with_socket(Socket::input("In", SocketType::Float)),
        );
        (graph, a, b)
    }

    #[test]
    fn add_link_sets_linked_flags() {
        let (mut graph, a, b) = two_node_graph();
        let id = graph
            .add_link(SocketRef::output(a, 0), SocketRef::input(b, 0))
            .unwrap();

        assert!(graph.socket(SocketRef::output(a, 0)).unwrap().linked);
        assert!(graph.socket(SocketRef::input(b, 0)).unwrap().linked);
        let view = graph.link(id).unwrap();
        assert_eq!(view.from, SocketRef::output(a, 0));
        assert_eq!(view.to, SocketRef::input(b, 0));
    }

    #[test]
    fn second_link_into_same_input_replaces_first() {
        let (mut graph, a, b) = two_node_graph();
        graph
            .add_link(SocketRef::output(a, 0), SocketRef::input(b, 0))
            .unwrap();
        graph
            .add_link(SocketRef::output(a, 1), SocketRef::input(b, 0))
            .unwrap();

        let links = graph.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].from, SocketRef::output(a, 1));
        assert!(!graph.socket(SocketRef::output(a, 0)).unwrap().linked);
        assert!(graph.socket(SocketRef::output(a, 1)).unwrap().linked);
    }

    #[test]
    fn remove_link_clears_flags() {
        let (mut graph, a, b) = two_node_graph();
        let id = graph
            .add_link(SocketRef::output(a, 0), SocketRef::input(b, 0))
            .unwrap();
        graph.remove_link(id).unwrap();

        assert_eq!(graph.link_count(), 0);
        assert!(!graph.socket(SocketRef::input(b, 0)).unwrap().linked);
        assert!(!graph.socket(SocketRef::output(a, 0)).unwrap().linked);
        assert!(matches!(
            graph.remove_link(id),
            Err(CoreError::LinkNotFound { .. })
        ));
    }

    #[test]
    fn rejects_backwards_and_dangling_links() {
        let (mut graph, a, b) = two_node_graph();
        assert!(matches!(
            graph.add_link(SocketRef::input(b, 0), SocketRef::output(a, 0)),
            Err(CoreError::InvalidLink { .. })
        ));
        assert!(matches!(
            graph.add_link(SocketRef::output(a, 5), SocketRef::input(b, 0)),
            Err(CoreError::SocketNotFound { .. })
        ));
        assert!(matches!(
            graph.add_link(SocketRef::output(a, 0), SocketRef::input(NodeId(9), 0)),
            Err(CoreError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn group_input_node_mirrors_interface_inputs() {
        let mut iface = GraphInterface::new();
        iface
            .add_input("Geometry", SocketType::Geometry)
            .add_input("Seed", SocketType::Int)
            .add_output("Geometry", SocketType::Geometry);
        let mut graph = NodeGraph::with_interface("g", iface);

        let input = graph.add_node(NodeKind::GroupInput);
        let output = graph.add_node(NodeKind::GroupOutput);

        let input = graph.node(input).unwrap();
        assert_eq!(input.outputs.len(), 2);
        assert_eq!(input.outputs[1].identifier, "Seed");
        assert_eq!(graph.node(output).unwrap().inputs.len(), 1);
    }

    #[test]
    fn node_mut_marks_dirty() {
        let (mut graph, a, _) = two_node_graph();
        assert!(graph.take_dirty());
        assert!(!graph.is_dirty());
        graph.node_mut(a).unwrap().label = "x".into();
        assert!(graph.is_dirty());
    }

    #[test]
    fn document_roundtrip_preserves_links() {
        let (mut graph, a, b) = two_node_graph();
        graph
            .add_link(SocketRef::output(a, 1), SocketRef::input(b, 0))
            .unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let back: NodeGraph = serde_json::from_str(&json).unwrap();

        assert_eq!(back.name(), "g");
        assert_eq!(back.node_count(), 2);
        let links = back.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].from, SocketRef::output(a, 1));
        assert!(back.socket(SocketRef::input(b, 0)).unwrap().linked);
    }

    #[test]
    fn remove_node_drops_links_and_frame_membership() {
        let (mut graph, a, b) = two_node_graph();
        let frame = graph.add_node(NodeKind::Frame);
        graph.node_mut(a).unwrap().parent = Some(frame);
        graph
            .add_link(SocketRef::output(a, 0), SocketRef::input(b, 0))
            .unwrap();

        graph.remove_node(b).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.socket(SocketRef::output(a, 0)).unwrap().linked);

        graph.remove_node(frame).unwrap();
        assert_eq!(graph.node(a).unwrap().parent, None);
        assert!(matches!(
            graph.remove_node(frame),
            Err(CoreError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn document_renumbers_nodes_after_removal() {
        let mut graph = NodeGraph::new("g");
        let doomed = graph.add_node(NodeKind::Frame);
        let frame = graph.add_node(NodeKind::Frame);
        let a = graph.insert_node(
            Node::new(NodeKind::Custom("Source".into()))
                .with_socket(Socket::output("Out", SocketType::Float))
                .with_socket(Socket::output("Other", SocketType::Float)),
        );
        let b = graph.insert_node(
            Node::new(NodeKind::Custom("Sink".into()))
                .with_socket(Socket::input("In", SocketType::Float)),
        );
        graph.node_mut(b).unwrap().parent = Some(frame);
        graph
            .add_link(SocketRef::output(a, 1), SocketRef::input(b, 0))
            .unwrap();
        graph.remove_node(doomed).unwrap();

        let doc = GraphDocument::from(graph);
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.nodes[2].parent, Some(NodeId(0)));
        assert_eq!(doc.links[0].from, SocketRef::output(NodeId(1), 1));
        assert_eq!(doc.links[0].to, SocketRef::input(NodeId(2), 0));

        let back = NodeGraph::try_from(doc).unwrap();
        assert!(back.socket(SocketRef::input(NodeId(2), 0)).unwrap().linked);
    }

    #[test]
    fn document_with_dangling_parent_is_rejected() {
        let json = r#"{
            "name": "g",
            "nodes": [{"kind": "frame", "parent": 3}]
        }"#;
        let result: Result<NodeGraph, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
