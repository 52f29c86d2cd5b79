//! Collapsing of group pseudo-nodes that show a single socket.

use tracing::debug;

use noderig_core::{GraphHost, HostGraph, Node, NodeKind};

use crate::error::RewriteError;
use crate::handler::{with_graph, GraphRewriteHandler, Outcome, RewriteSummary};

/// Collapses group input/output nodes with exactly one visible socket and
/// labels them after that socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSocketCollapser;

impl SingleSocketCollapser {
    pub const NAME: &'static str = "Single Socket Handler";

    /// Collapses every qualifying node in `graph`.
    ///
    /// Nodes already in the collapsed, labelled state are left alone, so a
    /// second pass changes nothing.
    pub fn collapse<G: HostGraph>(graph: &mut G) -> RewriteSummary {
        let mut summary = RewriteSummary::default();
        for id in graph.node_ids() {
            let Some(label) = graph.node(id).and_then(collapse_label) else {
                continue;
            };
            debug!(
                graph = graph.name(),
                node = %id,
                label = %label,
                "collapsing single-socket node"
            );
            if let Some(node) = graph.node_mut(id) {
                node.label = label;
                node.hidden = true;
                summary.nodes_changed += 1;
            }
        }
        summary
    }
}

/// The label a node should get, or `None` if it needs no change.
fn collapse_label(node: &Node) -> Option<String> {
    let sockets = match node.kind {
        NodeKind::GroupInput => &node.outputs,
        NodeKind::GroupOutput => &node.inputs,
        _ => return None,
    };
    let mut visible = sockets.iter().filter(|s| s.is_visible());
    let only = visible.next()?;
    if visible.next().is_some() {
        return None;
    }
    if node.label != only.name || !node.hidden {
        Some(only.name.clone())
    } else {
        None
    }
}

impl<H: GraphHost> GraphRewriteHandler<H> for SingleSocketCollapser {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_process_tree(&self, _graph: &H::Graph) -> Result<bool, RewriteError> {
        Ok(true)
    }

    fn process_tree(&self, host: &mut H, graph_name: &str) -> Outcome {
        with_graph(host, graph_name, |graph| Ok(Self::collapse(graph)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderig_core::{GraphInterface, InMemoryHost, NodeGraph, NodeId, SocketType, UpdateSource};

    fn graph_with(inputs: &[&str], outputs: &[&str]) -> (NodeGraph, NodeId, NodeId) {
        let mut iface = GraphInterface::new();
        for name in inputs {
            iface.add_input(name, SocketType::Float);
        }
        for name in outputs {
            iface.add_output(name, SocketType::Float);
        }
        let mut graph = NodeGraph::with_interface("Shading", iface);
        let input = graph.add_node(NodeKind::GroupInput);
        let output = graph.add_node(NodeKind::GroupOutput);
        (graph, input, output)
    }

    #[test]
    fn lone_socket_collapses_and_labels() {
        let (mut graph, input, _) = graph_with(&["Factor"], &["Result", "Mask"]);
        let summary = SingleSocketCollapser::collapse(&mut graph);

        assert_eq!(summary.nodes_changed, 1);
        let node = graph.node(input).unwrap();
        assert_eq!(node.label, "Factor");
        assert!(node.hidden);
    }

    #[test]
    fn two_visible_sockets_are_left_alone() {
        let (mut graph, input, output) = graph_with(&["A", "B"], &["Result", "Mask"]);
        let summary = SingleSocketCollapser::collapse(&mut graph);

        assert!(summary.is_noop());
        assert_eq!(graph.node(input).unwrap().label, "");
        assert!(!graph.node(output).unwrap().hidden);
    }

    #[test]
    fn hidden_sockets_do_not_count() {
        let (mut graph, _, output) = graph_with(&["A"], &["Result", "Mask"]);
        graph.node_mut(output).unwrap().inputs[1].hidden = true;

        SingleSocketCollapser::collapse(&mut graph);
        let node = graph.node(output).unwrap();
        assert_eq!(node.label, "Result");
        assert!(node.hidden);
    }

    #[test]
    fn collapsed_graph_stays_clean_on_rerun() {
        let (graph, _, _) = graph_with(&["Factor"], &["Result"]);
        let mut host = InMemoryHost::new();
        host.add_graph(graph).unwrap();
        let graph = host.graph_mut("Shading").unwrap();
        assert_eq!(SingleSocketCollapser::collapse(graph).nodes_changed, 2);

        host.take_updates();
        let graph = host.graph_mut("Shading").unwrap();
        assert!(SingleSocketCollapser::collapse(graph).is_noop());
        assert!(!host.has_updates());
    }

    #[test]
    fn relabels_collapsed_node_with_stale_label() {
        let (mut graph, input, _) = graph_with(&["Factor"], &["A", "B"]);
        {
            let node = graph.node_mut(input).unwrap();
            node.hidden = true;
            node.label = "Old".into();
        }
        assert_eq!(SingleSocketCollapser::collapse(&mut graph).nodes_changed, 1);
        assert_eq!(graph.node(input).unwrap().label, "Factor");
    }

    #[test]
    fn other_node_kinds_are_ignored() {
        let mut graph = NodeGraph::new("g");
        let constant = graph.add_node(NodeKind::IntegerConstant);
        assert!(SingleSocketCollapser::collapse(&mut graph).is_noop());
        assert!(!graph.node(constant).unwrap().hidden);
    }

    #[test]
    fn handler_reports_missing_graph() {
        let mut host = InMemoryHost::new();
        let outcome = GraphRewriteHandler::<InMemoryHost>::process_tree(
            &SingleSocketCollapser,
            &mut host,
            "Shading",
        );
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }
}
