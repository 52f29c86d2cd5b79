//! Width fitting for collapsed nodes.

use noderig_core::{HostGraph, NodeId};

/// Narrows collapsed nodes to their kind's minimum width and restores
/// expanded ones to the default width.
///
/// Unknown IDs are ignored. Returns how many nodes were resized.
pub fn fit_widths<G: HostGraph>(graph: &mut G, nodes: &[NodeId]) -> usize {
    let mut resized = 0;
    for &id in nodes {
        let Some(node) = graph.node(id) else {
            continue;
        };
        let target = if node.hidden {
            node.kind.min_width()
        } else {
            node.kind.default_width()
        };
        if node.width() == target {
            continue;
        }
        if let Some(node) = graph.node_mut(id) {
            node.set_width(target);
            resized += 1;
        }
    }
    resized
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderig_core::{NodeGraph, NodeKind};

    #[test]
    fn fits_collapsed_and_expanded_nodes() {
        let mut graph = NodeGraph::new("g");
        let collapsed = graph.add_node(NodeKind::RandomValue);
        let expanded = graph.add_node(NodeKind::PrincipledBsdf);
        graph.node_mut(collapsed).unwrap().hidden = true;
        graph.node_mut(expanded).unwrap().set_width(90.0);

        assert_eq!(fit_widths(&mut graph, &[collapsed, expanded, NodeId(99)]), 2);
        assert_eq!(graph.node(collapsed).unwrap().width(), 100.0);
        assert_eq!(graph.node(expanded).unwrap().width(), 240.0);

        assert_eq!(fit_widths(&mut graph, &[collapsed, expanded]), 0);
    }
}
