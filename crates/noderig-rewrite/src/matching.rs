//! Group interface matching.
//!
//! A group node is often fed straight from its parent graph's group input.
//! [`match_group_interface`] makes the instanced graph's interface mirror
//! the parent's for those inputs: each fed input takes the name and type of
//! the parent parameter feeding it, the fed inputs follow the parent's
//! order, and the parent panels around them are recreated.
//!
//! Everything else in the instanced interface keeps its relative order
//! after the mirrored part. A panel emptied by the move is dropped, and a
//! panel named like a mirrored one is merged into it. Matching its own
//! output again changes nothing.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use noderig_core::{
    GraphHost, GraphInterface, HostGraph, InterfaceItem, NodeId, NodeKind, SocketDirection,
    SocketRef, SocketType,
};

use crate::error::RewriteError;
use crate::handler::RewriteSummary;

/// A parent interface input with the panel it sits in.
#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    socket_type: SocketType,
    /// Item position and name of the enclosing panel.
    panel: Option<(usize, String)>,
}

/// One group node input fed from a parent parameter.
#[derive(Debug, Clone)]
struct FedInput {
    /// Group node socket the link ends at.
    at: SocketRef,
    /// Name of that socket, which is also the instanced declaration's name.
    target: String,
    /// Position of the feeding declaration among the parent inputs.
    order: usize,
    source: Declaration,
}

impl FedInput {
    fn declaration(&self) -> InterfaceItem {
        InterfaceItem::Socket {
            name: self.source.name.clone(),
            in_out: SocketDirection::Input,
            socket_type: self.source.socket_type,
        }
    }
}

/// Rewrites the interface of the graph instanced by `group` (a node of
/// `graph_name`) to mirror the parent inputs feeding it.
///
/// The group node's fed sockets are renamed and retyped to match; their
/// positions, and therefore the links, stay as they are.
pub fn match_group_interface<H: GraphHost>(
    host: &mut H,
    graph_name: &str,
    group: NodeId,
) -> Result<RewriteSummary, RewriteError> {
    let mut summary = RewriteSummary::default();
    let parent = host
        .graph(graph_name)
        .ok_or_else(|| RewriteError::GraphNotFound {
            graph: graph_name.to_string(),
        })?;
    let node = parent
        .node(group)
        .ok_or(RewriteError::NodeNotFound { node: group })?;
    let NodeKind::Group(tree) = &node.kind else {
        return Err(RewriteError::NotAGroup { node: group });
    };
    let tree = tree.clone();
    let fed = fed_inputs(parent, group);
    if fed.is_empty() {
        debug!(graph = graph_name, node = %group, "no group inputs fed from the parent");
        return Ok(summary);
    }

    let inner = host
        .graph_mut(&tree)
        .ok_or_else(|| RewriteError::GraphNotFound {
            graph: tree.clone(),
        })?;
    let (fed, stale): (Vec<FedInput>, Vec<FedInput>) = {
        let declared: HashSet<&str> = inner
            .interface()
            .sockets(SocketDirection::Input)
            .map(|(name, _)| name)
            .collect();
        fed.into_iter()
            .partition(|f| declared.contains(f.target.as_str()))
    };
    for f in &stale {
        warn!(graph = %tree, input = %f.target, "group socket has no matching declaration");
    }

    let items = mirrored_items(inner.interface(), &fed);
    let changed = count_changed(&inner.interface().items, &items);
    if changed > 0 {
        inner.interface_mut().items = items;
        summary.interface_items_changed = changed;
    }

    let parent = host
        .graph_mut(graph_name)
        .ok_or_else(|| RewriteError::GraphNotFound {
            graph: graph_name.to_string(),
        })?;
    let outdated: Vec<&FedInput> = fed
        .iter()
        .filter(|f| {
            parent.socket(f.at).is_some_and(|socket| {
                socket.name != f.source.name || socket.socket_type != f.source.socket_type
            })
        })
        .collect();
    if !outdated.is_empty() {
        let node = parent
            .node_mut(group)
            .ok_or(RewriteError::NodeNotFound { node: group })?;
        for f in outdated {
            if let Some(socket) = node.inputs.get_mut(usize::from(f.at.index)) {
                socket.name = f.source.name.clone();
                socket.socket_type = f.source.socket_type;
            }
        }
        summary.nodes_changed += 1;
    }

    if !summary.is_noop() {
        info!(
            graph = graph_name,
            instanced = %tree,
            inputs = fed.len(),
            "matched group interface"
        );
    }
    Ok(summary)
}

/// Input declarations of `interface` in order, with their panels.
fn input_declarations(interface: &GraphInterface) -> Vec<Declaration> {
    let mut panel = None;
    let mut declarations = Vec::new();
    for (pos, item) in interface.items.iter().enumerate() {
        match item {
            InterfaceItem::Panel { name } => panel = Some((pos, name.clone())),
            InterfaceItem::Socket {
                name,
                in_out: SocketDirection::Input,
                socket_type,
            } => declarations.push(Declaration {
                name: name.clone(),
                socket_type: *socket_type,
                panel: panel.clone(),
            }),
            InterfaceItem::Socket { .. } => {}
        }
    }
    declarations
}

/// Group node inputs linked from the parent's group input, in parent order.
fn fed_inputs<G: HostGraph>(graph: &G, group: NodeId) -> Vec<FedInput> {
    let declarations = input_declarations(graph.interface());
    let mut fed: Vec<FedInput> = graph
        .links()
        .into_iter()
        .filter(|link| link.to.node == group)
        .filter(|link| {
            graph
                .node(link.from.node)
                .is_some_and(|n| n.kind == NodeKind::GroupInput)
        })
        .filter_map(|link| {
            let from = graph.socket(link.from)?;
            let to = graph.socket(link.to)?;
            let (order, source) = declarations
                .iter()
                .enumerate()
                .find(|(_, d)| d.name == from.name)?;
            Some(FedInput {
                at: link.to,
                target: to.name.clone(),
                order,
                source: source.clone(),
            })
        })
        .collect();
    fed.sort_by_key(|f| (f.order, f.at.index));
    fed
}

/// A panel of the instanced interface with the items that stay in it.
struct Section {
    name: String,
    kept: Vec<InterfaceItem>,
    emptied: bool,
}

/// The instanced interface after moving the fed inputs into parent order.
fn mirrored_items(interface: &GraphInterface, fed: &[FedInput]) -> Vec<InterfaceItem> {
    let moved: HashSet<&str> = fed.iter().map(|f| f.target.as_str()).collect();

    let mut root = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    for item in &interface.items {
        let is_moved = match item {
            InterfaceItem::Panel { name } => {
                sections.push(Section {
                    name: name.clone(),
                    kept: Vec::new(),
                    emptied: false,
                });
                continue;
            }
            InterfaceItem::Socket { name, in_out, .. } => {
                *in_out == SocketDirection::Input && moved.contains(name.as_str())
            }
        };
        match sections.last_mut() {
            Some(section) if is_moved => section.emptied = true,
            Some(section) => section.kept.push(item.clone()),
            None if is_moved => {}
            None => root.push(item.clone()),
        }
    }

    let mut items: Vec<InterfaceItem> = fed
        .iter()
        .filter(|f| f.source.panel.is_none())
        .map(FedInput::declaration)
        .collect();
    items.extend(root);

    // Panel members are contiguous in the parent, so `fed` visits each
    // parent panel in one run.
    let mut current = None;
    for f in fed {
        let Some((pos, name)) = &f.source.panel else {
            continue;
        };
        if current != Some(*pos) {
            close_panel(&mut items, &mut sections, current.is_some());
            items.push(InterfaceItem::Panel { name: name.clone() });
            current = Some(*pos);
        }
        items.push(f.declaration());
    }
    close_panel(&mut items, &mut sections, current.is_some());

    for section in sections {
        if section.emptied && section.kept.is_empty() {
            continue;
        }
        items.push(InterfaceItem::Panel { name: section.name });
        items.extend(section.kept);
    }
    items
}

/// Appends the leftovers of an instanced panel named like the mirrored
/// panel that was just written, if any.
fn close_panel(items: &mut Vec<InterfaceItem>, sections: &mut Vec<Section>, open: bool) {
    if !open {
        return;
    }
    let Some(InterfaceItem::Panel { name }) = items
        .iter()
        .rev()
        .find(|item| matches!(item, InterfaceItem::Panel { .. }))
    else {
        return;
    };
    if let Some(pos) = sections.iter().position(|s| &s.name == name) {
        let section = sections.remove(pos);
        items.extend(section.kept);
    }
}

/// Number of positions at which two item lists differ.
fn count_changed(before: &[InterfaceItem], after: &[InterfaceItem]) -> usize {
    (0..before.len().max(after.len()))
        .filter(|&i| before.get(i) != after.get(i))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderig_core::{InMemoryHost, Node, NodeGraph, Socket};

    /// Parent "Scatter" feeding two inputs of a "Noise" group node.
    fn host_with(inner: GraphInterface) -> (InMemoryHost, NodeId) {
        let mut outer = GraphInterface::new();
        outer
            .add_input("Geometry", SocketType::Geometry)
            .add_panel("Randomness")
            .add_input("Seed", SocketType::Int)
            .add_panel("Shape")
            .add_input("Size", SocketType::Float);
        let mut parent = NodeGraph::with_interface("Scatter", outer);
        let input = parent.add_node(NodeKind::GroupInput);

        let mut node = Node::new(NodeKind::Group("Noise".into()));
        for (name, socket_type) in inner.sockets(SocketDirection::Input) {
            node = node.with_socket(Socket::input(name, socket_type));
        }
        let group = parent.insert_node(node);
        let seed = parent.node(group).unwrap().socket_index(SocketDirection::Input, "Seed");
        let scale = parent.node(group).unwrap().socket_index(SocketDirection::Input, "Scale");
        parent
            .add_link(SocketRef::output(input, 1), SocketRef::input(group, seed.unwrap()))
            .unwrap();
        parent
            .add_link(SocketRef::output(input, 2), SocketRef::input(group, scale.unwrap()))
            .unwrap();

        let mut host = InMemoryHost::new();
        host.add_graph(parent).unwrap();
        host.add_graph(NodeGraph::with_interface("Noise", inner)).unwrap();
        (host, group)
    }

    fn noise_interface() -> GraphInterface {
        let mut iface = GraphInterface::new();
        iface
            .add_input("Scale", SocketType::Float)
            .add_input("Seed", SocketType::Int)
            .add_input("Detail", SocketType::Float)
            .add_output("Value", SocketType::Float);
        iface
    }

    fn socket(name: &str, in_out: SocketDirection, socket_type: SocketType) -> InterfaceItem {
        InterfaceItem::Socket {
            name: name.into(),
            in_out,
            socket_type,
        }
    }

    fn panel(name: &str) -> InterfaceItem {
        InterfaceItem::Panel { name: name.into() }
    }

    fn items(host: &InMemoryHost, name: &str) -> Vec<InterfaceItem> {
        host.graph(name).unwrap().interface().items.clone()
    }

    #[test]
    fn fed_inputs_follow_parent_order_and_panels() {
        let (mut host, group) = host_with(noise_interface());
        let summary = match_group_interface(&mut host, "Scatter", group).unwrap();
        assert_eq!(summary.nodes_changed, 1);
        assert!(summary.interface_items_changed > 0);

        use SocketDirection::{Input, Output};
        assert_eq!(
            items(&host, "Noise"),
            vec![
                socket("Detail", Input, SocketType::Float),
                socket("Value", Output, SocketType::Float),
                panel("Randomness"),
                socket("Seed", Input, SocketType::Int),
                panel("Shape"),
                socket("Size", Input, SocketType::Float),
            ]
        );

        // Renamed in place: the link into the old "Scale" slot still holds.
        let parent = host.graph("Scatter").unwrap();
        let node = parent.node(group).unwrap();
        assert_eq!(node.inputs[0].name, "Size");
        assert!(node.inputs[0].linked);
        assert_eq!(node.inputs[1].name, "Seed");
    }

    #[test]
    fn matching_twice_is_a_noop() {
        let (mut host, group) = host_with(noise_interface());
        match_group_interface(&mut host, "Scatter", group).unwrap();
        let first = items(&host, "Noise");

        let summary = match_group_interface(&mut host, "Scatter", group).unwrap();
        assert!(summary.is_noop());
        assert_eq!(items(&host, "Noise"), first);
    }

    #[test]
    fn emptied_panel_is_dropped_and_namesake_is_merged() {
        let mut inner = GraphInterface::new();
        inner
            .add_input("Scale", SocketType::Float)
            .add_panel("Legacy")
            .add_input("Seed", SocketType::Int)
            .add_panel("Shape")
            .add_input("Roughness", SocketType::Float);
        let (mut host, group) = host_with(inner);
        match_group_interface(&mut host, "Scatter", group).unwrap();

        use SocketDirection::Input;
        assert_eq!(
            items(&host, "Noise"),
            vec![
                panel("Randomness"),
                socket("Seed", Input, SocketType::Int),
                panel("Shape"),
                socket("Size", Input, SocketType::Float),
                socket("Roughness", Input, SocketType::Float),
            ]
        );
    }

    #[test]
    fn unfed_group_is_left_alone() {
        let (mut host, group) = host_with(noise_interface());
        let links: Vec<_> = host.graph("Scatter").unwrap().links();
        let parent = host.graph_mut("Scatter").unwrap();
        for link in links {
            parent.remove_link(link.id).unwrap();
        }

        let summary = match_group_interface(&mut host, "Scatter", group).unwrap();
        assert!(summary.is_noop());
        assert_eq!(items(&host, "Noise"), noise_interface().items);
    }

    #[test]
    fn rejects_plain_nodes_and_missing_graphs() {
        let (mut host, group) = host_with(noise_interface());
        let frame = host
            .graph_mut("Scatter")
            .unwrap()
            .add_node(NodeKind::Frame);
        assert!(matches!(
            match_group_interface(&mut host, "Scatter", frame),
            Err(RewriteError::NotAGroup { .. })
        ));
        assert!(matches!(
            match_group_interface(&mut host, "Trees", group),
            Err(RewriteError::GraphNotFound { .. })
        ));

        host.remove_graph("Noise");
        assert!(matches!(
            match_group_interface(&mut host, "Scatter", group),
            Err(RewriteError::GraphNotFound { graph }) if graph == "Noise"
        ));
    }
}
