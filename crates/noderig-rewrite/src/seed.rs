//! Seed randomization: decorrelates seed inputs fed from the same graph
//! parameter.
//!
//! Every link from the graph's "seed" input to a node's "seed" input is
//! rerouted through a helper chain of three collapsed nodes:
//!
//! ```text
//!   [group input: seed] ──> Seed ┐
//!                                ├─ [random value] ── Value ──> original input
//!   [integer: offset]   ──> ID   ┘
//! ```
//!
//! The offset constant differs per chain, so each rerouted input draws its
//! own stream from the one upstream seed. Helper nodes carry marker labels;
//! links that already end at a marked random-value node are never
//! rerouted again, and the offsets in use are recovered by scanning the
//! marked constants.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use noderig_core::{
    names_match, GraphHost, HostGraph, LinkView, Location, Node, NodeData, NodeId, NodeKind,
    SocketDirection, SocketRef, SocketType, SocketValue,
};

use crate::error::RewriteError;
use crate::geometry;
use crate::handler::{with_graph, GraphRewriteHandler, Outcome, RewriteSummary};
use crate::offset::OffsetAllocator;

/// Label of inserted random-value nodes.
pub const RANDOM_MARKER: &str = "Auto Random Seed";
/// Label of inserted offset constants.
pub const OFFSET_MARKER: &str = "Auto Random Seed Offset";
/// Label of inserted group-input nodes.
pub const SEED_INPUT_LABEL: &str = "Seed";
/// Parameter and socket name the rewriter reacts to.
pub const SEED: &str = "seed";

/// Horizontal gap between chained helper nodes.
const GAP: f32 = 25.0;
/// Lift of the random-value node above the target socket row.
const RAISE: f32 = 15.0;
/// Vertical gap between the offset constant and the group input below it.
const STACK_GAP: f32 = 5.0;

/// Tunables of the seed rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedOptions {
    /// Lower bound of the generated integer.
    pub random_min: i64,
    /// Upper bound of the generated integer.
    pub random_max: i64,
    /// Remove the original link if the host still holds it after the
    /// helper chain took over its destination.
    pub remove_superseded_links: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        SeedOptions {
            random_min: 0,
            random_max: 1_000_000,
            remove_superseded_links: true,
        }
    }
}

/// Inserts a random-value helper chain on every seed link.
#[derive(Debug, Clone, Default)]
pub struct SeedLinkRewriter {
    options: SeedOptions,
}

impl SeedLinkRewriter {
    pub const NAME: &'static str = "Seed Randomizer";

    pub fn new(options: SeedOptions) -> Self {
        SeedLinkRewriter { options }
    }

    pub fn options(&self) -> &SeedOptions {
        &self.options
    }

    /// Returns `true` if the graph declares a "seed" input parameter.
    pub fn applies_to<G: HostGraph>(&self, graph: &G) -> bool {
        graph.interface().declares_input(SEED)
    }

    /// Returns `true` if `link` carries the graph's seed parameter into a
    /// seed input that is not already fed by a helper chain.
    pub fn should_process_link<G: HostGraph>(graph: &G, link: &LinkView) -> bool {
        let (Some(from_node), Some(from_socket)) =
            (graph.node(link.from.node), graph.socket(link.from))
        else {
            return false;
        };
        if from_node.kind != NodeKind::GroupInput || !from_socket.name_matches(SEED) {
            return false;
        }

        let (Some(to_node), Some(to_socket)) = (graph.node(link.to.node), graph.socket(link.to))
        else {
            return false;
        };
        if to_node.kind == NodeKind::RandomValue && to_node.label == RANDOM_MARKER {
            return false;
        }
        to_socket.name_matches(SEED)
    }

    /// Offsets held by helper chains already in the graph.
    pub fn existing_offsets<G: HostGraph>(graph: &G) -> BTreeSet<u32> {
        graph
            .node_ids()
            .into_iter()
            .filter_map(|id| graph.node(id))
            .filter(|node| {
                node.kind == NodeKind::IntegerConstant && node.label == OFFSET_MARKER
            })
            .filter_map(|node| node.integer())
            .filter_map(|value| u32::try_from(value).ok())
            .collect()
    }

    /// Reroutes every eligible seed link in `graph`.
    ///
    /// A link whose chain cannot be built is logged and recorded in the
    /// summary; the remaining links are still processed.
    pub fn rewrite<G: HostGraph>(&self, graph: &mut G) -> RewriteSummary {
        let mut summary = RewriteSummary::default();

        // Snapshot first: inserting chains mutates the link set.
        let pending: Vec<LinkView> = graph
            .links()
            .into_iter()
            .filter(|link| Self::should_process_link(&*graph, link))
            .collect();
        if pending.is_empty() {
            debug!(graph = graph.name(), "no seed links to reroute");
            return summary;
        }

        let mut offsets = OffsetAllocator::new(Self::existing_offsets(graph));
        for link in &pending {
            let offset = offsets.allocate();
            match self.insert_chain(graph, link, offset, &mut summary) {
                Ok(()) => {
                    info!(graph = graph.name(), offset, target = %link.to, "inserted seed chain")
                }
                Err(err) => {
                    warn!(
                        graph = graph.name(),
                        target = %link.to,
                        error = %err,
                        "skipping seed link"
                    );
                    summary.failures.push(err);
                }
            }
        }
        summary
    }

    /// Builds one helper chain. On failure every node created for it is
    /// removed again and the original link is restored, so a retry on the
    /// next notification starts from the same graph.
    fn insert_chain<G: HostGraph>(
        &self,
        graph: &mut G,
        link: &LinkView,
        offset: u32,
        summary: &mut RewriteSummary,
    ) -> Result<(), RewriteError> {
        let sockets = ChainSockets::resolve(&*graph, link)?;
        let mut created = Vec::with_capacity(3);
        let mut chain = RewriteSummary::default();
        match self.build_chain(graph, link, offset, &sockets, &mut created, &mut chain) {
            Ok(()) => {
                summary.nodes_added += chain.nodes_added;
                summary.links_added += chain.links_added;
                summary.links_removed += chain.links_removed;
                Ok(())
            }
            Err(err) => {
                roll_back(graph, link, &created);
                Err(err)
            }
        }
    }

    fn build_chain<G: HostGraph>(
        &self,
        graph: &mut G,
        link: &LinkView,
        offset: u32,
        sockets: &ChainSockets,
        created: &mut Vec<NodeId>,
        summary: &mut RewriteSummary,
    ) -> Result<(), RewriteError> {
        let target = graph
            .node(link.to.node)
            .ok_or(RewriteError::NodeNotFound { node: link.to.node })?;
        let target_socket = graph.socket(link.to).ok_or(RewriteError::SocketNotFound {
            node: link.to.node,
            direction: SocketDirection::Input,
            name: SEED.to_string(),
        })?;
        let anchor = geometry::locate(target, &target_socket.name, SocketDirection::Input);
        let target_location = target.location;
        let parent = target.parent;

        // Random value generator, right next to the target socket.
        let random = graph.add_node(NodeKind::RandomValue);
        created.push(random);
        summary.nodes_added += 1;
        let random_location = {
            let node = node_mut(graph, random)?;
            let width = node.kind.min_width();
            node.hidden = true;
            node.selected = false;
            node.set_width(width);
            node.location = match anchor {
                Some(at) => Location::new(at.x - width - GAP, at.y + RAISE),
                None => Location::new(target_location.x - width - GAP, target_location.y),
            };
            node.label = RANDOM_MARKER.to_string();
            node.data = NodeData::RandomValue {
                data_type: SocketType::Int,
            };
            node.parent = parent;
            for (name, value) in [
                ("Min", self.options.random_min),
                ("Max", self.options.random_max),
            ] {
                let index = socket_index(node, random, SocketDirection::Input, name)?;
                node.inputs[usize::from(index)].default_value = Some(SocketValue::Int(value));
            }
            node.location
        };

        // Offset constant, left of the generator.
        let constant = graph.add_node(NodeKind::IntegerConstant);
        created.push(constant);
        summary.nodes_added += 1;
        let constant_location = {
            let node = node_mut(graph, constant)?;
            let width = node.kind.min_width();
            node.hidden = true;
            node.selected = false;
            node.set_width(width);
            node.location = Location::new(random_location.x - width - GAP, random_location.y);
            node.label = OFFSET_MARKER.to_string();
            node.data = NodeData::Integer {
                value: i64::from(offset),
            };
            node.parent = parent;
            node.location
        };
        let constant_height = NodeKind::IntegerConstant.min_height();

        // Group input showing only the seed, below the constant.
        let upstream = graph.add_node(NodeKind::GroupInput);
        created.push(upstream);
        summary.nodes_added += 1;
        {
            let node = node_mut(graph, upstream)?;
            let width = node.kind.min_width();
            node.hidden = true;
            node.selected = false;
            node.set_width(width);
            node.label = SEED_INPUT_LABEL.to_string();
            for socket in node.outputs.iter_mut() {
                socket.hidden = !socket.name_matches(SEED);
            }
            node.location = Location::new(
                random_location.x - width - GAP,
                constant_location.y - constant_height - STACK_GAP,
            );
            node.parent = parent;
        }

        // The target link goes last: until it lands, the original link is
        // untouched.
        graph.add_link(
            SocketRef::output(upstream, sockets.upstream_seed),
            SocketRef::input(random, sockets.random_seed),
        )?;
        summary.links_added += 1;
        graph.add_link(
            SocketRef::output(constant, sockets.constant_out),
            SocketRef::input(random, sockets.random_id),
        )?;
        summary.links_added += 1;
        graph.add_link(SocketRef::output(random, sockets.random_value), link.to)?;
        summary.links_added += 1;

        if self.options.remove_superseded_links {
            // The ID may have been recycled; only remove the very same link.
            if let Some(current) = graph.link(link.id) {
                if current.same_endpoints(link) {
                    graph.remove_link(link.id)?;
                    summary.links_removed += 1;
                }
            }
        }
        Ok(())
    }
}

/// Socket positions a helper chain links through, resolved from the kind
/// templates and the graph interface before any node is created.
#[derive(Debug, Clone, Copy)]
struct ChainSockets {
    random_seed: u16,
    random_id: u16,
    random_value: u16,
    constant_out: u16,
    upstream_seed: u16,
}

impl ChainSockets {
    fn resolve<G: HostGraph>(graph: &G, link: &LinkView) -> Result<Self, RewriteError> {
        let upstream_seed = graph
            .interface()
            .sockets(SocketDirection::Input)
            .position(|(name, _)| names_match(name, SEED))
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| RewriteError::SocketNotFound {
                node: link.from.node,
                direction: SocketDirection::Output,
                name: SEED.to_string(),
            })?;
        Ok(ChainSockets {
            random_seed: template_index(NodeKind::RandomValue, SocketDirection::Input, "Seed")?,
            random_id: template_index(NodeKind::RandomValue, SocketDirection::Input, "ID")?,
            random_value: template_index(
                NodeKind::RandomValue,
                SocketDirection::Output,
                "Value",
            )?,
            constant_out: template_index(
                NodeKind::IntegerConstant,
                SocketDirection::Output,
                "Integer",
            )?,
            upstream_seed,
        })
    }
}

/// Position of `name` in the socket template of `kind`.
fn template_index(
    kind: NodeKind,
    direction: SocketDirection,
    name: &str,
) -> Result<u16, RewriteError> {
    let (inputs, outputs) = kind.template();
    let sockets = match direction {
        SocketDirection::Input => inputs,
        SocketDirection::Output => outputs,
    };
    sockets
        .iter()
        .position(|s| s.name_matches(name))
        .and_then(|i| u16::try_from(i).ok())
        .ok_or_else(|| RewriteError::Internal {
            reason: format!(
                "{} template has no {} socket '{}'",
                kind.type_tag(),
                direction,
                name
            ),
        })
}

/// Removes the nodes of a half-built chain and puts the original link back
/// if it went missing.
fn roll_back<G: HostGraph>(graph: &mut G, link: &LinkView, created: &[NodeId]) {
    for &id in created.iter().rev() {
        if let Err(err) = graph.remove_node(id) {
            warn!(
                graph = graph.name(),
                node = %id,
                error = %err,
                "could not remove helper node"
            );
        }
    }
    let intact = graph.links().iter().any(|current| current.same_endpoints(link));
    if !intact {
        if let Err(err) = graph.add_link(link.from, link.to) {
            warn!(
                graph = graph.name(),
                target = %link.to,
                error = %err,
                "could not restore seed link"
            );
        }
    }
}

fn node_mut<G: HostGraph>(graph: &mut G, id: NodeId) -> Result<&mut Node, RewriteError> {
    graph
        .node_mut(id)
        .ok_or(RewriteError::NodeNotFound { node: id })
}

fn socket_index(
    node: &Node,
    id: NodeId,
    direction: SocketDirection,
    name: &str,
) -> Result<u16, RewriteError> {
    node.socket_index(direction, name)
        .ok_or_else(|| RewriteError::SocketNotFound {
            node: id,
            direction,
            name: name.to_string(),
        })
}

impl<H: GraphHost> GraphRewriteHandler<H> for SeedLinkRewriter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_process_tree(&self, graph: &H::Graph) -> Result<bool, RewriteError> {
        Ok(self.applies_to(graph))
    }

    fn process_tree(&self, host: &mut H, graph_name: &str) -> Outcome {
        with_graph(host, graph_name, |graph| Ok(self.rewrite(graph)))
    }
}
