//! The pluggable rewrite-handler capability.
//!
//! A handler answers two questions about a graph: should it be touched at
//! all, and (later, from the deferred queue) what does touching it do. The
//! dispatcher only ever sees handlers through [`GraphRewriteHandler`], so a
//! new strategy plugs in without changes to dispatch.

use std::fmt;

use noderig_core::GraphHost;

use crate::error::RewriteError;

/// A rewrite strategy applied to changed graphs.
pub trait GraphRewriteHandler<H: GraphHost> {
    /// Identity used for logging, settings and task bookkeeping.
    fn name(&self) -> &str;

    /// Cheap eligibility test run while the host is delivering
    /// notifications. Must not mutate anything.
    fn should_process_tree(&self, graph: &H::Graph) -> Result<bool, RewriteError>;

    /// Re-resolves `graph_name` and rewrites it. Runs from the deferred
    /// queue, never inline with notification delivery.
    fn process_tree(&self, host: &mut H, graph_name: &str) -> Outcome;
}

/// Counts of what one `process_tree` call changed.
#[derive(Debug, Default)]
pub struct RewriteSummary {
    pub nodes_added: usize,
    pub nodes_changed: usize,
    pub links_added: usize,
    pub links_removed: usize,
    /// Graph interface entries that were rewritten, added or dropped.
    pub interface_items_changed: usize,
    /// Units (links, nodes) that were skipped after a local failure.
    pub failures: Vec<RewriteError>,
}

impl RewriteSummary {
    /// Returns `true` if the pass left the graph untouched.
    pub fn is_noop(&self) -> bool {
        self.nodes_added == 0
            && self.nodes_changed == 0
            && self.links_added == 0
            && self.links_removed == 0
            && self.interface_items_changed == 0
    }
}

/// Why a rewrite did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The graph was deleted before the deferred call ran.
    GraphNotFound { graph: String },
    /// The handler was unregistered before the deferred call ran.
    HandlerUnavailable { handler: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::GraphNotFound { graph } => write!(f, "graph '{}' no longer exists", graph),
            SkipReason::HandlerUnavailable { handler } => {
                write!(f, "handler '{}' is no longer registered", handler)
            }
        }
    }
}

/// Result of one deferred rewrite.
#[derive(Debug)]
pub enum Outcome {
    Applied(RewriteSummary),
    /// Benign: nothing to do, not an error.
    Skipped(SkipReason),
    Failed(RewriteError),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn summary(&self) -> Option<&RewriteSummary> {
        match self {
            Outcome::Applied(summary) => Some(summary),
            _ => None,
        }
    }

    /// Returns `true` if the rewrite mutated the graph.
    pub fn changed_graph(&self) -> bool {
        self.summary().is_some_and(|s| !s.is_noop())
    }
}

/// Resolves `graph_name` and runs `rewrite` on it.
///
/// A missing graph becomes [`Outcome::Skipped`]; an error returned by
/// `rewrite` becomes [`Outcome::Failed`].
pub fn with_graph<H, F>(host: &mut H, graph_name: &str, rewrite: F) -> Outcome
where
    H: GraphHost,
    F: FnOnce(&mut H::Graph) -> Result<RewriteSummary, RewriteError>,
{
    let Some(graph) = host.graph_mut(graph_name) else {
        return Outcome::Skipped(SkipReason::GraphNotFound {
            graph: graph_name.to_string(),
        });
    };
    match rewrite(graph) {
        Ok(summary) => Outcome::Applied(summary),
        Err(err) => Outcome::Failed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderig_core::{HostGraph, InMemoryHost, NodeGraph, NodeKind};

    #[test]
    fn missing_graph_is_skipped() {
        let mut host = InMemoryHost::new();
        let outcome = with_graph(&mut host, "gone", |_| Ok(RewriteSummary::default()));
        match outcome {
            Outcome::Skipped(reason) => {
                assert_eq!(reason.to_string(), "graph 'gone' no longer exists")
            }
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn rewrite_error_becomes_failure() {
        let mut host = InMemoryHost::new();
        host.add_graph(NodeGraph::new("g")).unwrap();
        let outcome = with_graph(&mut host, "g", |_| {
            Err(RewriteError::Internal {
                reason: "boom".into(),
            })
        });
        assert!(outcome.is_failed());
        assert!(!outcome.changed_graph());
    }

    #[test]
    fn applied_summary_reports_change() {
        let mut host = InMemoryHost::new();
        host.add_graph(NodeGraph::new("g")).unwrap();
        let outcome = with_graph(&mut host, "g", |graph| {
            graph.add_node(NodeKind::Frame);
            Ok(RewriteSummary {
                nodes_added: 1,
                ..Default::default()
            })
        });
        assert!(outcome.changed_graph());
        assert_eq!(host.graph("g").unwrap().node_count(), 1);
    }
}
