//! In-memory implementation of [`GraphHost`] and [`UpdateSource`].
//!
//! [`InMemoryHost`] stands in for the real editor in tests and in the CLI:
//! it owns a set of [`NodeGraph`]s keyed by name and turns their change
//! flags into notification batches, the same shape the editor delivers
//! after each update cycle.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::NodeGraph;
use crate::host::{GraphHost, HostGraph, UpdateSource};
use crate::update::ChangeRecord;

/// A set of named graphs plus a queue of externally injected change records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "HostDocument", try_from = "HostDocument")]
pub struct InMemoryHost {
    graphs: IndexMap<String, NodeGraph>,
    external: Vec<ChangeRecord>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a graph. Fails if the name is taken.
    pub fn add_graph(&mut self, graph: NodeGraph) -> Result<(), CoreError> {
        let name = graph.name().to_string();
        if self.graphs.contains_key(&name) {
            return Err(CoreError::DuplicateGraph { name });
        }
        self.graphs.insert(name, graph);
        Ok(())
    }

    /// Deletes a graph, returning it if it existed.
    pub fn remove_graph(&mut self, name: &str) -> Option<NodeGraph> {
        self.graphs.shift_remove(name)
    }

    pub fn graph_names(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &NodeGraph> {
        self.graphs.values()
    }

    /// Queues a change record that did not come from a graph mutation,
    /// e.g. an object or material edit.
    pub fn push_update(&mut self, record: ChangeRecord) {
        self.external.push(record);
    }

    /// Returns `true` if a call to `take_updates` would yield records.
    pub fn has_updates(&self) -> bool {
        !self.external.is_empty() || self.graphs.values().any(NodeGraph::is_dirty)
    }
}

impl GraphHost for InMemoryHost {
    type Graph = NodeGraph;

    fn graph(&self, name: &str) -> Option<&NodeGraph> {
        self.graphs.get(name)
    }

    fn graph_mut(&mut self, name: &str) -> Option<&mut NodeGraph> {
        self.graphs.get_mut(name)
    }
}

impl UpdateSource for InMemoryHost {
    fn take_updates(&mut self) -> Vec<ChangeRecord> {
        let mut batch: Vec<ChangeRecord> = self
            .graphs
            .values_mut()
            .filter_map(|graph| graph.take_dirty().then(|| ChangeRecord::graph(graph.name())))
            .collect();
        batch.append(&mut self.external);
        batch
    }
}

/// Serialized form of an [`InMemoryHost`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDocument {
    pub graphs: Vec<NodeGraph>,
}

impl From<InMemoryHost> for HostDocument {
    fn from(host: InMemoryHost) -> Self {
        HostDocument {
            graphs: host.graphs.into_values().collect(),
        }
    }
}

impl TryFrom<HostDocument> for InMemoryHost {
    type Error = CoreError;

    fn try_from(doc: HostDocument) -> Result<Self, Self::Error> {
        let mut host = InMemoryHost::new();
        for graph in doc.graphs {
            host.add_graph(graph)?;
        }
        Ok(host)
    }
}
