//! Change records delivered by the host after each update cycle.

use serde::{Deserialize, Serialize};

/// Kind of entity a change record names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    NodeGraph,
    Object,
    Material,
    Scene,
    World,
    Other,
}

/// One entry of a host notification batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: EntityKind,
    pub name: String,
}

impl ChangeRecord {
    pub fn new(kind: EntityKind, name: &str) -> Self {
        ChangeRecord {
            kind,
            name: name.to_string(),
        }
    }

    /// A record naming a node graph.
    pub fn graph(name: &str) -> Self {
        Self::new(EntityKind::NodeGraph, name)
    }

    pub fn is_graph(&self) -> bool {
        self.kind == EntityKind::NodeGraph
    }
}
