//! Host-side data model for node-graph rewriting.
//!
//! The editor owns every graph; this crate describes what the rewrite core
//! can see of them ([`Node`], [`Socket`], [`LinkView`], [`GraphInterface`])
//! and the capability traits it reaches them through ([`HostGraph`],
//! [`GraphHost`], [`UpdateSource`]). [`NodeGraph`] and [`InMemoryHost`] are
//! the in-memory reference host used by tests and the CLI.

pub mod error;
pub mod graph;
pub mod host;
pub mod id;
pub mod interface;
pub mod link;
pub mod memory;
pub mod node;
pub mod socket;
pub mod update;

// Re-export commonly used types
pub use error::CoreError;
pub use graph::{GraphDocument, NodeGraph};
pub use host::{GraphHost, HostGraph, UpdateSource};
pub use id::{LinkId, NodeId, SocketDirection, SocketRef};
pub use interface::{GraphInterface, InterfaceItem};
pub use link::{Link, LinkSpec, LinkView};
pub use memory::{HostDocument, InMemoryHost};
pub use node::{Dimensions, Location, Node, NodeData, NodeKind, SocketList};
pub use socket::{names_match, Socket, SocketType, SocketValue};
pub use update::{ChangeRecord, EntityKind};
