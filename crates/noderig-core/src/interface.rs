//! A graph's declared external interface.
//!
//! The interface is an ordered list of socket declarations grouped by
//! optional panels. A panel holds the sockets that follow it, up to the
//! next panel; sockets before the first panel sit at the root. Group
//! pseudo-nodes derive their sockets from it.

use serde::{Deserialize, Serialize};

use crate::id::SocketDirection;
use crate::socket::{names_match, Socket, SocketType};

/// One entry of a graph interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum InterfaceItem {
    /// A declared parameter. `in_out` is `Input` for graph inputs.
    Socket {
        name: String,
        in_out: SocketDirection,
        #[serde(default)]
        socket_type: SocketType,
    },
    /// A purely organizational panel.
    Panel { name: String },
}

/// Ordered interface description of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphInterface {
    #[serde(default)]
    pub items: Vec<InterfaceItem>,
}

impl GraphInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a graph input declaration.
    pub fn add_input(&mut self, name: &str, socket_type: SocketType) -> &mut Self {
        self.items.push(InterfaceItem::Socket {
            name: name.to_string(),
            in_out: SocketDirection::Input,
            socket_type,
        });
        self
    }

    /// Appends a graph output declaration.
    pub fn add_output(&mut self, name: &str, socket_type: SocketType) -> &mut Self {
        self.items.push(InterfaceItem::Socket {
            name: name.to_string(),
            in_out: SocketDirection::Output,
            socket_type,
        });
        self
    }

    pub fn add_panel(&mut self, name: &str) -> &mut Self {
        self.items.push(InterfaceItem::Panel {
            name: name.to_string(),
        });
        self
    }

    /// Socket declarations on one side, in declaration order.
    pub fn sockets(
        &self,
        in_out: SocketDirection,
    ) -> impl Iterator<Item = (&str, SocketType)> + '_ {
        self.items.iter().filter_map(move |item| match item {
            InterfaceItem::Socket {
                name,
                in_out: dir,
                socket_type,
            } if *dir == in_out => Some((name.as_str(), *socket_type)),
            _ => None,
        })
    }

    /// Returns `true` if a graph input named `name` is declared, comparing
    /// case-insensitively after trimming.
    pub fn declares_input(&self, name: &str) -> bool {
        self.sockets(SocketDirection::Input)
            .any(|(declared, _)| names_match(declared, name))
    }

    /// Output sockets of a group-input node for this interface.
    pub(crate) fn group_input_sockets(&self) -> Vec<Socket> {
        self.sockets(SocketDirection::Input)
            .map(|(name, ty)| Socket::output(name, ty))
            .collect()
    }

    /// Input sockets of a group-output node for this interface.
    pub(crate) fn group_output_sockets(&self) -> Vec<Socket> {
        self.sockets(SocketDirection::Output)
            .map(|(name, ty)| Socket::input(name, ty))
            .collect()
    }
}
