//! Sockets: the named, typed ports on a node.

use serde::{Deserialize, Serialize};

use crate::id::SocketDirection;

/// Value type carried by a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SocketType {
    #[default]
    Float,
    Int,
    Bool,
    Vector,
    Rotation,
    Color,
    String,
    Menu,
    Geometry,
    Shader,
    Object,
}

impl SocketType {
    /// Vector sockets draw an expanded three-row value editor when unlinked.
    pub fn is_vector(self) -> bool {
        matches!(self, SocketType::Vector)
    }
}

/// Literal value stored on an unlinked input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SocketValue {
    Int(i64),
    Float(f32),
    Bool(bool),
    Vector([f32; 3]),
}

/// A port on a node.
///
/// `linked` is maintained by the host whenever links are added or removed;
/// the core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub name: String,
    /// Stable identifier; defaults to the name.
    #[serde(default)]
    pub identifier: String,
    pub direction: SocketDirection,
    #[serde(default)]
    pub socket_type: SocketType,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Suppresses the inline value editor.
    #[serde(default)]
    pub hide_value: bool,
    #[serde(default)]
    pub linked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SocketValue>,
}

fn enabled_by_default() -> bool {
    true
}

impl Socket {
    pub fn new(name: &str, direction: SocketDirection, socket_type: SocketType) -> Self {
        Socket {
            name: name.to_string(),
            identifier: name.to_string(),
            direction,
            socket_type,
            hidden: false,
            enabled: true,
            hide_value: false,
            linked: false,
            default_value: None,
        }
    }

    pub fn input(name: &str, socket_type: SocketType) -> Self {
        Self::new(name, SocketDirection::Input, socket_type)
    }

    pub fn output(name: &str, socket_type: SocketType) -> Self {
        Self::new(name, SocketDirection::Output, socket_type)
    }

    /// Builder-style setter for the default value.
    pub fn with_default(mut self, value: SocketValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Builder-style setter for the hidden flag.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// A socket is drawn only when it is neither hidden nor disabled.
    pub fn is_visible(&self) -> bool {
        !self.hidden && self.enabled
    }

    /// Case-insensitive, whitespace-trimmed name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Compares two socket or parameter names ignoring case and surrounding
/// whitespace.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
