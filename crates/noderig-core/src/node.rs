//! Nodes and their kind-specific templates.
//!
//! A [`Node`] carries everything the rewrite handlers read or write: its
//! kind, label, placement, visibility, frame parent and ordered sockets.
//! Socket templates for the helper kinds mirror what the host creates when
//! asked for a node of that type.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::{NodeId, SocketDirection};
use crate::socket::{Socket, SocketType, SocketValue};

/// Ordered socket list. Most nodes have only a handful of sockets per side.
pub type SocketList = SmallVec<[Socket; 4]>;

/// Host node type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Pseudo-node exposing the graph's declared inputs as output sockets.
    GroupInput,
    /// Pseudo-node exposing the graph's declared outputs as input sockets.
    GroupOutput,
    RandomValue,
    IntegerConstant,
    Frame,
    PrincipledBsdf,
    /// Instance of another graph, referenced by its stable name. Its
    /// sockets follow that graph's interface and are kept by the host.
    Group(String),
    /// Any other host node type, identified by its type tag.
    Custom(String),
}

impl NodeKind {
    /// The host's type tag for this kind.
    pub fn type_tag(&self) -> &str {
        match self {
            NodeKind::GroupInput => "NodeGroupInput",
            NodeKind::GroupOutput => "NodeGroupOutput",
            NodeKind::RandomValue => "FunctionNodeRandomValue",
            NodeKind::IntegerConstant => "FunctionNodeInputInt",
            NodeKind::Frame => "NodeFrame",
            NodeKind::PrincipledBsdf => "ShaderNodeBsdfPrincipled",
            NodeKind::Group(_) => "GeometryNodeGroup",
            NodeKind::Custom(tag) => tag,
        }
    }

    /// Returns `true` for graph-input and graph-output pseudo-nodes.
    pub fn is_group_io(&self) -> bool {
        matches!(self, NodeKind::GroupInput | NodeKind::GroupOutput)
    }

    /// Narrowest width the host allows for this kind.
    pub fn min_width(&self) -> f32 {
        match self {
            NodeKind::GroupInput | NodeKind::GroupOutput => 80.0,
            NodeKind::PrincipledBsdf => 240.0,
            _ => 100.0,
        }
    }

    /// Width a freshly created node of this kind gets.
    pub fn default_width(&self) -> f32 {
        match self {
            NodeKind::PrincipledBsdf => 240.0,
            _ => 140.0,
        }
    }

    /// Height of a collapsed node of this kind.
    pub fn min_height(&self) -> f32 {
        30.0
    }

    /// Fixed socket layout for kinds whose sockets do not depend on the
    /// graph. Group pseudo-nodes return empty lists here; the graph fills
    /// them from its interface.
    pub fn template(&self) -> (SocketList, SocketList) {
        let mut inputs = SocketList::new();
        let mut outputs = SocketList::new();
        match self {
            NodeKind::RandomValue => {
                inputs.push(
                    Socket::input("Min", SocketType::Int).with_default(SocketValue::Int(0)),
                );
                inputs.push(
                    Socket::input("Max", SocketType::Int).with_default(SocketValue::Int(100)),
                );
                let mut id = Socket::input("ID", SocketType::Int);
                id.hide_value = true;
                inputs.push(id);
                inputs.push(
                    Socket::input("Seed", SocketType::Int).with_default(SocketValue::Int(0)),
                );
                outputs.push(Socket::output("Value", SocketType::Int));
            }
            NodeKind::IntegerConstant => {
                outputs.push(Socket::output("Integer", SocketType::Int));
            }
            NodeKind::PrincipledBsdf => {
                inputs.push(Socket::input("Base Color", SocketType::Color));
                inputs.push(Socket::input("Metallic", SocketType::Float));
                inputs.push(Socket::input("Roughness", SocketType::Float));
                inputs.push(Socket::input("Subsurface Radius", SocketType::Vector));
                let mut normal = Socket::input("Normal", SocketType::Vector);
                normal.hide_value = true;
                inputs.push(normal);
                outputs.push(Socket::output("BSDF", SocketType::Shader));
            }
            NodeKind::GroupInput
            | NodeKind::GroupOutput
            | NodeKind::Frame
            | NodeKind::Group(_)
            | NodeKind::Custom(_) => {}
        }
        (inputs, outputs)
    }
}

/// Kind-specific stored properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeData {
    #[default]
    None,
    /// Literal emitted by an integer-constant node.
    Integer { value: i64 },
    /// Output type selected on a random-value node.
    RandomValue { data_type: SocketType },
}

/// Canvas position of a node's top-left corner. Y grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub x: f32,
    pub y: f32,
}

impl Location {
    pub fn new(x: f32, y: f32) -> Self {
        Location { x, y }
    }
}

/// Drawn size of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

/// A node in a host graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Collapsed to its header.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub selected: bool,
    /// Enclosing frame, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub inputs: SocketList,
    #[serde(default)]
    pub outputs: SocketList,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// Creates a node of `kind` with its template sockets and default width.
    pub fn new(kind: NodeKind) -> Self {
        let (inputs, outputs) = kind.template();
        let data = match kind {
            NodeKind::IntegerConstant => NodeData::Integer { value: 0 },
            NodeKind::RandomValue => NodeData::RandomValue {
                data_type: SocketType::Float,
            },
            _ => NodeData::None,
        };
        let dimensions = Dimensions {
            width: kind.default_width(),
            height: kind.min_height() + 22.0 * (inputs.len() + outputs.len()) as f32,
        };
        Node {
            kind,
            label: String::new(),
            location: Location::default(),
            dimensions,
            hidden: false,
            selected: false,
            parent: None,
            inputs,
            outputs,
            data,
        }
    }

    /// Builder-style setter for the location.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.location = Location::new(x, y);
        self
    }

    /// Builder-style setter for the label.
    pub fn labeled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Builder-style append of a socket on the side its direction names.
    pub fn with_socket(mut self, socket: Socket) -> Self {
        match socket.direction {
            SocketDirection::Input => self.inputs.push(socket),
            SocketDirection::Output => self.outputs.push(socket),
        }
        self
    }

    pub fn width(&self) -> f32 {
        self.dimensions.width
    }

    pub fn set_width(&mut self, width: f32) {
        self.dimensions.width = width;
    }

    pub fn sockets(&self, direction: SocketDirection) -> &SocketList {
        match direction {
            SocketDirection::Input => &self.inputs,
            SocketDirection::Output => &self.outputs,
        }
    }

    pub fn sockets_mut(&mut self, direction: SocketDirection) -> &mut SocketList {
        match direction {
            SocketDirection::Input => &mut self.inputs,
            SocketDirection::Output => &mut self.outputs,
        }
    }

    /// Position of the first socket on `direction` whose name matches
    /// `name` (case-insensitive, trimmed).
    pub fn socket_index(&self, direction: SocketDirection, name: &str) -> Option<u16> {
        self.sockets(direction)
            .iter()
            .position(|s| s.name_matches(name))
            .and_then(|i| u16::try_from(i).ok())
    }

    /// The integer literal of an integer-constant node.
    pub fn integer(&self) -> Option<i64> {
        match self.data {
            NodeData::Integer { value } => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_value_template_has_seed_and_id() {
        let node = Node::new(NodeKind::RandomValue);
        assert_eq!(node.socket_index(SocketDirection::Input, "seed"), Some(3));
        assert_eq!(node.socket_index(SocketDirection::Input, "ID"), Some(2));
        assert_eq!(node.socket_index(SocketDirection::Output, "Value"), Some(0));
        assert!(node.inputs[2].hide_value);
    }

    #[test]
    fn socket_beyond_u16_range_is_not_addressable() {
        let mut node = Node::new(NodeKind::Custom("Wide".into()));
        for _ in 0..=u16::MAX {
            node.inputs.push(Socket::input("Pad", SocketType::Float));
        }
        node.inputs.push(Socket::input("Seed", SocketType::Int));
        assert_eq!(node.socket_index(SocketDirection::Input, "Seed"), None);
        assert_eq!(node.socket_index(SocketDirection::Input, "Pad"), Some(0));
    }

    #[test]
    fn integer_constant_starts_at_zero() {
        let node = Node::new(NodeKind::IntegerConstant);
        assert_eq!(node.integer(), Some(0));
        assert_eq!(node.outputs[0].name, "Integer");
    }

    #[test]
    fn custom_kind_keeps_type_tag() {
        let kind = NodeKind::Custom("GeometryNodeDistributePointsOnFaces".into());
        assert_eq!(kind.type_tag(), "GeometryNodeDistributePointsOnFaces");
        assert!(!kind.is_group_io());
        assert!(NodeKind::GroupOutput.is_group_io());
    }

    #[test]
    fn builder_places_sockets_by_direction() {
        let node = Node::new(NodeKind::Custom("Mix".into()))
            .with_socket(Socket::input("A", SocketType::Float))
            .with_socket(Socket::output("Result", SocketType::Float))
            .at(10.0, -5.0)
            .labeled("mix");
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.location, Location::new(10.0, -5.0));
        assert_eq!(node.label, "mix");
    }
}
