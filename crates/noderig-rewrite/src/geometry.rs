//! Approximate on-canvas socket positions.
//!
//! The editor does not expose socket coordinates, so they are reconstructed
//! from the node's location and size by walking its visible sockets with
//! fixed row heights. The constants are calibration values measured against
//! the editor's default theme.

use noderig_core::{Location, Node, NodeKind, Socket, SocketDirection};

/// Horizontal inset of output sockets from the node's right edge.
pub const X_OFFSET: f32 = -1.0;
/// Distance from the node's top edge to the first output row.
pub const Y_TOP: f32 = -34.0;
/// Distance from the node's bottom edge to the last input row.
pub const Y_BOTTOM: f32 = 16.0;
/// Height of one socket row.
pub const Y_OFFSET: f32 = 22.0;
/// Extra space below a tall (expanded vector) input row.
pub const VEC_BOTTOM: f32 = 28.0;
/// Extra space above a tall (expanded vector) input row.
pub const VEC_TOP: f32 = 32.0;

/// Hidden or disabled sockets take no row.
fn is_hidden(socket: &Socket) -> bool {
    !socket.is_visible()
}

/// A socket is tall when it draws an unlinked, editable vector value.
pub fn is_tall(node: &Node, socket: &Socket) -> bool {
    if !socket.socket_type.is_vector() || socket.hide_value || socket.linked {
        return false;
    }
    // Drawn as a single row despite being a vector.
    if node.kind == NodeKind::PrincipledBsdf && socket.identifier == "Subsurface Radius" {
        return false;
    }
    true
}

/// Computes the canvas position of the socket named `socket_name` on the
/// given side of `node`.
///
/// Returns `None` when the node is collapsed, when the named socket is
/// hidden, or when no socket of that name exists. Callers should fall back
/// to a node-relative position in all three cases.
pub fn locate(node: &Node, socket_name: &str, direction: SocketDirection) -> Option<Location> {
    if node.hidden {
        return None;
    }
    match direction {
        SocketDirection::Output => {
            let x = node.location.x + node.dimensions.width + X_OFFSET;
            let mut y = node.location.y + Y_TOP;
            for socket in &node.outputs {
                let is_match = socket.name_matches(socket_name);
                if is_hidden(socket) {
                    if is_match {
                        return None;
                    }
                    continue;
                }
                if is_match {
                    return Some(Location::new(x, y));
                }
                y -= Y_OFFSET;
            }
            None
        }
        SocketDirection::Input => {
            let x = node.location.x;
            let mut y = node.location.y - node.dimensions.height + Y_BOTTOM;
            for socket in node.inputs.iter().rev() {
                let is_match = socket.name_matches(socket_name);
                if is_hidden(socket) {
                    if is_match {
                        return None;
                    }
                    continue;
                }
                let tall = is_tall(node, socket);
                if tall {
                    y += VEC_BOTTOM;
                }
                if is_match {
                    return Some(Location::new(x, y));
                }
                y += Y_OFFSET;
                if tall {
                    y += VEC_TOP;
                }
            }
            None
        }
    }
}
