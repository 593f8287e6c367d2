//! Pointer triggers exposed by the host action system.

use glam::Vec2;

use crate::NodeId;

/// Named interaction triggers a host action system can fire on a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerTrigger {
    /// Pointer entered the mesh.
    PointerOver,
    /// Pointer left the mesh.
    PointerOut,
    /// Primary button pressed while over the mesh.
    PickDown,
    /// Primary button released while over the mesh.
    PickUp,
    /// Full click (down + up) on the mesh.
    Pick,
}

impl PointerTrigger {
    /// Every trigger, in the order a normal interaction produces them.
    pub const ALL: [PointerTrigger; 5] = [
        PointerTrigger::PointerOver,
        PointerTrigger::PickDown,
        PointerTrigger::PickUp,
        PointerTrigger::Pick,
        PointerTrigger::PointerOut,
    ];
}

/// Event payload delivered to action callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Trigger that fired.
    pub trigger: PointerTrigger,
    /// Mesh the action was registered on.
    pub source: NodeId,
    /// Pointer position in screen pixels.
    pub pointer: Vec2,
}

impl PointerEvent {
    /// Event at the origin of the screen.
    pub fn new(trigger: PointerTrigger, source: NodeId) -> Self {
        Self {
            trigger,
            source,
            pointer: Vec2::ZERO,
        }
    }
}
