//! Host scene graph and action system.

use std::fmt;
use std::sync::Arc;

use glam::Quat;

use crate::{PointerEvent, PointerTrigger};

/// Handle to a transform node or mesh owned by the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Handle to a material owned by the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// Handle to a texture owned by the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Material slots the snapshot textures are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChannel {
    /// Self-illuminated color (the visible content of an unlit plane).
    Emissive,
    /// Alpha mask (keeps the transparent snapshot background see-through).
    Opacity,
}

impl TextureChannel {
    /// Both channels, in binding order.
    pub const BOTH: [TextureChannel; 2] = [TextureChannel::Emissive, TextureChannel::Opacity];
}

/// Callback executed by the host when a trigger fires.
pub type ActionCallback = Arc<dyn Fn(&PointerEvent) + Send + Sync>;

/// Work the host performs when a registered trigger fires.
#[derive(Clone)]
pub enum SceneAction {
    /// Assign `texture` to `channel` of `material`.
    SetTexture {
        /// Target material.
        material: MaterialId,
        /// Target slot.
        channel: TextureChannel,
        /// Texture to assign.
        texture: TextureId,
    },
    /// Run arbitrary code with the event.
    Execute(ActionCallback),
}

impl fmt::Debug for SceneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneAction::SetTexture {
                material,
                channel,
                texture,
            } => f
                .debug_struct("SetTexture")
                .field("material", material)
                .field("channel", channel)
                .field("texture", texture)
                .finish(),
            SceneAction::Execute(_) => f.write_str("Execute(..)"),
        }
    }
}

/// How a node is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisposeMode {
    /// Also dispose every descendant node.
    pub recurse: bool,
    /// Also dispose the node's material and the material's textures.
    pub materials_and_textures: bool,
}

impl DisposeMode {
    /// Dispose the node, its descendants, its material and textures.
    pub const FULL: DisposeMode = DisposeMode {
        recurse: true,
        materials_and_textures: true,
    };
}

/// Host 3D scene graph plus its pointer action system.
///
/// Implementations own every node/material/texture; the pipeline only ever
/// holds the returned handles.
pub trait Scene: Send + Sync {
    /// Create an empty transform node identified by `id`.
    fn create_transform_node(&self, id: &str) -> NodeId;

    /// Create a flat quad of `width` x `height` world units.
    fn create_plane(&self, name: &str, width: f32, height: f32) -> NodeId;

    /// Create a material with lighting disabled.
    fn create_unlit_material(&self, name: &str) -> MaterialId;

    /// Assign `material` to `mesh`.
    fn set_material(&self, mesh: NodeId, material: MaterialId);

    /// Create a texture from an encoded image URL.
    fn create_texture(&self, url: &str) -> TextureId;

    /// Bind `texture` to `channel` of `material`.
    fn set_material_texture(&self, material: MaterialId, channel: TextureChannel, texture: TextureId);

    /// Re-parent `child` (or detach it when `parent` is `None`).
    fn set_parent(&self, child: NodeId, parent: Option<NodeId>);

    /// Set the local rotation of `node`.
    fn set_rotation(&self, node: NodeId, rotation: Quat);

    /// Overwrite the string identifier of `node`.
    fn set_node_id(&self, node: NodeId, id: &str);

    /// Register `action` to run when `trigger` fires on `mesh`.
    fn register_action(&self, mesh: NodeId, trigger: PointerTrigger, action: SceneAction);

    /// Destroy `node` according to `mode`.
    fn dispose(&self, node: NodeId, mode: DisposeMode);

    /// Destroy `texture`, bound or not. No-op if it is already gone.
    fn dispose_texture(&self, texture: TextureId);
}
