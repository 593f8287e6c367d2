use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Quat;
use htmlmesh_core::{
    DisposeMode, MaterialId, NodeId, PointerEvent, PointerTrigger, Scene, SceneAction,
    TextureChannel, TextureId,
};

/// Kind of a recorded node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// Empty transform.
    Transform,
    /// Flat quad.
    Plane {
        /// Width in world units.
        width: f32,
        /// Height in world units.
        height: f32,
    },
}

/// Recorded node state.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Node kind.
    pub kind: NodeKind,
    /// Name given at creation.
    pub name: String,
    /// String identifier.
    pub id: String,
    /// Parent node.
    pub parent: Option<NodeId>,
    /// Local rotation.
    pub rotation: Quat,
    /// Assigned material.
    pub material: Option<MaterialId>,
    /// Set once disposed.
    pub disposed: bool,
}

/// Recorded material state.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    /// Material name.
    pub name: String,
    /// Lighting disabled.
    pub unlit: bool,
    /// Bound emissive texture.
    pub emissive: Option<TextureId>,
    /// Bound opacity texture.
    pub opacity: Option<TextureId>,
    /// Set once disposed.
    pub disposed: bool,
}

/// Recorded texture state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRecord {
    /// Source URL.
    pub url: String,
    /// Set once disposed.
    pub disposed: bool,
}

#[derive(Default)]
struct SceneState {
    next_id: u64,
    nodes: BTreeMap<NodeId, NodeRecord>,
    materials: BTreeMap<MaterialId, MaterialRecord>,
    textures: BTreeMap<TextureId, TextureRecord>,
    actions: BTreeMap<NodeId, Vec<(PointerTrigger, SceneAction)>>,
}

impl SceneState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_node(&mut self, kind: NodeKind, name: &str) -> NodeId {
        let id = NodeId(self.next());
        self.nodes.insert(
            id,
            NodeRecord {
                kind,
                name: name.to_string(),
                id: name.to_string(),
                parent: None,
                rotation: Quat::IDENTITY,
                material: None,
                disposed: false,
            },
        );
        id
    }

    fn dispose_node(&mut self, node: NodeId, mode: DisposeMode) {
        let material = match self.nodes.get_mut(&node) {
            Some(record) if !record.disposed => {
                record.disposed = true;
                record.material
            }
            _ => return,
        };
        self.actions.remove(&node);

        if mode.materials_and_textures {
            if let Some(material) = material.and_then(|id| self.materials.get_mut(&id)) {
                material.disposed = true;
                let bound = [material.emissive, material.opacity];
                for texture in bound.into_iter().flatten() {
                    if let Some(texture) = self.textures.get_mut(&texture) {
                        texture.disposed = true;
                    }
                }
            }
        }

        if mode.recurse {
            let children: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|(_, record)| record.parent == Some(node))
                .map(|(id, _)| *id)
                .collect();
            for child in children {
                self.dispose_node(child, mode);
            }
        }
    }
}

/// In-memory [`Scene`] that records every call and dispatches pointer
/// triggers to registered actions.
#[derive(Default)]
pub struct HeadlessScene {
    state: Mutex<SceneState>,
}

impl HeadlessScene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `trigger` on `mesh` with a default event. Returns the number of
    /// actions executed.
    pub fn fire(&self, mesh: NodeId, trigger: PointerTrigger) -> usize {
        self.fire_event(PointerEvent::new(trigger, mesh))
    }

    /// Fire an explicit event on its source mesh.
    ///
    /// Disposed meshes have no actions. Callbacks run without the scene lock
    /// held, so they may call back into the scene.
    pub fn fire_event(&self, event: PointerEvent) -> usize {
        let actions: Vec<SceneAction> = {
            let state = self.lock();
            match state.nodes.get(&event.source) {
                Some(record) if !record.disposed => {}
                _ => return 0,
            }
            state
                .actions
                .get(&event.source)
                .map(|registered| {
                    registered
                        .iter()
                        .filter(|(trigger, _)| *trigger == event.trigger)
                        .map(|(_, action)| action.clone())
                        .collect()
                })
                .unwrap_or_default()
        };

        for action in &actions {
            match action {
                SceneAction::SetTexture {
                    material,
                    channel,
                    texture,
                } => self.set_material_texture(*material, *channel, *texture),
                SceneAction::Execute(callback) => callback(&event),
            }
        }
        actions.len()
    }

    /// Snapshot of a node.
    pub fn node(&self, node: NodeId) -> Option<NodeRecord> {
        self.lock().nodes.get(&node).cloned()
    }

    /// Snapshot of a material.
    pub fn material(&self, material: MaterialId) -> Option<MaterialRecord> {
        self.lock().materials.get(&material).cloned()
    }

    /// Texture bound to `channel` of `material`.
    pub fn material_texture(&self, material: MaterialId, channel: TextureChannel) -> Option<TextureId> {
        let state = self.lock();
        let record = state.materials.get(&material)?;
        match channel {
            TextureChannel::Emissive => record.emissive,
            TextureChannel::Opacity => record.opacity,
        }
    }

    /// Source URL of a texture.
    pub fn texture_url(&self, texture: TextureId) -> Option<String> {
        self.lock().textures.get(&texture).map(|t| t.url.clone())
    }

    /// Snapshot of a texture.
    pub fn texture(&self, texture: TextureId) -> Option<TextureRecord> {
        self.lock().textures.get(&texture).cloned()
    }

    /// Dimensions of a plane node.
    pub fn plane_size(&self, node: NodeId) -> Option<(f32, f32)> {
        match self.lock().nodes.get(&node)?.kind {
            NodeKind::Plane { width, height } => Some((width, height)),
            NodeKind::Transform => None,
        }
    }

    /// Returns true if `node` exists and was disposed.
    pub fn is_disposed(&self, node: NodeId) -> bool {
        self.lock().nodes.get(&node).is_some_and(|n| n.disposed)
    }

    /// First live node carrying the string identifier `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.lock()
            .nodes
            .iter()
            .find(|(_, record)| !record.disposed && record.id == id)
            .map(|(node, _)| *node)
    }

    /// Nodes ever created.
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Nodes not yet disposed.
    pub fn live_node_count(&self) -> usize {
        self.lock().nodes.values().filter(|n| !n.disposed).count()
    }

    /// Materials ever created.
    pub fn material_count(&self) -> usize {
        self.lock().materials.len()
    }

    /// Textures ever created.
    pub fn texture_count(&self) -> usize {
        self.lock().textures.len()
    }

    /// Textures not yet disposed.
    pub fn live_texture_count(&self) -> usize {
        self.lock().textures.values().filter(|t| !t.disposed).count()
    }

    fn lock(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scene for HeadlessScene {
    fn create_transform_node(&self, id: &str) -> NodeId {
        self.lock().insert_node(NodeKind::Transform, id)
    }

    fn create_plane(&self, name: &str, width: f32, height: f32) -> NodeId {
        self.lock()
            .insert_node(NodeKind::Plane { width, height }, name)
    }

    fn create_unlit_material(&self, name: &str) -> MaterialId {
        let mut state = self.lock();
        let id = MaterialId(state.next());
        state.materials.insert(
            id,
            MaterialRecord {
                name: name.to_string(),
                unlit: true,
                emissive: None,
                opacity: None,
                disposed: false,
            },
        );
        id
    }

    fn set_material(&self, mesh: NodeId, material: MaterialId) {
        if let Some(record) = self.lock().nodes.get_mut(&mesh) {
            record.material = Some(material);
        }
    }

    fn create_texture(&self, url: &str) -> TextureId {
        let mut state = self.lock();
        let id = TextureId(state.next());
        state.textures.insert(
            id,
            TextureRecord {
                url: url.to_string(),
                disposed: false,
            },
        );
        id
    }

    fn set_material_texture(&self, material: MaterialId, channel: TextureChannel, texture: TextureId) {
        if let Some(record) = self.lock().materials.get_mut(&material) {
            match channel {
                TextureChannel::Emissive => record.emissive = Some(texture),
                TextureChannel::Opacity => record.opacity = Some(texture),
            }
        }
    }

    fn set_parent(&self, child: NodeId, parent: Option<NodeId>) {
        if let Some(record) = self.lock().nodes.get_mut(&child) {
            record.parent = parent;
        }
    }

    fn set_rotation(&self, node: NodeId, rotation: Quat) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            record.rotation = rotation;
        }
    }

    fn set_node_id(&self, node: NodeId, id: &str) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            record.id = id.to_string();
        }
    }

    fn register_action(&self, mesh: NodeId, trigger: PointerTrigger, action: SceneAction) {
        self.lock()
            .actions
            .entry(mesh)
            .or_default()
            .push((trigger, action));
    }

    fn dispose(&self, node: NodeId, mode: DisposeMode) {
        self.lock().dispose_node(node, mode);
    }

    fn dispose_texture(&self, texture: TextureId) {
        if let Some(record) = self.lock().textures.get_mut(&texture) {
            record.disposed = true;
        }
    }
}
