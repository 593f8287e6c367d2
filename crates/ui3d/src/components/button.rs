//! Interactive HTML button

use std::f32::consts::PI;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Quat;
use htmlmesh_core::{DisposeMode, NodeId, PointerEvent, PointerTrigger, Scene, SceneAction};
use tracing::{debug, warn};

use crate::builder::{HtmlMeshBuilder, PlaneMesh};
use crate::observable::Observable;
use crate::options::{ButtonOptions, ButtonStyle, MeshOptions};

/// Triggers forwarded onto [`HtmlButton::on_pointer`].
pub const FORWARDED_TRIGGERS: [PointerTrigger; 3] = [
    PointerTrigger::PointerOver,
    PointerTrigger::PointerOut,
    PointerTrigger::Pick,
];

/// Where a button is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLifecycle {
    /// Transform exists, no build started.
    Constructed,
    /// Plane is being built.
    Building,
    /// Build finished; `mesh` is `None` if rasterization failed.
    Ready {
        /// The attached plane.
        mesh: Option<NodeId>,
    },
    /// Torn down.
    Disposed,
}

struct ButtonState {
    lifecycle: ButtonLifecycle,
    plane: Option<PlaneMesh>,
}

/// A clickable HTML button rendered as a plane under its own transform node.
///
/// Construction is synchronous and inert; [`HtmlButton::build`] rasterizes the
/// idle/hover/click snapshots and attaches the plane.
pub struct HtmlButton {
    name: String,
    id: String,
    transform: NodeId,
    scene: Arc<dyn Scene>,
    mesh_options: MeshOptions,
    state: Mutex<ButtonState>,
    on_ready: Observable<HtmlButton>,
    on_pointer: Arc<Observable<PointerEvent>>,
}

impl HtmlButton {
    /// Create the transform node `id` and resolve the button's options.
    ///
    /// Unset styles fall back to the built-in idle/hover/click styles and
    /// unset mesh options to the `<button>{name}</button>` template at
    /// 256x256 pixels on a plane 0.1 units tall.
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        scene: Arc<dyn Scene>,
        button_options: Option<ButtonOptions>,
        mesh_options: Option<MeshOptions>,
    ) -> Self {
        let name = name.into();
        let id = id.into();
        let transform = scene.create_transform_node(&id);

        let style = ButtonStyle::resolve(button_options.as_ref());
        let defaults = MeshOptions::for_button(&name, &style);
        let mesh_options = MeshOptions::merged(mesh_options.as_ref(), &defaults);
        debug!(%name, %id, "created html button");

        Self {
            name,
            id,
            transform,
            scene,
            mesh_options,
            state: Mutex::new(ButtonState {
                lifecycle: ButtonLifecycle::Constructed,
                plane: None,
            }),
            on_ready: Observable::new(),
            on_pointer: Arc::new(Observable::new()),
        }
    }

    /// Build and attach the plane. Fires [`HtmlButton::on_ready`] once.
    ///
    /// Runs at most once: later calls return the current mesh without
    /// rebuilding. If the button is disposed while the build is in flight,
    /// the late plane is disposed immediately and never attached.
    pub async fn build(&self, builder: &HtmlMeshBuilder) -> Option<NodeId> {
        {
            let mut state = self.lock();
            match state.lifecycle {
                ButtonLifecycle::Constructed => state.lifecycle = ButtonLifecycle::Building,
                ButtonLifecycle::Building => {
                    warn!(name = %self.name, "button build already in flight");
                    return None;
                }
                ButtonLifecycle::Ready { mesh } => return mesh,
                ButtonLifecycle::Disposed => {
                    debug!(name = %self.name, "skipping build of disposed button");
                    return None;
                }
            }
        }

        let plane = builder
            .create_plane(
                &format!("{}-mesh", self.name),
                &self.mesh_options,
                self.scene.as_ref(),
            )
            .await;
        let mesh = plane.as_ref().map(|plane| plane.mesh);

        {
            let mut state = self.lock();
            if state.lifecycle == ButtonLifecycle::Disposed {
                if let Some(plane) = plane {
                    debug!(name = %self.name, "disposing plane that finished after dispose");
                    plane.dispose(self.scene.as_ref());
                }
                return None;
            }
            if let Some(mesh) = mesh {
                self.attach(mesh);
            }
            state.lifecycle = ButtonLifecycle::Ready { mesh };
            state.plane = plane;
        }

        self.on_ready.notify(self);
        mesh
    }

    fn attach(&self, mesh: NodeId) {
        self.scene.set_rotation(mesh, Quat::from_rotation_y(PI));
        self.scene.set_node_id(mesh, &self.id);
        for trigger in FORWARDED_TRIGGERS {
            let pointer = Arc::clone(&self.on_pointer);
            self.scene.register_action(
                mesh,
                trigger,
                SceneAction::Execute(Arc::new(move |event: &PointerEvent| {
                    pointer.notify(event);
                })),
            );
        }
        self.scene.set_parent(mesh, Some(self.transform));
    }

    /// Dispose the plane (with its material and textures), clear both
    /// streams and dispose the transform. Idempotent.
    pub fn dispose(&self) {
        let plane = {
            let mut state = self.lock();
            if state.lifecycle == ButtonLifecycle::Disposed {
                return;
            }
            state.lifecycle = ButtonLifecycle::Disposed;
            state.plane.take()
        };
        if let Some(plane) = plane {
            plane.dispose(self.scene.as_ref());
        }
        self.on_pointer.clear();
        self.on_ready.clear();
        self.scene.dispose(self.transform, DisposeMode::FULL);
        debug!(name = %self.name, "disposed html button");
    }

    /// Label the button was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the transform (and of the plane once attached).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Root transform node.
    pub fn transform(&self) -> NodeId {
        self.transform
    }

    /// The attached plane, if the build succeeded.
    pub fn mesh(&self) -> Option<NodeId> {
        match self.lock().lifecycle {
            ButtonLifecycle::Ready { mesh } => mesh,
            _ => None,
        }
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> ButtonLifecycle {
        self.lock().lifecycle
    }

    /// Returns true once [`HtmlButton::dispose`] ran.
    pub fn is_disposed(&self) -> bool {
        self.lifecycle() == ButtonLifecycle::Disposed
    }

    /// Fully resolved mesh options.
    pub fn mesh_options(&self) -> &MeshOptions {
        &self.mesh_options
    }

    /// Fires once when the build finishes, successful or not.
    pub fn on_ready(&self) -> &Observable<HtmlButton> {
        &self.on_ready
    }

    /// Pointer enter/exit/click events on the plane.
    pub fn on_pointer(&self) -> &Observable<PointerEvent> {
        &self.on_pointer
    }

    fn lock(&self) -> MutexGuard<'_, ButtonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for HtmlButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlButton")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("transform", &self.transform)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
