//! The traversal context
//!
//! One mutable record threaded through every node visit of a walk. Nodes read
//! the accumulated state (model matrix, clip region, cull flag...), mutate it
//! for their subtree and restore it on the way out. Grouping nodes also take
//! a [`ContextSnapshot`] around each child so siblings never observe each
//! other's changes.

use crate::core::config::TraversalSettings;
use crate::events::EventQueue;
use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::geometry::{BoundingBox, Plane, Ray};
use crate::render::{Camera, ClipRect, ColorTransform, LightDesc, RenderBackend};
use super::bindable::{BindableKind, BindableStacks};
use super::cull::CullFlag;
use super::deferred::DeferredQueue;
use super::pass::TraversalPass;
use super::pick::PickState;

/// A local light in scope, with the model matrix it was declared under
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightContext {
    /// Light node
    pub node: NodeId,
    /// Model matrix at the light's group
    pub matrix: Mat4,
}

/// Counters collected during one frame or query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Meshes drawn, immediate and deferred
    pub drawn: usize,
    /// Entries that went through the deferred queue
    pub deferred: usize,
    /// Volumes rejected by culling
    pub culled: usize,
    /// Lights not activated because the limit was reached
    pub lights_skipped: usize,
    /// Clip planes not activated because the limit was reached
    pub clip_planes_skipped: usize,
    /// Nested bounds walks triggered by dirty groups
    pub bounds_refreshes: usize,
}

/// Context state restored after visiting a child
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    model_matrix: Mat4,
    color_transform: ColorTransform,
    clip_rect: Option<ClipRect>,
    clip_planes: usize,
    local_lights: usize,
    cull_flag: CullFlag,
    switched_off: bool,
}

/// Mutable state shared by every node visit of one walk
pub struct TraversalContext<'a> {
    /// Current pass
    pub pass: TraversalPass,
    /// Local to world matrix of the node being visited
    pub model_matrix: Mat4,
    /// Accumulated color transform
    pub color_transform: ColorTransform,
    /// Camera of the surface or layer being walked
    pub camera: Camera,
    /// Output of the bounds pass for the node just visited
    pub bbox: BoundingBox,
    /// Active 2D clip rectangle in world units
    pub clip_rect: Option<ClipRect>,
    /// Active clip half-spaces in world space
    pub clip_planes: Vec<Plane>,
    /// Bindable stacks of the surface or layer being walked
    pub bindables: BindableStacks,
    /// Local lights in scope
    pub local_lights: Vec<LightContext>,
    /// Whether a local light visited in `Render` should switch on (true) or off
    pub local_light_on: bool,
    /// Enabled pointer sensors in scope
    pub sensors: Vec<NodeId>,
    /// World-space ray for `Pick`
    pub ray: Option<Ray>,
    /// Cached visibility of the enclosing volume
    pub cull_flag: CullFlag,
    /// Set while walking a branch that is switched off
    pub switched_off: bool,
    /// Set by a subtree during `Bounds` to ask ancestors not to cull it
    pub disable_cull: bool,
    /// Transparent draws waiting for the end of `Sort`
    pub deferred: DeferredQueue,
    /// Best hit so far and sensors in scope at it
    pub pick: PickState,
    /// Notifications raised during the walk
    pub events: EventQueue,
    /// Counters
    pub stats: FrameStats,
    settings: TraversalSettings,
    light_slots: Vec<bool>,
    backend: &'a mut (dyn RenderBackend + 'a),
}

impl<'a> TraversalContext<'a> {
    /// Fresh context for one walk
    pub fn new(backend: &'a mut (dyn RenderBackend + 'a), settings: TraversalSettings, camera: Camera) -> Self {
        Self {
            pass: TraversalPass::default(),
            model_matrix: Mat4::identity(),
            color_transform: ColorTransform::identity(),
            camera,
            bbox: BoundingBox::empty(),
            clip_rect: None,
            clip_planes: Vec::new(),
            bindables: BindableStacks::new(),
            local_lights: Vec::new(),
            local_light_on: false,
            sensors: Vec::new(),
            ray: None,
            cull_flag: CullFlag::Intersects,
            switched_off: false,
            disable_cull: false,
            deferred: DeferredQueue::new(),
            pick: PickState::default(),
            events: EventQueue::new(),
            stats: FrameStats::default(),
            settings,
            light_slots: Vec::new(),
            backend,
        }
    }

    /// Limits and switches for this walk
    pub fn settings(&self) -> &TraversalSettings {
        &self.settings
    }

    /// The graphics backend
    pub fn backend(&mut self) -> &mut (dyn RenderBackend + 'a) {
        &mut *self.backend
    }

    /// Capture the state a child may change
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            model_matrix: self.model_matrix,
            color_transform: self.color_transform,
            clip_rect: self.clip_rect,
            clip_planes: self.clip_planes.len(),
            local_lights: self.local_lights.len(),
            cull_flag: self.cull_flag,
            switched_off: self.switched_off,
        }
    }

    /// Put back a captured state
    pub fn restore(&mut self, snapshot: &ContextSnapshot) {
        self.model_matrix = snapshot.model_matrix;
        self.color_transform = snapshot.color_transform;
        self.clip_rect = snapshot.clip_rect;
        self.clip_planes.truncate(snapshot.clip_planes);
        self.local_lights.truncate(snapshot.local_lights);
        self.cull_flag = snapshot.cull_flag;
        self.switched_off = snapshot.switched_off;
    }

    /// Switch on one more light, unless the limit is reached
    ///
    /// Every call must be paired with [`deactivate_light`](Self::deactivate_light)
    /// in reverse order, whether or not the light was applied.
    pub fn activate_light(&mut self, light: &LightDesc) -> bool {
        let active = self.light_slots.iter().filter(|applied| **applied).count();
        let applied = if active >= self.settings.max_lights {
            self.stats.lights_skipped += 1;
            log::warn!("Light limit of {} reached, skipping {:?} light", self.settings.max_lights, light.light_type);
            false
        } else {
            self.backend.add_light(light)
        };
        self.light_slots.push(applied);
        applied
    }

    /// Undo the most recent [`activate_light`](Self::activate_light)
    pub fn deactivate_light(&mut self) {
        if let Some(true) = self.light_slots.pop() {
            self.backend.remove_last_light();
        }
    }

    /// Number of light activations currently outstanding
    pub fn light_depth(&self) -> usize {
        self.light_slots.len()
    }

    /// Undo activations until only `depth` remain
    pub fn release_lights_to(&mut self, depth: usize) {
        while self.light_slots.len() > depth {
            self.deactivate_light();
        }
    }

    /// Add a clip half-space, unless the limit is reached
    ///
    /// During drawing passes the plane is also sent to the backend. Returns
    /// whether it was applied; pass that value to
    /// [`pop_clip_plane`](Self::pop_clip_plane).
    pub fn push_clip_plane(&mut self, plane: Plane) -> bool {
        if self.clip_planes.len() >= self.settings.max_clip_planes {
            self.stats.clip_planes_skipped += 1;
            log::warn!("Clip plane limit of {} reached, plane ignored", self.settings.max_clip_planes);
            return false;
        }
        if self.pass.is_drawing() {
            self.backend.set_clip_plane(&plane);
        }
        self.clip_planes.push(plane);
        true
    }

    /// Remove the plane added by a successful [`push_clip_plane`](Self::push_clip_plane)
    pub fn pop_clip_plane(&mut self, applied: bool) {
        if !applied {
            return;
        }
        if self.clip_planes.pop().is_some() && self.pass.is_drawing() {
            self.backend.reset_clip_plane();
        }
    }

    /// Register a bindable node with the current stacks
    pub fn register_bindable(&mut self, kind: BindableKind, node: NodeId, wants_bind: bool) {
        self.bindables.register(kind, node, wants_bind);
    }

    /// Move bindable change notifications into the event queue
    pub fn flush_bindable_changes(&mut self) -> usize {
        let changes = self.bindables.drain_changes();
        let count = changes.len();
        for change in changes {
            self.events.push(change);
        }
        count
    }
}

impl std::fmt::Debug for TraversalContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalContext")
            .field("pass", &self.pass)
            .field("cull_flag", &self.cull_flag)
            .field("clip_planes", &self.clip_planes.len())
            .field("local_lights", &self.local_lights.len())
            .field("light_depth", &self.light_slots.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
