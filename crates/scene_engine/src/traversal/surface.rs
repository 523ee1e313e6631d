//! The drawing surface
//!
//! [`VisualSurface`] owns everything that lives across frames for one output:
//! the camera, the bindable stacks, the sensor diff state and the queue of
//! scene events. Each frame or query builds a fresh [`TraversalContext`],
//! moves that state in, walks the graph and moves it back out.

use crate::core::config::EngineConfig;
use crate::events::{EventQueue, SceneEvent};
use crate::foundation::collections::NodeId;
use crate::foundation::math::Vec3;
use crate::geometry::Ray;
use crate::input::picking::PointerState;
use crate::input::InputEvent;
use crate::render::{Camera, NullBackend, RenderBackend};
use crate::scene::SceneGraph;
use super::bindable::{BindableKind, BindableStacks};
use super::collide::{check_collisions, CollisionOutcome};
use super::context::{FrameStats, TraversalContext};
use super::frame::render_passes;
use super::pass::TraversalPass;
use super::pick::{HitInfo, PickState};
use super::sensors::SensorManager;

/// One rendering output and its persistent traversal state
#[derive(Debug)]
pub struct VisualSurface {
    camera: Camera,
    bindables: BindableStacks,
    events: EventQueue,
    sensors: SensorManager,
    pointer: PointerState,
    config: EngineConfig,
    last_hit: Option<HitInfo>,
}

impl VisualSurface {
    /// 3D surface of `width` x `height` pixels
    pub fn new(width: f32, height: f32, config: EngineConfig) -> Self {
        Self::with_camera(Camera::default_placement(width, height), config)
    }

    /// 2D surface of `width` x `height` pixels
    pub fn new_2d(width: f32, height: f32, config: EngineConfig) -> Self {
        Self::with_camera(Camera::orthographic_2d(width, height), config)
    }

    fn with_camera(camera: Camera, config: EngineConfig) -> Self {
        let pointer = PointerState::new(camera.width, camera.height);
        log::info!("Visual surface created ({}x{}, 3D: {})", camera.width, camera.height, camera.is_3d);
        Self {
            camera,
            bindables: BindableStacks::new(),
            events: EventQueue::new(),
            sensors: SensorManager::new(),
            pointer,
            config,
            last_hit: None,
        }
    }

    /// The surface camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera, for navigation
    ///
    /// Moving the eye here defers collision handling to the next frame; use
    /// [`move_camera`](Self::move_camera) to resolve it immediately.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bindable stacks of this surface
    pub fn bindables(&self) -> &BindableStacks {
        &self.bindables
    }

    /// Pending scene events
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Take every pending event
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain()
    }

    /// Sensor diff state
    pub fn sensors(&self) -> &SensorManager {
        &self.sensors
    }

    /// Result of the last [`pick`](Self::pick)
    pub fn last_hit(&self) -> Option<&HitInfo> {
        self.last_hit.as_ref()
    }

    /// Make `node` the active bindable of its category
    pub fn bind(&mut self, kind: BindableKind, node: NodeId) -> bool {
        let changed = self.bindables.activate(kind, node);
        self.flush_bindable_changes();
        changed
    }

    /// Release `node`; the next registered node of the category takes over
    pub fn unbind(&mut self, kind: BindableKind, node: NodeId) -> bool {
        let changed = self.bindables.deactivate(kind, node);
        self.flush_bindable_changes();
        changed
    }

    fn flush_bindable_changes(&mut self) {
        for change in self.bindables.drain_changes() {
            self.events.push(change);
        }
    }

    /// Change the output size
    pub fn resize(&mut self, width: f32, height: f32) {
        self.camera.set_viewport(width, height);
        self.pointer.resize(width, height);
    }

    fn purge_removed(&mut self, graph: &mut SceneGraph) {
        for node in graph.take_removed() {
            self.bindables.forget(node);
            self.sensors.forget(node);
            if self.last_hit.as_ref().is_some_and(|hit| hit.node == node) {
                self.last_hit = None;
            }
        }
        self.flush_bindable_changes();
    }

    fn context<'a>(&mut self, backend: &'a mut (dyn RenderBackend + 'a)) -> TraversalContext<'a> {
        let mut ctx = TraversalContext::new(backend, self.config.traversal_settings(), self.camera.clone());
        ctx.bindables = std::mem::take(&mut self.bindables);
        ctx
    }

    fn finish(&mut self, mut ctx: TraversalContext<'_>) -> FrameStats {
        self.camera = ctx.camera.clone();
        self.bindables = std::mem::take(&mut ctx.bindables);
        self.events.append(&mut ctx.events);
        ctx.stats
    }

    /// Draw one frame of the scene under `root`
    ///
    /// Resolves pending camera movement first, then runs the frame passes.
    pub fn draw_frame(&mut self, graph: &mut SceneGraph, root: NodeId, backend: &mut dyn RenderBackend) -> FrameStats {
        self.purge_removed(graph);
        let mut ctx = self.context(backend);
        if ctx.camera.has_moved() {
            check_collisions(graph, root, &mut ctx);
        }
        render_passes(graph, &mut ctx, |graph, ctx| graph.traverse(root, ctx));
        ctx.backend().clear_lights();
        let stats = self.finish(ctx);
        log::trace!("Frame done: {:?}", stats);
        stats
    }

    /// Pick at a pointer event and notify the sensors under it
    pub fn pick(&mut self, graph: &mut SceneGraph, root: NodeId, event: &InputEvent) -> Option<HitInfo> {
        self.purge_removed(graph);
        self.pointer.update(event);
        let ndc = self.pointer.to_ndc();
        self.camera.update_frustum();
        let ray = self.camera.pick_ray(ndc.0, ndc.1);
        let (hit, current) = self.run_pick(graph, root, ray, Some(ndc));
        self.sensors.process(graph, current, event, hit.as_ref(), &mut self.events);
        self.last_hit.clone_from(&hit);
        hit
    }

    /// Closest hit along a world-space ray; sensors are not notified
    pub fn pick_ray(&mut self, graph: &mut SceneGraph, root: NodeId, ray: Ray) -> Option<HitInfo> {
        self.purge_removed(graph);
        if !ray.is_valid() {
            log::debug!("Degenerate pick ray {:?}, nothing hit", ray);
            return None;
        }
        self.camera.update_frustum();
        self.run_pick(graph, root, Some(ray), None).0
    }

    fn run_pick(
        &mut self,
        graph: &mut SceneGraph,
        root: NodeId,
        ray: Option<Ray>,
        ndc: Option<(f32, f32)>,
    ) -> (Option<HitInfo>, Vec<NodeId>) {
        let Some(ray) = ray else {
            log::debug!("No pick ray for the current camera");
            return (None, Vec::new());
        };
        let mut backend = NullBackend;
        let mut ctx = self.context(&mut backend);
        ctx.pass = TraversalPass::Pick;
        ctx.ray = Some(ray);
        ctx.pick = PickState::new(self.sensors.grabbed().is_some());
        ctx.pick.ndc = ndc;
        graph.traverse(root, &mut ctx);
        let pick = std::mem::take(&mut ctx.pick);
        self.finish(ctx);
        match pick.hit {
            Some(hit) => (Some(hit), pick.sensors),
            None => (None, Vec::new()),
        }
    }

    /// Move the eye to `position` and resolve collisions right away
    pub fn move_camera(&mut self, graph: &mut SceneGraph, root: NodeId, position: Vec3) -> CollisionOutcome {
        self.purge_removed(graph);
        let delta = position - self.camera.position;
        self.camera.translate(delta);
        self.camera.update_frustum();
        let mut backend = NullBackend;
        let mut ctx = self.context(&mut backend);
        let outcome = check_collisions(graph, root, &mut ctx);
        self.finish(ctx);
        outcome
    }
}
