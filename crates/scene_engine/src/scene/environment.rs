//! Bindable environment nodes
//!
//! Each registers itself with the current bindable stacks during
//! `RenderBindable`, remembering the world matrix it was reached with. Only
//! the active node of each category is then applied to the frame.

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Mat4Ext, Quat, Vec3, Vec4};
use crate::render::{AvatarSize, BackgroundDesc, FogDesc, NavigationMode};
use crate::traversal::{BindableKind, BindableNode, TraversalContext, TraversalPass};
use super::graph::{NodeBehavior, NodeKind, SceneGraph};

fn register(kind: BindableKind, node: NodeId, wants_bind: bool, world: &mut Mat4, ctx: &mut TraversalContext<'_>) {
    if ctx.pass == TraversalPass::RenderBindable {
        *world = ctx.model_matrix;
        ctx.register_bindable(kind, node, wants_bind);
    }
}

/// Clear color and sky orientation
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    /// Sky color
    pub color: Vec3,
    /// Take over the stack when first registered
    pub set_bind: bool,
    world: Mat4,
}

impl Background {
    /// Background clearing to `color`
    pub fn new(color: Vec3) -> Self {
        Self { color, set_bind: false, world: Mat4::identity() }
    }
}

impl BindableNode for Background {
    fn bindable_kind(&self) -> BindableKind {
        BindableKind::Background
    }

    fn wants_bind(&self) -> bool {
        self.set_bind
    }

    fn apply(&mut self, _node: NodeId, ctx: &mut TraversalContext<'_>) {
        let mut orientation = self.world;
        orientation.fixed_view_mut::<3, 1>(0, 3).fill(0.0);
        let desc = BackgroundDesc { color: Vec4::new(self.color.x, self.color.y, self.color.z, 1.0), orientation };
        let backend = ctx.backend();
        backend.push_matrix();
        backend.mult_matrix(&orientation);
        backend.draw_background(&desc);
        backend.pop_matrix();
    }
}

impl NodeBehavior for Background {
    fn kind(&self) -> NodeKind {
        NodeKind::Bindable(BindableKind::Background)
    }

    fn render(&mut self, node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        register(BindableKind::Background, node, self.set_bind, &mut self.world, ctx);
    }

    fn as_bindable(&mut self) -> Option<&mut dyn BindableNode> {
        Some(self)
    }
}

/// Camera placement
///
/// Binding a viewpoint moves the camera to it. While it stays bound the
/// user may navigate freely; changing its fields moves the camera again.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewpoint {
    position: Vec3,
    orientation: Quat,
    fov: f32,
    /// Take over the stack when first registered
    pub set_bind: bool,
    changed: bool,
    world: Mat4,
}

impl Viewpoint {
    /// Viewpoint at `position` looking down -Z with a 45 degree field of view
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::identity(),
            fov: std::f32::consts::FRAC_PI_4,
            set_bind: false,
            changed: true,
            world: Mat4::identity(),
        }
    }

    /// Rotate the view
    #[must_use]
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Field of view in radians
    #[must_use]
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    /// Move the viewpoint
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.changed = true;
    }

    /// Local position
    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl BindableNode for Viewpoint {
    fn bindable_kind(&self) -> BindableKind {
        BindableKind::Viewpoint
    }

    fn wants_bind(&self) -> bool {
        self.set_bind
    }

    fn apply(&mut self, node: NodeId, ctx: &mut TraversalContext<'_>) {
        if ctx.camera.bound_viewpoint == Some(node) && !self.changed {
            return;
        }
        let eye = self.world.transform_point3(&self.position);
        let dir = self.world.transform_dir(&(self.orientation * -Vec3::z()));
        let up = self.world.transform_dir(&(self.orientation * Vec3::y()));
        log::debug!("Binding viewpoint {:?} at {:?}", node, eye);
        ctx.camera.look_at(eye, eye + dir, up);
        ctx.camera.fov = self.fov;
        ctx.camera.last_position = eye;
        ctx.camera.bound_viewpoint = Some(node);
        ctx.camera.update_frustum();
        self.changed = false;
    }
}

impl NodeBehavior for Viewpoint {
    fn kind(&self) -> NodeKind {
        NodeKind::Bindable(BindableKind::Viewpoint)
    }

    fn render(&mut self, node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        register(BindableKind::Viewpoint, node, self.set_bind, &mut self.world, ctx);
    }

    fn as_bindable(&mut self) -> Option<&mut dyn BindableNode> {
        Some(self)
    }
}

/// Distance fog
#[derive(Debug, Clone, PartialEq)]
pub struct Fog {
    /// Fog color
    pub color: Vec3,
    /// Distance at which objects are fully fogged; 0 disables
    pub visibility_range: f32,
    /// Exponential rather than linear falloff
    pub exponential: bool,
    /// Take over the stack when first registered
    pub set_bind: bool,
    world: Mat4,
}

impl Fog {
    /// Linear fog
    pub fn linear(color: Vec3, visibility_range: f32) -> Self {
        Self { color, visibility_range, exponential: false, set_bind: false, world: Mat4::identity() }
    }
}

impl BindableNode for Fog {
    fn bindable_kind(&self) -> BindableKind {
        BindableKind::Fog
    }

    fn wants_bind(&self) -> bool {
        self.set_bind
    }

    fn apply(&mut self, _node: NodeId, ctx: &mut TraversalContext<'_>) {
        if self.visibility_range <= 0.0 {
            ctx.backend().set_fog(None);
            return;
        }
        let scale = self.world.transform_dir(&Vec3::x()).norm();
        let fog = FogDesc {
            color: self.color,
            visibility_range: self.visibility_range * scale,
            exponential: self.exponential,
        };
        ctx.backend().set_fog(Some(&fog));
    }
}

impl NodeBehavior for Fog {
    fn kind(&self) -> NodeKind {
        NodeKind::Bindable(BindableKind::Fog)
    }

    fn render(&mut self, node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        register(BindableKind::Fog, node, self.set_bind, &mut self.world, ctx);
    }

    fn as_bindable(&mut self) -> Option<&mut dyn BindableNode> {
        Some(self)
    }
}

/// Navigation parameters and avatar size
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationInfo {
    /// Avatar dimensions used by collision
    pub avatar: AvatarSize,
    /// Navigation mode
    pub mode: NavigationMode,
    /// Light attached to the camera
    pub headlight: bool,
    /// Take over the stack when first registered
    pub set_bind: bool,
    world: Mat4,
}

impl Default for NavigationInfo {
    fn default() -> Self {
        Self {
            avatar: AvatarSize::default(),
            mode: NavigationMode::default(),
            headlight: true,
            set_bind: false,
            world: Mat4::identity(),
        }
    }
}

impl NavigationInfo {
    /// Defaults with the given mode
    pub fn new(mode: NavigationMode) -> Self {
        Self { mode, ..Self::default() }
    }
}

impl BindableNode for NavigationInfo {
    fn bindable_kind(&self) -> BindableKind {
        BindableKind::NavigationInfo
    }

    fn wants_bind(&self) -> bool {
        self.set_bind
    }

    fn apply(&mut self, _node: NodeId, ctx: &mut TraversalContext<'_>) {
        // avatar sizes are expressed in the node's coordinate system
        let scale = self.world.transform_dir(&Vec3::x()).norm();
        ctx.camera.avatar = AvatarSize {
            collision_radius: self.avatar.collision_radius * scale,
            height: self.avatar.height * scale,
            step_height: self.avatar.step_height * scale,
        };
        ctx.camera.navigation = self.mode;
        ctx.camera.headlight = self.headlight;
    }
}

impl NodeBehavior for NavigationInfo {
    fn kind(&self) -> NodeKind {
        NodeKind::Bindable(BindableKind::NavigationInfo)
    }

    fn render(&mut self, node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        register(BindableKind::NavigationInfo, node, self.set_bind, &mut self.world, ctx);
    }

    fn as_bindable(&mut self) -> Option<&mut dyn BindableNode> {
        Some(self)
    }
}
