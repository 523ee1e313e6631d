//! Nested surfaces
//!
//! A layer draws its children as an independent scene: its own camera, its
//! own bindable stacks and its own deferred queue, on top of whatever the
//! parent drew before it. Bindables inside never reach the parent's stacks
//! and the parent's never reach the layer's.

use crate::foundation::collections::NodeId;
use crate::render::Camera;
use crate::traversal::{
    render_passes, BindableStacks, CullFlag, DeferredQueue, GroupCache, TraversalContext, TraversalPass,
};
use super::graph::{NodeBehavior, NodeKind, SceneGraph};

/// Parent state parked while the layer walks its children
struct ParentState {
    camera: Camera,
    bindables: BindableStacks,
    deferred: DeferredQueue,
    cull_flag: CullFlag,
}

/// Isolated sub-scene
#[derive(Debug)]
pub struct Layer {
    cache: GroupCache,
    camera: Option<Camera>,
    bindables: BindableStacks,
    is_3d: bool,
}

impl Layer {
    /// Layer with a perspective camera
    pub fn new_3d() -> Self {
        Self { cache: GroupCache::new(), camera: None, bindables: BindableStacks::new(), is_3d: true }
    }

    /// Layer with a flat camera
    pub fn new_2d() -> Self {
        Self { is_3d: false, ..Self::new_3d() }
    }

    /// The layer's own bindable stacks
    pub fn bindables(&self) -> &BindableStacks {
        &self.bindables
    }

    /// Camera used by the last frame, if drawn already
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> ParentState {
        let (width, height) = (ctx.camera.width, ctx.camera.height);
        let mut camera = self.camera.take().unwrap_or_else(|| {
            if self.is_3d {
                Camera::default_placement(width, height)
            } else {
                Camera::orthographic_2d(width, height)
            }
        });
        camera.set_viewport(width, height);
        ParentState {
            camera: std::mem::replace(&mut ctx.camera, camera),
            bindables: std::mem::replace(&mut ctx.bindables, std::mem::take(&mut self.bindables)),
            deferred: std::mem::take(&mut ctx.deferred),
            cull_flag: std::mem::replace(&mut ctx.cull_flag, CullFlag::Intersects),
        }
    }

    fn leave(&mut self, ctx: &mut TraversalContext<'_>, parent: ParentState) {
        self.camera = Some(std::mem::replace(&mut ctx.camera, parent.camera));
        self.bindables = std::mem::replace(&mut ctx.bindables, parent.bindables);
        ctx.deferred = parent.deferred;
        ctx.cull_flag = parent.cull_flag;
    }

    fn draw(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        let parent = self.enter(ctx);
        let cache = &mut self.cache;
        render_passes(graph, ctx, |graph, ctx| cache.traverse(node, graph, ctx, None));
        self.leave(ctx, parent);
        let camera = ctx.camera.clone();
        ctx.backend().set_viewport_camera(&camera);
    }

    fn pick(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        let parent = self.enter(ctx);
        ctx.camera.update_frustum();
        let saved_ray = ctx.ray;
        if let Some((x, y)) = ctx.pick.ndc {
            ctx.ray = ctx.camera.pick_ray(x, y).or(saved_ray);
        }
        ctx.pick.layer_depth += 1;
        self.cache.traverse(node, graph, ctx, None);
        ctx.pick.layer_depth -= 1;
        ctx.ray = saved_ray;
        self.leave(ctx, parent);
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new_3d()
    }
}

impl NodeBehavior for Layer {
    fn kind(&self) -> NodeKind {
        NodeKind::Layer
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        match ctx.pass {
            TraversalPass::Bounds => self.cache.traverse(node, graph, ctx, None),
            TraversalPass::Sort => self.draw(node, graph, ctx),
            TraversalPass::Pick => self.pick(node, graph, ctx),
            // the layer resolves its own bindables and lights inside `Sort`
            _ => {}
        }
    }
}
