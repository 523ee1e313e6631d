//! Drawable geometry

use crate::foundation::collections::NodeId;
use crate::geometry::{GeometryBuilder, Mesh};
use crate::render::{Appearance, DrawState};
use crate::traversal::deferred::DeferredEntry;
use crate::traversal::{collide_drawable, node_cull, pick_drawable, TraversalContext, TraversalPass};
use super::graph::{DirtyFlags, NodeBehavior, NodeKind, SceneGraph};

/// Geometry plus appearance
///
/// The mesh is built lazily from the geometry builder the first time it is
/// needed and again whenever the node is marked `GEOMETRY_DIRTY`.
#[derive(Debug)]
pub struct Shape {
    geometry: Box<dyn GeometryBuilder>,
    /// Material and texture
    pub appearance: Appearance,
    mesh: Option<Mesh>,
}

impl Shape {
    /// Shape with the default appearance
    pub fn new(geometry: impl GeometryBuilder + 'static) -> Self {
        Self { geometry: Box::new(geometry), appearance: Appearance::default(), mesh: None }
    }

    /// Set the appearance
    #[must_use]
    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }

    /// Replace the geometry; the mesh is rebuilt on next use
    pub fn set_geometry(&mut self, geometry: impl GeometryBuilder + 'static) {
        self.geometry = Box::new(geometry);
        self.mesh = None;
    }

    /// The geometry builder
    pub fn geometry(&self) -> &dyn GeometryBuilder {
        self.geometry.as_ref()
    }

    /// Cached mesh, if built
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    fn ensure_mesh(&mut self, node: NodeId, graph: &mut SceneGraph) {
        if self.mesh.is_none() || graph.dirty(node).contains(DirtyFlags::GEOMETRY_DIRTY) {
            let mesh = self.geometry.build();
            log::trace!("Built mesh for {:?}: {} triangles", node, mesh.triangle_count());
            self.mesh = Some(mesh);
            graph.clear_dirty(node, DirtyFlags::GEOMETRY_DIRTY);
        }
    }

    /// Whether drawing needs blending under the context's color transform
    pub fn is_transparent(&self, ctx: &TraversalContext<'_>) -> bool {
        self.appearance.material.as_ref().is_some_and(|m| m.has_alpha())
            || self.appearance.texture.is_some_and(|t| t.transparent)
            || !ctx.color_transform.is_identity()
            || self.mesh.as_ref().is_some_and(Mesh::has_alpha)
    }

    fn draw(&self, mesh: &Mesh, ctx: &mut TraversalContext<'_>) {
        let state = DrawState {
            model_matrix: ctx.model_matrix,
            color_transform: ctx.color_transform,
            cull_flag: ctx.cull_flag,
        };
        let backend = ctx.backend();
        backend.set_material(self.appearance.material.as_ref(), &state.color_transform);
        if let Some(texture) = &self.appearance.texture {
            backend.enable_texture(texture);
        }
        backend.draw_mesh(mesh, &state);
        if self.appearance.texture.is_some() {
            backend.disable_texture();
        }
        ctx.stats.drawn += 1;
    }

    fn sort(&self, node: NodeId, mesh: &Mesh, ctx: &mut TraversalContext<'_>) {
        if ctx.switched_off {
            return;
        }
        let cull_backup = ctx.cull_flag;
        if !node_cull(ctx, mesh.bounds(), false) {
            ctx.cull_flag = cull_backup;
            return;
        }
        if self.geometry.is_2d() || !ctx.camera.is_3d || !self.is_transparent(ctx) {
            self.draw(mesh, ctx);
        } else {
            let entry = DeferredEntry::capture(node, mesh.bounds(), ctx);
            ctx.deferred.enqueue(entry);
        }
        ctx.cull_flag = cull_backup;
    }
}

impl NodeBehavior for Shape {
    fn kind(&self) -> NodeKind {
        NodeKind::Shape
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        if matches!(ctx.pass, TraversalPass::Lighting | TraversalPass::RenderBindable) {
            return;
        }
        self.ensure_mesh(node, graph);
        let Some(mesh) = &self.mesh else { return };
        match ctx.pass {
            TraversalPass::Bounds => {
                ctx.bbox = *mesh.bounds();
                graph.clear_dirty(node, DirtyFlags::NODE_DIRTY);
            }
            TraversalPass::Sort => self.sort(node, mesh, ctx),
            TraversalPass::Render => self.draw(mesh, ctx),
            TraversalPass::Pick => {
                pick_drawable(node, mesh, self.geometry.as_ref(), ctx);
            }
            TraversalPass::Collide => collide_drawable(mesh, self.geometry.is_2d(), ctx),
            TraversalPass::Lighting | TraversalPass::RenderBindable => {}
        }
    }

    fn destroy(&mut self) {
        self.mesh = None;
    }
}
