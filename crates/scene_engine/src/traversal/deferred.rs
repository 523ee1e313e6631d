//! Back-to-front queue for transparent draws
//!
//! Transparent shapes met during `Sort` are captured together with the
//! state they were reached with and drawn after the walk, farthest first.

use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::geometry::{BoundingBox, Plane};
use crate::render::{ClipRect, ColorTransform};
use crate::scene::SceneGraph;
use super::context::{LightContext, TraversalContext};
use super::cull::CullFlag;
use super::pass::TraversalPass;

/// A transparent draw waiting for the flush
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredEntry {
    /// Shape to draw
    pub node: NodeId,
    /// Model matrix at capture
    pub model_matrix: Mat4,
    /// Color transform at capture
    pub color_transform: ColorTransform,
    /// Local lights in scope at capture
    pub lights: Vec<LightContext>,
    /// Clip rectangle at capture
    pub clip_rect: Option<ClipRect>,
    /// Clip planes at capture
    pub clip_planes: Vec<Plane>,
    /// Cull flag at capture
    pub cull_flag: CullFlag,
    /// Camera-space depth; larger is farther
    pub sort_key: f32,
}

impl DeferredEntry {
    /// Capture the context state for `node` whose local bounds are `bounds`
    pub fn capture(node: NodeId, bounds: &BoundingBox, ctx: &TraversalContext<'_>) -> Self {
        Self {
            node,
            model_matrix: ctx.model_matrix,
            color_transform: ctx.color_transform,
            lights: ctx.local_lights.clone(),
            clip_rect: ctx.clip_rect,
            clip_planes: ctx.clip_planes.clone(),
            cull_flag: ctx.cull_flag,
            sort_key: sort_key(&ctx.camera.view_matrix(), &ctx.model_matrix, bounds),
        }
    }
}

/// Depth of the nearest edge of `bounds` in camera space, negated
///
/// The camera looks down -Z, so the box's maximum z is its nearest extent.
pub fn sort_key(view: &Mat4, model: &Mat4, bounds: &BoundingBox) -> f32 {
    let view_bounds = bounds.transformed(&(view * model));
    -view_bounds.max.z
}

/// Entries ordered by descending sort key, first-seen first among equals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeferredQueue {
    entries: Vec<DeferredEntry>,
}

impl DeferredQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert before the first entry with a strictly smaller key
    pub fn enqueue(&mut self, entry: DeferredEntry) {
        let index = self
            .entries
            .iter()
            .position(|e| e.sort_key < entry.sort_key)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
    }

    /// Number of entries waiting
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in flush order
    pub fn entries(&self) -> &[DeferredEntry] {
        &self.entries
    }

    /// Drop every entry without drawing
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Draw every entry in order, consuming the queue
    ///
    /// Each entry's lights are switched on, its clip state sent to the
    /// backend, the node visited with pass `Render`, then everything is torn
    /// down again in reverse.
    pub fn flush(self, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        let saved_pass = ctx.pass;
        let saved_light_on = ctx.local_light_on;
        for entry in self.entries {
            let snapshot = ctx.snapshot();
            ctx.pass = TraversalPass::Render;

            ctx.local_light_on = true;
            for light in &entry.lights {
                ctx.model_matrix = light.matrix;
                graph.traverse(light.node, ctx);
            }
            if let Some(rect) = entry.clip_rect {
                ctx.backend().set_clip_rect(&rect);
            }
            for plane in &entry.clip_planes {
                ctx.backend().set_clip_plane(plane);
            }

            ctx.model_matrix = entry.model_matrix;
            ctx.color_transform = entry.color_transform;
            ctx.cull_flag = entry.cull_flag;
            ctx.clip_rect = entry.clip_rect;
            graph.traverse(entry.node, ctx);
            ctx.stats.deferred += 1;

            for _ in &entry.clip_planes {
                ctx.backend().reset_clip_plane();
            }
            if entry.clip_rect.is_some() {
                ctx.backend().reset_clip_rect();
            }
            ctx.local_light_on = false;
            for light in entry.lights.iter().rev() {
                ctx.model_matrix = light.matrix;
                graph.traverse(light.node, ctx);
            }
            ctx.restore(&snapshot);
        }
        ctx.pass = saved_pass;
        ctx.local_light_on = saved_light_on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::Camera;
    use slotmap::KeyData;

    fn entry(id: u64, key: f32) -> DeferredEntry {
        DeferredEntry {
            node: NodeId::from(KeyData::from_ffi(id)),
            model_matrix: Mat4::identity(),
            color_transform: ColorTransform::identity(),
            lights: Vec::new(),
            clip_rect: None,
            clip_planes: Vec::new(),
            cull_flag: CullFlag::Intersects,
            sort_key: key,
        }
    }

    #[test]
    fn test_descending_order() {
        let mut queue = DeferredQueue::new();
        queue.enqueue(entry(1, 2.0));
        queue.enqueue(entry(2, 9.0));
        queue.enqueue(entry(3, 5.0));
        let keys: Vec<f32> = queue.entries().iter().map(|e| e.sort_key).collect();
        assert_eq!(keys, vec![9.0, 5.0, 2.0]);
    }

    #[test]
    fn test_equal_keys_keep_insertion_order() {
        let mut queue = DeferredQueue::new();
        let first = entry(1, 3.0);
        let second = entry(2, 3.0);
        let third = entry(3, 3.0);
        let ids = [first.node, second.node, third.node];
        queue.enqueue(first);
        queue.enqueue(entry(4, 7.0));
        queue.enqueue(second);
        queue.enqueue(third);
        let order: Vec<NodeId> = queue.entries().iter().skip(1).map(|e| e.node).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_sort_key_grows_with_distance() {
        let camera = Camera::default_placement(100.0, 100.0);
        let view = camera.view_matrix();
        let bounds = BoundingBox::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        let near = sort_key(&view, &Mat4::new_translation(&Vec3::new(0.0, 0.0, 2.0)), &bounds);
        let far = sort_key(&view, &Mat4::new_translation(&Vec3::new(0.0, 0.0, -4.0)), &bounds);
        assert!(far > near);
        approx::assert_relative_eq!(near, 7.5, epsilon = 1e-4);
    }
}
