//! Composite nodes
//!
//! All of them delegate child handling to a [`GroupCache`] and only add the
//! state they push onto the context around it.

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Transform};
use crate::geometry::Plane;
use crate::render::{ClipRect, ColorTransform};
use crate::traversal::{GroupCache, TraversalContext, TraversalPass};
use super::graph::{NodeBehavior, NodeKind, SceneGraph};

/// Plain grouping node
#[derive(Debug, Default)]
pub struct Group {
    cache: GroupCache,
}

impl Group {
    /// Empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Group whose subtree is never culled
    pub fn cull_exempt() -> Self {
        let mut group = Self::default();
        group.cache.skip_culling = true;
        group
    }

    /// Cached subtree state
    pub fn cache(&self) -> &GroupCache {
        &self.cache
    }
}

impl NodeBehavior for Group {
    fn kind(&self) -> NodeKind {
        NodeKind::Grouping
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        self.cache.traverse(node, graph, ctx, None);
    }
}

/// Group with a local coordinate system
#[derive(Debug)]
pub struct TransformNode {
    cache: GroupCache,
    matrix: Mat4,
}

impl TransformNode {
    /// Group placed by `matrix`
    pub fn new(matrix: Mat4) -> Self {
        Self { cache: GroupCache::new(), matrix }
    }

    /// Group placed by a position/rotation/scale transform
    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.to_matrix())
    }

    /// Local to parent matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Replace the local matrix; edit through [`SceneGraph::edit`] so bounds refresh
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }

    /// Cached subtree state, in local coordinates
    pub fn cache(&self) -> &GroupCache {
        &self.cache
    }
}

impl NodeBehavior for TransformNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Grouping
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        if ctx.pass == TraversalPass::Bounds {
            self.cache.traverse(node, graph, ctx, None);
            if ctx.bbox.is_set() {
                ctx.bbox = ctx.bbox.transformed(&self.matrix);
            }
            return;
        }
        let parent = ctx.model_matrix;
        ctx.model_matrix = parent * self.matrix;
        self.cache.traverse(node, graph, ctx, None);
        ctx.model_matrix = parent;
    }
}

/// Group drawing its children by ascending priority
///
/// Children without a priority keep their list position, after the
/// prioritized ones.
#[derive(Debug, Default)]
pub struct OrderedGroup {
    cache: GroupCache,
    priorities: Vec<f32>,
}

impl OrderedGroup {
    /// Group with one priority per child
    pub fn new(priorities: Vec<f32>) -> Self {
        Self { cache: GroupCache::new(), priorities }
    }

    /// Replace the priorities; edit through [`SceneGraph::edit`]
    pub fn set_priorities(&mut self, priorities: Vec<f32>) {
        self.priorities = priorities;
    }

    /// Child indices in drawing order
    pub fn draw_order(&self, child_count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..child_count).collect();
        order.sort_by(|&a, &b| {
            let pa = self.priorities.get(a).copied().unwrap_or(f32::INFINITY);
            let pb = self.priorities.get(b).copied().unwrap_or(f32::INFINITY);
            pa.total_cmp(&pb)
        });
        order
    }
}

impl NodeBehavior for OrderedGroup {
    fn kind(&self) -> NodeKind {
        NodeKind::Grouping
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        if ctx.pass.is_drawing() {
            let order = self.draw_order(graph.children(node).len());
            self.cache.traverse(node, graph, ctx, Some(&order));
        } else {
            self.cache.traverse(node, graph, ctx, None);
        }
    }
}

/// Group rendering at most one of its children
///
/// The other children are still walked, switched off, during `Sort` and
/// `RenderBindable` so their environment nodes keep registering.
#[derive(Debug, Default)]
pub struct Switch {
    cache: GroupCache,
    which_choice: Option<usize>,
}

impl Switch {
    /// Switch showing child `which_choice`, or nothing
    pub fn new(which_choice: Option<usize>) -> Self {
        Self { cache: GroupCache::new(), which_choice }
    }

    /// Selected child
    pub fn which_choice(&self) -> Option<usize> {
        self.which_choice
    }

    /// Select another child; edit through [`SceneGraph::edit`] so bounds refresh
    pub fn set_which_choice(&mut self, which_choice: Option<usize>) {
        self.which_choice = which_choice;
    }

    /// Cached subtree state of the chosen child
    pub fn cache(&self) -> &GroupCache {
        &self.cache
    }
}

impl NodeBehavior for Switch {
    fn kind(&self) -> NodeKind {
        NodeKind::Grouping
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        let choice: Vec<usize> = self.which_choice.into_iter().collect();
        self.cache.traverse(node, graph, ctx, Some(&choice));

        if matches!(ctx.pass, TraversalPass::Sort | TraversalPass::RenderBindable) {
            let children = graph.children(node).to_vec();
            for (index, child) in children.into_iter().enumerate() {
                if Some(index) == self.which_choice {
                    continue;
                }
                let snapshot = ctx.snapshot();
                ctx.switched_off = true;
                graph.traverse(child, ctx);
                ctx.restore(&snapshot);
            }
        }
    }
}

/// Group applying a color transform to its subtree
#[derive(Debug)]
pub struct ColorTransformGroup {
    cache: GroupCache,
    transform: ColorTransform,
}

impl ColorTransformGroup {
    /// Group applying `transform`
    pub fn new(transform: ColorTransform) -> Self {
        Self { cache: GroupCache::new(), transform }
    }

    /// Replace the transform
    pub fn set_transform(&mut self, transform: ColorTransform) {
        self.transform = transform;
    }
}

impl NodeBehavior for ColorTransformGroup {
    fn kind(&self) -> NodeKind {
        NodeKind::Grouping
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        if ctx.pass == TraversalPass::Bounds {
            self.cache.traverse(node, graph, ctx, None);
            return;
        }
        let parent = ctx.color_transform;
        ctx.color_transform = parent.compose(&self.transform);
        self.cache.traverse(node, graph, ctx, None);
        ctx.color_transform = parent;
    }
}

/// Group clipping its subtree to a rectangle and/or a half-space
///
/// Both are given in the group's local coordinates. Nested rectangles
/// intersect; planes accumulate up to the configured limit.
#[derive(Debug, Default)]
pub struct Clipper {
    cache: GroupCache,
    rect: Option<ClipRect>,
    plane: Option<Plane>,
}

impl Clipper {
    /// Clip to a rectangle
    pub fn rect(rect: ClipRect) -> Self {
        Self { rect: Some(rect), ..Self::default() }
    }

    /// Keep only the positive side of `plane`
    pub fn plane(plane: Plane) -> Self {
        Self { plane: Some(plane), ..Self::default() }
    }

    /// Add a half-space to a rectangle clipper
    #[must_use]
    pub fn with_plane(mut self, plane: Plane) -> Self {
        self.plane = Some(plane);
        self
    }
}

impl NodeBehavior for Clipper {
    fn kind(&self) -> NodeKind {
        NodeKind::Grouping
    }

    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        if ctx.pass == TraversalPass::Bounds {
            self.cache.traverse(node, graph, ctx, None);
            return;
        }

        let drawing = ctx.pass.is_drawing();
        let saved_rect = ctx.clip_rect;
        if let Some(rect) = &self.rect {
            let world = rect.transformed(&ctx.model_matrix);
            let clipped = saved_rect.map_or(world, |outer| outer.intersection(&world));
            ctx.clip_rect = Some(clipped);
            if drawing {
                ctx.backend().set_clip_rect(&clipped);
            }
        }
        let world_plane = self.plane.as_ref().and_then(|plane| plane.transformed(&ctx.model_matrix));
        let plane_applied = world_plane.is_some_and(|plane| ctx.push_clip_plane(plane));

        self.cache.traverse(node, graph, ctx, None);

        ctx.pop_clip_plane(plane_applied);
        if self.rect.is_some() && drawing {
            match saved_rect {
                Some(outer) => ctx.backend().set_clip_rect(&outer),
                None => ctx.backend().reset_clip_rect(),
            }
        }
        ctx.clip_rect = saved_rect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_order_by_priority() {
        let group = OrderedGroup::new(vec![2.0, -1.0, 0.5]);
        assert_eq!(group.draw_order(3), vec![1, 2, 0]);
    }

    #[test]
    fn test_draw_order_missing_priorities_go_last_stable() {
        let group = OrderedGroup::new(vec![1.0, 0.0]);
        assert_eq!(group.draw_order(4), vec![1, 0, 2, 3]);
        let group = OrderedGroup::new(vec![3.0, 3.0, 3.0]);
        assert_eq!(group.draw_order(3), vec![0, 1, 2]);
    }
}
