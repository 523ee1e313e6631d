//! Shared traversal of composite nodes
//!
//! Every grouping node owns a [`GroupCache`] and delegates its visit to
//! [`GroupCache::traverse`]. The cache holds the subtree bounds and the
//! sensor and local light children, refreshed by a `Bounds` walk whenever
//! the node is `CHILD_DIRTY`.

use crate::foundation::collections::NodeId;
use crate::geometry::BoundingBox;
use crate::scene::{DirtyFlags, NodeKind, SceneGraph};
use super::context::{LightContext, TraversalContext};
use super::cull::node_cull;
use super::pass::TraversalPass;

/// Cached per-group state
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCache {
    bbox: BoundingBox,
    sensors: Vec<NodeId>,
    local_lights: Vec<NodeId>,
    dont_cull: bool,
    /// Never cull this subtree, whatever its bounds
    pub skip_culling: bool,
}

impl Default for GroupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupCache {
    /// Empty cache; the owner starts dirty so it is filled on first visit
    pub fn new() -> Self {
        Self {
            bbox: BoundingBox::empty(),
            sensors: Vec::new(),
            local_lights: Vec::new(),
            dont_cull: false,
            skip_culling: false,
        }
    }

    /// Subtree bounds in the group's local space
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Sensor children
    pub fn sensors(&self) -> &[NodeId] {
        &self.sensors
    }

    /// Local light children
    pub fn local_lights(&self) -> &[NodeId] {
        &self.local_lights
    }

    /// Whether the subtree must not be culled
    pub fn is_cull_exempt(&self) -> bool {
        self.skip_culling || self.dont_cull
    }

    fn refresh_children(&mut self, children: &[NodeId], graph: &SceneGraph) {
        self.sensors.clear();
        self.local_lights.clear();
        for &child in children {
            match graph.kind(child) {
                Some(NodeKind::Sensor) => self.sensors.push(child),
                Some(NodeKind::LocalLight) => self.local_lights.push(child),
                _ => {}
            }
        }
    }

    fn publish_bounds(&self, ctx: &mut TraversalContext<'_>) {
        ctx.bbox = self.bbox;
        ctx.disable_cull = self.is_cull_exempt();
    }

    /// Visit `node`'s children for the current pass
    ///
    /// `order`, when given, lists the child indices to visit and their order.
    /// Indices out of range are ignored. Only visited children contribute
    /// sensors and local lights.
    pub fn traverse(
        &mut self,
        node: NodeId,
        graph: &mut SceneGraph,
        ctx: &mut TraversalContext<'_>,
        order: Option<&[usize]>,
    ) {
        let children = graph.children(node).to_vec();
        let visit: Vec<NodeId> = match order {
            Some(order) => order.iter().filter_map(|&i| children.get(i).copied()).collect(),
            None => children,
        };

        if graph.dirty(node).contains(DirtyFlags::CHILD_DIRTY) {
            if ctx.pass == TraversalPass::Bounds {
                self.refresh_children(&visit, graph);
                self.recompute_bounds(&visit, graph, ctx);
                graph.clear_dirty(node, DirtyFlags::CHILD_DIRTY);
                self.publish_bounds(ctx);
                return;
            }
            let saved_pass = ctx.pass;
            let saved_bbox = ctx.bbox;
            let saved_disable = ctx.disable_cull;
            ctx.pass = TraversalPass::Bounds;
            ctx.stats.bounds_refreshes += 1;
            log::trace!("Refreshing stale bounds of {:?}", node);
            self.traverse(node, graph, ctx, order);
            ctx.pass = saved_pass;
            ctx.bbox = saved_bbox;
            ctx.disable_cull = saved_disable;
        } else if ctx.pass == TraversalPass::Bounds {
            self.publish_bounds(ctx);
            return;
        }
        graph.clear_dirty(node, DirtyFlags::NODE_DIRTY);

        let cull_backup = ctx.cull_flag;
        if ctx.pass == TraversalPass::Sort && !self.is_cull_exempt() && !node_cull(ctx, &self.bbox, false) {
            ctx.cull_flag = cull_backup;
            return;
        }

        let sensors_backup = if ctx.pass == TraversalPass::Pick {
            let enabled: Vec<NodeId> = self
                .sensors
                .iter()
                .copied()
                .filter(|&s| graph.with_sensor(s, |sensor| sensor.is_enabled()) == Some(true))
                .collect();
            if enabled.is_empty() {
                None
            } else {
                Some(std::mem::replace(&mut ctx.sensors, enabled))
            }
        } else {
            None
        };

        let lights_depth = ctx.local_lights.len();
        let lights_on = ctx.pass == TraversalPass::Sort && !self.local_lights.is_empty();
        if lights_on {
            self.switch_lights(graph, ctx, true);
        }

        for child in visit {
            let snapshot = ctx.snapshot();
            graph.traverse(child, ctx);
            ctx.restore(&snapshot);
        }

        if lights_on {
            self.switch_lights(graph, ctx, false);
        }
        ctx.local_lights.truncate(lights_depth);
        if let Some(sensors) = sensors_backup {
            ctx.sensors = sensors;
        }
        ctx.cull_flag = cull_backup;
    }

    fn recompute_bounds(&mut self, visit: &[NodeId], graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        let mut bbox = BoundingBox::empty();
        let mut dont_cull = false;
        for &child in visit {
            ctx.bbox = BoundingBox::empty();
            ctx.disable_cull = false;
            graph.traverse(child, ctx);
            if ctx.bbox.is_set() {
                bbox.union(&ctx.bbox);
            }
            dont_cull |= ctx.disable_cull;
        }
        self.bbox = bbox;
        self.dont_cull = dont_cull;
    }

    /// Switch the group's local lights on (in declaration order) or off (in reverse)
    fn switch_lights(&self, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>, on: bool) {
        let saved_pass = ctx.pass;
        let saved_on = ctx.local_light_on;
        ctx.pass = TraversalPass::Render;
        ctx.local_light_on = on;
        if on {
            for &light in &self.local_lights {
                ctx.local_lights.push(LightContext { node: light, matrix: ctx.model_matrix });
                graph.traverse(light, ctx);
            }
        } else {
            for &light in self.local_lights.iter().rev() {
                graph.traverse(light, ctx);
            }
        }
        ctx.pass = saved_pass;
        ctx.local_light_on = saved_on;
    }
}
