//! Ray picking
//!
//! A `Pick` walk carries a world-space ray in the context. Every drawable
//! culls itself with the near plane relaxed when the ray comes from the
//! pointer, or tests its bounds against the ray otherwise. It skips itself
//! when it lies entirely beyond the best hit so far, and otherwise
//! intersects the ray in its local space. The closest hit wins regardless
//! of visit order.

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3};
use crate::geometry::{GeometryBuilder, Mesh, MeshType, Plane, PlaneRelation, Ray};
use super::context::TraversalContext;
use super::cull::node_cull;

/// Closest intersection found by a pick walk
#[derive(Debug, Clone, PartialEq)]
pub struct HitInfo {
    /// Node that was hit
    pub node: NodeId,
    /// Hit point in the node's local space
    pub local_point: Vec3,
    /// Hit point in world space
    pub world_point: Vec3,
    /// Node's model matrix at the hit
    pub local_to_world: Mat4,
    /// Inverse of `local_to_world`
    pub world_to_local: Mat4,
    /// Surface normal, local space
    pub normal: Vec3,
    /// Texture coordinates at the hit
    pub tex_coords: Vec2,
    /// Squared distance from the ray origin, world space
    pub square_distance: f32,
    /// World ray that produced the hit
    pub ray: Ray,
}

/// Per-walk picking state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickState {
    /// Best hit so far
    pub hit: Option<HitInfo>,
    /// Sensors in scope at the best hit
    pub sensors: Vec<NodeId>,
    /// A sensor holds the pointer; disables branch-and-bound
    pub grabbed: bool,
    /// Nesting depth of layers being picked
    pub layer_depth: usize,
    /// Pointer position in normalized device coordinates, when the ray came from one
    pub ndc: Option<(f32, f32)>,
}

impl PickState {
    /// Fresh state for a new walk
    pub fn new(grabbed: bool) -> Self {
        Self { grabbed, ..Self::default() }
    }

    fn can_prune(&self) -> bool {
        !self.grabbed && self.layer_depth == 0
    }
}

/// Intersect the context ray with one drawable
///
/// `geometry` supplies the closed-form local test when it has one; the mesh
/// test is used otherwise. Returns true when the node became the best hit.
pub fn pick_drawable(
    node: NodeId,
    mesh: &Mesh,
    geometry: &dyn GeometryBuilder,
    ctx: &mut TraversalContext<'_>,
) -> bool {
    if mesh.mesh_type != MeshType::Triangles && !geometry.is_2d() {
        return false;
    }
    let Some(ray) = ctx.ray else { return false };

    // only a ray cast from the camera is bounded by what the camera sees
    if ctx.pick.ndc.is_some() {
        let cull_backup = ctx.cull_flag;
        let visible = node_cull(ctx, mesh.bounds(), true);
        ctx.cull_flag = cull_backup;
        if !visible {
            return false;
        }
    }

    let Some(world_to_local) = ctx.model_matrix.checked_inverse() else {
        log::debug!("Singular model matrix on {:?}, not pickable", node);
        return false;
    };
    let local_ray = ray.transformed(&world_to_local);
    if !local_ray.is_valid() {
        return false;
    }
    if ctx.pick.ndc.is_none() && mesh.bounds().intersect_ray(&local_ray).is_none() {
        return false;
    }

    if ctx.pick.can_prune() {
        if let Some(best) = &ctx.pick.hit {
            let local_best = world_to_local.transform_point3(&best.world_point);
            let beyond = Plane::from_point_normal(local_best, local_ray.direction);
            if mesh.bounds().plane_relation(&beyond) == PlaneRelation::Front {
                log::trace!("Pick skipped {:?}, entirely beyond current hit", node);
                return false;
            }
        }
    }

    let local_hit = if geometry.has_exact_intersection() {
        geometry.intersect_ray(&local_ray)
    } else {
        mesh.intersect_ray(&local_ray)
    };
    let Some(local_hit) = local_hit else { return false };

    let world_point = ctx.model_matrix.transform_point3(&local_hit.point);
    if let Some(rect) = &ctx.clip_rect {
        if !rect.contains(world_point.x, world_point.y) {
            return false;
        }
    }
    if ctx.clip_planes.iter().any(|plane| plane.distance_to_point(world_point) < 0.0) {
        return false;
    }

    let square_distance = (world_point - ray.origin).norm_squared();
    if let Some(best) = &ctx.pick.hit {
        if square_distance + ctx.settings().hit_epsilon >= best.square_distance {
            return false;
        }
    }

    log::debug!("Pick hit {:?} at {:?} (d2 = {})", node, world_point, square_distance);
    ctx.pick.hit = Some(HitInfo {
        node,
        local_point: local_hit.point,
        world_point,
        local_to_world: ctx.model_matrix,
        world_to_local,
        normal: local_hit.normal,
        tex_coords: local_hit.tex_coords,
        square_distance,
        ray,
    });
    ctx.pick.sensors.clone_from(&ctx.sensors);
    true
}
