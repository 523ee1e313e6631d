//! Hierarchical frustum culling
//!
//! A volume is classified against the camera frustum as outside, intersecting
//! or inside. The result is cached in the traversal context so that once a
//! group is known to be fully inside, none of its descendants are tested
//! again; callers save the flag before descending and restore it afterward.

use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::BoundingBox;
use crate::render::camera::Frustum;
use super::context::TraversalContext;

/// Visibility of a volume against the view frustum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CullFlag {
    /// Entirely outside; the subtree is pruned
    Outside,
    /// Partly visible, or not tested yet; descendants must test themselves
    #[default]
    Intersects,
    /// Entirely inside; descendants skip their tests
    Inside,
}

/// Classify a local-space box placed by `model` against a world-space frustum
///
/// `skip_near` ignores the near plane, for hit-testing behind the camera.
/// Flat (non-3D) views only test the four side planes.
pub fn classify(
    frustum: &Frustum,
    eye: Vec3,
    is_3d: bool,
    model: &Mat4,
    bbox: &BoundingBox,
    skip_near: bool,
) -> CullFlag {
    if !bbox.is_set() {
        return CullFlag::Outside;
    }
    let world = bbox.transformed(model);

    if is_3d {
        // eye inside the volume: everything around us may be visible
        if world.contains_point(eye) {
            return CullFlag::Intersects;
        }
        if frustum.radius > 0.0 {
            let reach = world.radius + frustum.radius;
            if (world.center - frustum.center).norm_squared() > reach * reach {
                return CullFlag::Outside;
            }
        }
    }

    let first = if !is_3d {
        2
    } else if skip_near {
        1
    } else {
        0
    };

    let vertices = world.vertices();
    let mut result = CullFlag::Inside;
    for (i, plane) in frustum.planes().iter().enumerate().skip(first) {
        let d = plane.distance_to_point(world.center);
        if d < -world.radius {
            return CullFlag::Outside;
        }
        if d >= world.radius {
            continue;
        }
        let p = frustum.p_vertex_index(i);
        if plane.distance_to_point(vertices[p]) < 0.0 {
            return CullFlag::Outside;
        }
        // every plane downgrades, near and far included, so an `Inside`
        // volume never holds a child that is `Outside`
        if plane.distance_to_point(vertices[7 - p]) < 0.0 {
            result = CullFlag::Intersects;
        }
    }
    result
}

/// Cull `bbox` under the context's model matrix, updating the cached flag
///
/// Returns false when the volume is outside. Callers that descend must
/// restore the flag they had before calling.
pub fn node_cull(ctx: &mut TraversalContext<'_>, bbox: &BoundingBox, skip_near: bool) -> bool {
    if ctx.cull_flag == CullFlag::Inside {
        return true;
    }
    if !ctx.settings().culling_enabled {
        ctx.cull_flag = CullFlag::Inside;
        return true;
    }
    let flag = classify(
        ctx.camera.frustum(),
        ctx.camera.position,
        ctx.camera.is_3d,
        &ctx.model_matrix,
        bbox,
        skip_near,
    );
    ctx.cull_flag = flag;
    if flag == CullFlag::Outside {
        ctx.stats.culled += 1;
        log::trace!("Culled volume {:?}..{:?}", bbox.min, bbox.max);
    }
    flag != CullFlag::Outside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Camera;

    fn camera() -> Camera {
        Camera::default_placement(800.0, 600.0)
    }

    fn test(camera: &Camera, bbox: &BoundingBox, skip_near: bool) -> CullFlag {
        classify(camera.frustum(), camera.position, camera.is_3d, &Mat4::identity(), bbox, skip_near)
    }

    #[test]
    fn test_unset_box_is_outside() {
        assert_eq!(test(&camera(), &BoundingBox::empty(), false), CullFlag::Outside);
    }

    #[test]
    fn test_small_box_in_front_is_inside() {
        let bbox = BoundingBox::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5));
        assert_eq!(test(&camera(), &bbox, false), CullFlag::Inside);
    }

    #[test]
    fn test_box_behind_camera_is_outside() {
        let bbox = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, 20.0), Vec3::repeat(0.5));
        assert_eq!(test(&camera(), &bbox, false), CullFlag::Outside);
    }

    #[test]
    fn test_box_straddling_side_plane_intersects() {
        // half-width of the view at z = 0 is roughly 5.5 units
        let bbox = BoundingBox::from_center_extents(Vec3::new(5.5, 0.0, 0.0), Vec3::repeat(1.0));
        assert_eq!(test(&camera(), &bbox, false), CullFlag::Intersects);
    }

    #[test]
    fn test_box_straddling_far_plane_intersects() {
        // default far plane sits 1000 units in front of the eye at z = 10
        let bbox = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, -990.0), Vec3::repeat(1.0));
        assert_eq!(test(&camera(), &bbox, false), CullFlag::Intersects);
    }

    #[test]
    fn test_eye_inside_box_intersects() {
        let bbox = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, 10.0), Vec3::repeat(1.0));
        assert_eq!(test(&camera(), &bbox, false), CullFlag::Intersects);
    }

    #[test]
    fn test_skip_near_keeps_box_between_eye_and_near_plane() {
        let cam = camera();
        // in front of the eye but closer than the near plane
        let bbox = BoundingBox::new(Vec3::new(-0.01, -0.01, 9.95), Vec3::new(0.01, 0.01, 9.96));
        assert_eq!(test(&cam, &bbox, false), CullFlag::Outside);
        assert_ne!(test(&cam, &bbox, true), CullFlag::Outside);
    }

    #[test]
    fn test_transformed_box_uses_model_matrix() {
        let cam = camera();
        let bbox = BoundingBox::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5));
        let model = Mat4::new_translation(&Vec3::new(0.0, 0.0, 30.0));
        let flag = classify(cam.frustum(), cam.position, true, &model, &bbox, false);
        assert_eq!(flag, CullFlag::Outside);
    }

    #[test]
    fn test_nested_boxes_stay_consistent() {
        let mut cam = camera();
        let placements = [
            (Vec3::new(0.0, 0.0, 10.0), Vec3::zeros()),
            (Vec3::new(8.0, 3.0, 8.0), Vec3::new(1.0, 0.0, 0.0)),
            (Vec3::new(-6.0, 1.0, -4.0), Vec3::new(0.0, 0.0, 3.0)),
            (Vec3::new(0.0, 20.0, 0.1), Vec3::zeros()),
        ];
        let outer_boxes = [
            BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            BoundingBox::new(Vec3::new(2.0, -1.0, -3.0), Vec3::new(6.0, 2.0, 1.0)),
            BoundingBox::new(Vec3::new(-9.0, -2.0, -2.0), Vec3::new(-3.0, 4.0, 5.0)),
        ];
        for (eye, target) in placements {
            cam.look_at(eye, target, Vec3::y());
            for outer in &outer_boxes {
                let e = outer.extents() * 0.5;
                for corner in outer.vertices() {
                    let inner_center = (corner + outer.box_center()) * 0.5;
                    let inner = BoundingBox::from_center_extents(inner_center, e * 0.5);
                    let t_outer = test(&cam, outer, false);
                    let t_inner = test(&cam, &inner, false);
                    if t_outer == CullFlag::Inside {
                        assert_eq!(t_inner, CullFlag::Inside);
                    }
                    if t_inner == CullFlag::Inside {
                        assert_ne!(t_outer, CullFlag::Outside);
                    }
                }
            }
        }
    }
}
