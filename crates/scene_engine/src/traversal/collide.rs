//! Camera collision and gravity
//!
//! Movement from the last stable eye position to the requested one is cut
//! into steps no longer than the avatar collision radius. After each step a
//! `Collide` walk lets every drawable report the closest face within reach
//! of the eye and, on the first step, the ground below it.

use crate::core::config::CollisionMode;
use crate::events::SceneEvent;
use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4Ext;
use crate::geometry::{Mesh, MeshType, Ray};
use crate::render::{CollideFlags, NavigationMode};
use crate::scene::SceneGraph;
use super::context::TraversalContext;
use super::cull::node_cull;
use super::pass::TraversalPass;

/// Height changes smaller than this do not move the avatar
const GROUND_SETTLE_EPSILON: f32 = 1.0e-3;

/// What a collision check did to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionOutcome {
    /// Nothing checked: no movement, or collisions disabled
    #[default]
    Skipped,
    /// The move went through unobstructed
    Clear,
    /// The camera was put back at its last stable position
    Reverted,
    /// The camera was pushed out of an obstacle
    Slid,
}

/// Probe one drawable against the camera
///
/// Updates the camera's closest collision and ground records when this
/// mesh is nearer than what was found so far in the walk.
pub fn collide_drawable(mesh: &Mesh, is_2d: bool, ctx: &mut TraversalContext<'_>) {
    if is_2d || mesh.mesh_type != MeshType::Triangles {
        return;
    }
    let cull_backup = ctx.cull_flag;
    let visible = node_cull(ctx, mesh.bounds(), true);
    ctx.cull_flag = cull_backup;
    if !visible {
        return;
    }
    let model = ctx.model_matrix;
    let Some(world_to_local) = model.checked_inverse() else { return };

    let camera = &mut ctx.camera;
    let radius = camera.avatar.collision_radius;
    let local_eye = world_to_local.transform_point3(&camera.position);
    let forward = world_to_local.transform_dir(&(camera.direction() * radius)).norm();
    let side = world_to_local.transform_dir(&(camera.right() * radius)).norm();
    let reach = forward.min(side);

    if let Some(local_point) = mesh.closest_face(local_eye, reach) {
        let point = model.transform_point3(&local_point);
        let dist = (point - camera.position).norm();
        if !camera.collide_flags.contains(CollideFlags::COLLISION) || dist < camera.collide_dist {
            camera.collide_flags |= CollideFlags::COLLISION;
            camera.collide_dist = dist;
            camera.collide_point = point;
            log::trace!("Collision probe hit at {:?} (dist {})", point, dist);
        }
    }

    if camera.collide_flags.contains(CollideFlags::DO_GRAVITY) {
        let down = Ray::new(camera.position, -camera.up).transformed(&world_to_local);
        if let Some(hit) = mesh.intersect_ray(&down) {
            let point = model.transform_point3(&hit.point);
            let dist = (point - camera.position).norm();
            if !camera.collide_flags.contains(CollideFlags::GROUND) || dist < camera.ground_dist {
                camera.collide_flags |= CollideFlags::GROUND;
                camera.ground_dist = dist;
                camera.ground_point = point;
            }
        }
    }
}

/// Resolve the camera's move from `last_position` to `position`
///
/// Runs as many `Collide` walks over `root` as there are steps, then reverts,
/// slides or settles the camera according to the configured mode.
pub fn check_collisions(graph: &mut SceneGraph, root: NodeId, ctx: &mut TraversalContext<'_>) -> CollisionOutcome {
    let settings = *ctx.settings();
    if settings.collision_mode == CollisionMode::None
        || ctx.camera.navigation == NavigationMode::Examine
        || !ctx.camera.is_3d
    {
        ctx.camera.on_ground = false;
        ctx.camera.last_position = ctx.camera.position;
        return CollisionOutcome::Skipped;
    }
    if !ctx.camera.has_moved() {
        return CollisionOutcome::Skipped;
    }

    let saved_pass = ctx.pass;
    let snapshot = ctx.snapshot();
    ctx.pass = TraversalPass::Collide;
    ctx.camera.reset_collision_probe();
    let gravity = ctx.camera.navigation == NavigationMode::Walk && settings.gravity;
    if gravity {
        ctx.camera.collide_flags |= CollideFlags::DO_GRAVITY;
    }

    let start = ctx.camera.last_position;
    let delta = ctx.camera.position - start;
    let mut remaining = delta.norm();
    let dir = delta / remaining;
    let step = ctx.camera.avatar.collision_radius.max(f32::EPSILON);
    let target_offset = ctx.camera.target - ctx.camera.position;

    let mut travelled = 0.0;
    loop {
        let last_step = remaining <= step;
        if last_step {
            travelled += remaining;
        } else {
            remaining -= step;
            travelled += step;
        }
        // probe from the step position, with the view carried along
        ctx.camera.position = start + dir * travelled;
        ctx.camera.target = ctx.camera.position + target_offset;
        ctx.camera.update_frustum();
        graph.traverse(root, ctx);
        if ctx.camera.collide_flags.contains(CollideFlags::COLLISION) || last_step {
            break;
        }
        ctx.camera.collide_flags.remove(CollideFlags::DO_GRAVITY);
    }
    ctx.restore(&snapshot);
    ctx.pass = saved_pass;

    let camera = &mut ctx.camera;
    let mut outcome = CollisionOutcome::Clear;
    let was_on_ground = camera.on_ground;

    if camera.collide_flags.contains(CollideFlags::GROUND) {
        let diff = camera.ground_dist - camera.avatar.height;
        if camera.on_ground && -diff > camera.avatar.step_height {
            log::debug!("Obstacle too high to step on ({}), reverting", -diff);
            camera.position = camera.last_position;
            outcome = CollisionOutcome::Reverted;
        } else if camera.jumping {
            log::trace!("Jumping, ground settle skipped");
        } else {
            if diff.abs() > GROUND_SETTLE_EPSILON {
                let offset = camera.up * -diff;
                camera.position += offset;
                log::trace!("Ground settle offset {:?}", offset);
            }
            camera.on_ground = true;
        }
    } else if gravity {
        camera.on_ground = false;
    }

    if camera.collide_flags.contains(CollideFlags::COLLISION) {
        ctx.events.push(SceneEvent::CollisionDetected { point: camera.collide_point });
        match settings.collision_mode {
            CollisionMode::Revert => {
                log::debug!("Collision detected, restoring previous avatar position");
                camera.position = camera.last_position;
                outcome = CollisionOutcome::Reverted;
            }
            _ => {
                let radius = camera.avatar.collision_radius;
                let away = (camera.position - camera.collide_point).try_normalize(f32::EPSILON);
                match away {
                    Some(away) if camera.collide_dist > f32::EPSILON => {
                        if camera.collide_dist >= radius {
                            log::warn!("Collision distance {} exceeds avatar radius {}", camera.collide_dist, radius);
                            camera.collide_dist = radius;
                        }
                        let push = away * (radius - camera.collide_dist);
                        log::debug!("Sliding camera by {:?}", push);
                        camera.position += push;
                        outcome = CollisionOutcome::Slid;
                    }
                    _ => {
                        log::debug!("Camera on hit point, restoring previous avatar position");
                        camera.position = camera.last_position;
                        outcome = CollisionOutcome::Reverted;
                    }
                }
            }
        }
    }

    camera.target = camera.position + target_offset;
    camera.last_position = camera.position;
    camera.update_frustum();
    if camera.on_ground != was_on_ground {
        let on_ground = camera.on_ground;
        ctx.events.push(SceneEvent::GroundContactChanged { on_ground });
    }
    outcome
}
