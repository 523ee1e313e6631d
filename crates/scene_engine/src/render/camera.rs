//! # Camera and View Frustum
//!
//! The camera holds everything a visual surface knows about the viewer:
//! placement, projection, navigation parameters, the culling frustum derived
//! from them and the scratch state collision detection fills in.
//!
//! ## Coordinate System
//! Right-handed, Y-up world space. The view space camera looks down `-Z` and
//! projections use OpenGL clip space (depth in `[-1, 1]`).

use bitflags::bitflags;

use crate::foundation::collections::NodeId;
use crate::foundation::math::{constants, Mat4, Mat4Ext, Vec3, Vec4};
use crate::geometry::{Plane, Ray};

/// How user input moves the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationMode {
    /// No navigation
    None,
    /// Ground-bound movement; gravity applies
    Walk,
    /// Free flight
    #[default]
    Fly,
    /// Orbit around the scene; no collision
    Examine,
}

/// Physical size of the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarSize {
    /// Distance kept from obstacles; also the collision step length
    pub collision_radius: f32,
    /// Eye height above ground
    pub height: f32,
    /// Tallest obstacle that can be stepped over
    pub step_height: f32,
}

impl Default for AvatarSize {
    fn default() -> Self {
        Self {
            collision_radius: 0.25,
            height: 1.6,
            step_height: 0.75,
        }
    }
}

bitflags! {
    /// Results of the last collision probe
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CollideFlags: u8 {
        /// Some geometry was within the avatar radius
        const COLLISION = 1 << 0;
        /// Ground was found below the avatar
        const GROUND = 1 << 1;
        /// Probe for ground during this walk
        const DO_GRAVITY = 1 << 2;
    }
}

/// Index of each frustum plane in [`Frustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Near plane
    Near = 0,
    /// Far plane
    Far = 1,
    /// Left plane
    Left = 2,
    /// Right plane
    Right = 3,
    /// Bottom plane
    Bottom = 4,
    /// Top plane
    Top = 5,
}

/// Six inward-facing planes plus a bounding sphere
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
    p_indices: [usize; 6],
    /// Center of the sphere enclosing the frustum
    pub center: Vec3,
    /// Radius of the sphere enclosing the frustum
    pub radius: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_projection(&Mat4::identity(), Vec3::zeros(), 0.0)
    }
}

impl Frustum {
    /// Extract planes from a view-projection matrix (Gribb/Hartmann)
    ///
    /// `center`/`radius` describe the enclosing sphere used for the quick
    /// rejection test; pass a zero radius to disable it.
    pub fn from_view_projection(view_proj: &Mat4, center: Vec3, radius: f32) -> Self {
        let row = |i: usize| -> Vec4 { view_proj.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let raw = [r3 + r2, r3 - r2, r3 + r0, r3 - r0, r3 + r1, r3 - r1];
        let mut planes = [Plane::new(Vec3::z(), 0.0); 6];
        let mut p_indices = [0; 6];
        for (i, coeffs) in raw.iter().enumerate() {
            let normal = Vec3::new(coeffs.x, coeffs.y, coeffs.z);
            let len = normal.norm();
            planes[i] = if len > f32::EPSILON {
                Plane::new(normal / len, coeffs.w / len)
            } else {
                Plane::new(normal, coeffs.w)
            };
            p_indices[i] = crate::geometry::BoundingBox::p_vertex_index(&planes[i].normal);
        }
        Self { planes, p_indices, center, radius }
    }

    /// All planes, ordered as [`FrustumPlane`]
    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// One plane
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// Corner index of the box vertex farthest along plane `i`
    pub fn p_vertex_index(&self, i: usize) -> usize {
        self.p_indices[i]
    }
}

/// Viewer placement, projection and navigation state
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera is looking at in world space
    pub target: Vec3,
    /// Up vector for camera orientation
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    /// Perspective 3D camera when true, flat orthographic otherwise
    pub is_3d: bool,
    /// Active navigation mode
    pub navigation: NavigationMode,
    /// Avatar dimensions used by collision
    pub avatar: AvatarSize,
    /// Whether a headlight follows the view direction
    pub headlight: bool,
    /// Viewpoint currently applied to this camera
    pub bound_viewpoint: Option<NodeId>,
    /// Position at the end of the previous collision check
    pub last_position: Vec3,
    /// Set while a jump animation is running; widens the ground snap tolerance
    pub jumping: bool,
    /// Collision probe results
    pub collide_flags: CollideFlags,
    /// Distance to the closest obstacle found by the probe
    pub collide_dist: f32,
    /// Closest obstacle point
    pub collide_point: Vec3,
    /// Distance from the eye to the ground
    pub ground_dist: f32,
    /// Ground point below the eye
    pub ground_point: Vec3,
    /// Whether ground was found during the previous check
    pub on_ground: bool,
    frustum: Frustum,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    pub fn perspective(position: Vec3, fov_degrees: f32, width: f32, height: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            fov: fov_degrees * constants::DEG_TO_RAD,
            near,
            far,
            width,
            height,
            is_3d: true,
            navigation: NavigationMode::default(),
            avatar: AvatarSize::default(),
            headlight: true,
            bound_viewpoint: None,
            last_position: position,
            jumping: false,
            collide_flags: CollideFlags::empty(),
            collide_dist: 0.0,
            collide_point: Vec3::zeros(),
            ground_dist: 0.0,
            ground_point: Vec3::zeros(),
            on_ground: false,
            frustum: Frustum::default(),
        };
        camera.update_frustum();
        camera
    }

    /// Placement used when no viewpoint is bound: 10 units back on +Z, 45 degree field of view
    pub fn default_placement(width: f32, height: f32) -> Self {
        Self::perspective(Vec3::new(0.0, 0.0, 10.0), 45.0, width, height, 0.1, 1000.0)
    }

    /// Flat camera for 2D surfaces; one world unit per pixel
    pub fn orthographic_2d(width: f32, height: f32) -> Self {
        let mut camera = Self::default_placement(width, height);
        camera.is_3d = false;
        camera.headlight = false;
        camera.navigation = NavigationMode::None;
        camera.update_frustum();
        camera
    }

    /// Reset placement to [`default_placement`](Self::default_placement) keeping viewport and mode
    pub fn reset_placement(&mut self) {
        let defaults = Self::default_placement(self.width, self.height);
        self.position = defaults.position;
        self.target = defaults.target;
        self.up = defaults.up;
        self.fov = defaults.fov;
        self.last_position = self.position;
        self.bound_viewpoint = None;
        self.update_frustum();
    }

    /// Aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Move eye and target together
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.target += delta;
    }

    /// Place the camera with an explicit target and up vector
    pub fn look_at(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.position = position;
        self.target = target;
        self.up = up;
        self.update_frustum();
    }

    /// Resize the viewport
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.update_frustum();
    }

    /// Unit view direction
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vec3::z())
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.direction().cross(&self.up).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x)
    }

    /// World to view matrix
    pub fn view_matrix(&self) -> Mat4 {
        if self.is_3d {
            Mat4::look_at(self.position, self.target, self.up)
        } else {
            Mat4::identity()
        }
    }

    /// View to clip matrix
    pub fn projection_matrix(&self) -> Mat4 {
        if self.is_3d {
            Mat4::perspective(self.fov, self.aspect(), self.near, self.far)
        } else {
            Mat4::orthographic(self.width, self.height, -self.far, self.far)
        }
    }

    /// Projection times view
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Recompute the culling frustum after any placement change
    pub fn update_frustum(&mut self) {
        let view_proj = self.view_projection();
        let (center, radius) = if self.is_3d {
            let forward = self.direction();
            let up = self.right().cross(&forward);
            let half_h = self.far * (self.fov * 0.5).tan();
            let half_w = half_h * self.aspect();
            let corner = self.position + forward * self.far + up * half_h + self.right() * half_w;
            let center = self.position + forward * ((self.near + self.far) * 0.5);
            (center, (corner - center).norm())
        } else {
            (Vec3::zeros(), 0.0)
        };
        self.frustum = Frustum::from_view_projection(&view_proj, center, radius);
    }

    /// Frustum as of the last [`update_frustum`](Self::update_frustum)
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Map a normalized device coordinate back to world space
    pub fn unproject(&self, ndc: Vec3) -> Option<Vec3> {
        let inverse = self.view_projection().checked_inverse()?;
        let p = inverse * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        if p.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(Vec3::new(p.x / p.w, p.y / p.w, p.z / p.w))
    }

    /// World-space picking ray through a normalized device position
    pub fn pick_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let start = self.unproject(Vec3::new(ndc_x, ndc_y, -0.5))?;
        let end = self.unproject(Vec3::new(ndc_x, ndc_y, 0.5))?;
        if (end - start).norm_squared() <= f32::EPSILON {
            return None;
        }
        Some(Ray::through(start, end))
    }

    /// Whether the eye moved since the last collision check
    pub fn has_moved(&self) -> bool {
        self.position != self.last_position
    }

    /// Clear per-walk collision results
    pub fn reset_collision_probe(&mut self) {
        self.collide_flags = CollideFlags::empty();
        self.collide_dist = f32::MAX;
        self.ground_dist = f32::MAX;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_placement() {
        let camera = Camera::default_placement(800.0, 600.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
        assert!((camera.fov - std::f32::consts::FRAC_PI_4).abs() < 0.001);
        assert!((camera.direction().z + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_frustum_planes_face_inward() {
        let camera = Camera::default_placement(800.0, 600.0);
        let inside = Vec3::zeros();
        for plane in camera.frustum().planes() {
            assert!(plane.distance_to_point(inside) > 0.0);
        }
        let behind = Vec3::new(0.0, 0.0, 20.0);
        assert!(camera.frustum().plane(FrustumPlane::Near).distance_to_point(behind) < 0.0);
        let far_left = Vec3::new(-100.0, 0.0, 0.0);
        assert!(camera.frustum().plane(FrustumPlane::Left).distance_to_point(far_left) < 0.0);
    }

    #[test]
    fn test_near_plane_sits_at_near_distance() {
        let camera = Camera::default_placement(800.0, 600.0);
        let on_near = Vec3::new(0.0, 0.0, 10.0 - camera.near);
        let d = camera.frustum().plane(FrustumPlane::Near).distance_to_point(on_near);
        assert!(d.abs() < 0.01);
    }

    #[test]
    fn test_frustum_sphere_contains_far_corner_region() {
        let camera = Camera::default_placement(800.0, 600.0);
        let f = camera.frustum();
        assert!((f.center - Vec3::new(0.0, 0.0, 10.0 - (0.1 + 1000.0) * 0.5)).norm() < 0.01);
        assert!(f.radius > 500.0);
    }

    #[test]
    fn test_center_pick_ray_follows_view_direction() {
        let camera = Camera::default_placement(800.0, 600.0);
        let ray = camera.pick_ray(0.0, 0.0).unwrap();
        assert!((ray.direction.z + 1.0).abs() < 0.001);
        assert!(ray.origin.x.abs() < 0.001);
        assert!(ray.origin.z < 10.0);
    }

    #[test]
    fn test_reset_placement_forgets_viewpoint() {
        let mut camera = Camera::default_placement(100.0, 100.0);
        camera.look_at(Vec3::new(3.0, 3.0, 3.0), Vec3::zeros(), Vec3::y());
        camera.reset_placement();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
        assert!(camera.bound_viewpoint.is_none());
    }
}
