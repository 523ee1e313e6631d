//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the handful of matrix helpers the traversal
//! code needs. All projections follow the OpenGL clip-space convention
//! (depth in `[-1, 1]`, camera looking down `-Z`).

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create an OpenGL-style perspective projection matrix
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an OpenGL-style orthographic projection centered on the origin
    fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Transform a point (w = 1) and return the cartesian result
    fn transform_point3(&self, point: &Vec3) -> Vec3;

    /// Transform a direction (w = 0)
    fn transform_dir(&self, dir: &Vec3) -> Vec3;

    /// Inverse that reports singular matrices as `None`
    fn checked_inverse(&self) -> Option<Mat4>;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Mat4::new_orthographic(-hw, hw, -hh, hh, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn transform_point3(&self, point: &Vec3) -> Vec3 {
        self.transform_point(&Point3::from(*point)).coords
    }

    fn transform_dir(&self, dir: &Vec3) -> Vec3 {
        self.transform_vector(dir)
    }

    fn checked_inverse(&self) -> Option<Mat4> {
        let inv = self.try_inverse()?;
        if inv.iter().all(|v| v.is_finite()) {
            Some(inv)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_to_matrix_applies_scale_then_translation() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::new(2.0, 2.0, 2.0));
        let p = t.to_matrix().transform_point3(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vec3::new(3.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_transform_dir_ignores_translation() {
        let m = Mat4::new_translation(&Vec3::new(5.0, 5.0, 5.0));
        let d = m.transform_dir(&Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(d, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_checked_inverse_rejects_singular() {
        let singular = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
        assert!(singular.checked_inverse().is_none());
        assert!(Mat4::identity().checked_inverse().is_some());
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), Vec3::y());
        let eye = view.transform_point3(&Vec3::new(0.0, 0.0, 10.0));
        assert!(eye.norm() < 0.001);
        let target = view.transform_point3(&Vec3::zeros());
        assert!((target.z + 10.0).abs() < 0.001);
    }
}
