//! Primitive shapes and intersection algorithms
//!
//! Rays, planes, spheres and triangles with the intersection tests used by
//! culling, picking and collision.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    ///
    /// A zero or non-finite direction gives a degenerate ray with a zero
    /// direction, which intersects nothing; see [`is_valid`](Self::is_valid).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: unit_direction(direction).unwrap_or_else(Vec3::zeros),
        }
    }

    /// Ray with a usable direction, or `None`
    pub fn try_new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let ray = Self::new(origin, direction);
        ray.is_valid().then_some(ray)
    }

    /// Finite origin and unit direction
    pub fn is_valid(&self) -> bool {
        self.origin.iter().all(|c| c.is_finite()) && self.direction.norm_squared() > 0.5
    }

    /// Ray starting at `from` and passing through `to`
    pub fn through(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Express the ray in another coordinate system
    ///
    /// Both ends are mapped as points so non-uniform scales and projective
    /// matrices keep the ray passing through the same geometry.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let origin = matrix.transform_point3(&self.origin);
        let end = matrix.transform_point3(&(self.origin + self.direction));
        Self::new(origin, end - origin)
    }
}

fn unit_direction(direction: Vec3) -> Option<Vec3> {
    if direction.iter().all(|c| c.is_finite()) {
        direction.try_normalize(f32::EPSILON)
    } else {
        None
    }
}

/// Plane in Hessian form: points `p` with `normal . p + distance == 0`
///
/// The positive half-space is the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed offset from the origin
    pub distance: f32,
}

impl Plane {
    /// Create a plane from a normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane through `point` facing `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(&point),
        }
    }

    /// Signed distance from a point to the plane
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Map the plane through an affine transform
    ///
    /// Returns `None` when the matrix is singular.
    pub fn transformed(&self, matrix: &Mat4) -> Option<Self> {
        let inverse = matrix.checked_inverse()?;
        let on_plane = self.normal * -self.distance;
        let point = matrix.transform_point3(&on_plane);
        let normal = inverse.transpose().transform_dir(&self.normal);
        if normal.norm_squared() <= f32::EPSILON {
            return None;
        }
        Some(Self::from_point_normal(point, normal))
    }
}

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Self) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Test ray intersection with this sphere
    /// Returns (distance, hit_point, normal) if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        let oc = ray.origin - self.center;

        // Solve: |origin + t*direction - center|^2 = radius^2
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        let t = if t1 > 0.0 {
            t1
        } else if t2 > 0.0 {
            t2
        } else {
            return None;
        };

        let hit_point = ray.point_at(t);
        let normal = (hit_point - self.center).normalize();

        Some((t, hit_point, normal))
    }
}

/// A triangle in mesh-local coordinates
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    ///
    /// Degenerate triangles report a zero vector.
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
    }

    /// Möller-Trumbore ray-triangle intersection
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t >= 0.0 {
            Some((t, u, v))
        } else {
            None
        }
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let v0_to_point = point - self.v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        let v1_to_point = point - self.v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        let v2_to_point = point - self.v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v_val = d1 / (d1 - d3);
            return self.v0 + edge1 * v_val;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + edge2 * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Inside the face region
        let denom = 1.0 / (va + vb + vc);
        let v_val = vb * denom;
        let w = vc * denom;
        self.v0 + edge1 * v_val + edge2 * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_transformed_by_translation() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let moved = ray.transformed(&Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
        assert!((moved.origin.x - 1.0).abs() < 0.001);
        assert!((moved.direction.z + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_degenerate_ray_has_no_nan() {
        let zero = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::zeros());
        assert_eq!(zero.direction, Vec3::zeros());
        assert!(!zero.is_valid());
        assert!(Ray::try_new(Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 1.0)).is_none());
        assert!(Ray::try_new(Vec3::new(f32::INFINITY, 0.0, 0.0), -Vec3::z()).is_none());
        assert!(Ray::try_new(Vec3::zeros(), Vec3::new(0.0, 0.0, -3.0)).is_some());
    }

    #[test]
    fn test_plane_distance_sign() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 1.0, 0.0), Vec3::y());
        assert!(plane.distance_to_point(Vec3::new(0.0, 3.0, 0.0)) > 0.0);
        assert!(plane.distance_to_point(Vec3::zeros()) < 0.0);
    }

    #[test]
    fn test_plane_transformed_follows_translation() {
        let plane = Plane::from_point_normal(Vec3::zeros(), Vec3::x());
        let moved = plane.transformed(&Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0))).unwrap();
        assert!(moved.distance_to_point(Vec3::new(2.0, 5.0, 5.0)).abs() < 0.001);
        assert!(moved.distance_to_point(Vec3::new(3.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn test_triangle_ray_hit_and_miss() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let hit = tri.intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0)));
        assert!(hit.is_some());
        assert!((hit.unwrap().0 - 5.0).abs() < 0.001);

        let miss = tri.intersect_ray(&Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(0.0, 0.0, -1.0)));
        assert!(miss.is_none());
    }

    #[test]
    fn test_triangle_closest_point_inside_face() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let p = tri.closest_point(Vec3::new(0.0, 0.0, 2.0));
        assert!(p.z.abs() < 0.001);
        assert!(p.x.abs() < 0.001);
    }

    #[test]
    fn test_sphere_ray_hit() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let (t, _, normal) = sphere
            .intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0)))
            .unwrap();
        assert!((t - 4.0).abs() < 0.001);
        assert!((normal.z - 1.0).abs() < 0.001);
    }
}
