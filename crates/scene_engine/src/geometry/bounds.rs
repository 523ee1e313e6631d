//! Axis-aligned bounding boxes with cached bounding spheres

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use super::primitives::{Plane, Ray};

/// Side of a plane a volume lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneRelation {
    /// Entirely in the positive half-space
    Front,
    /// Entirely in the negative half-space
    Back,
    /// Straddles the plane
    Intersect,
}

/// Axis-aligned bounding box
///
/// An unset box contains nothing and is absorbed by [`union`](Self::union).
/// The enclosing sphere (`center`, `radius`) is refreshed on every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
    /// Center of the enclosing sphere
    pub center: Vec3,
    /// Radius of the enclosing sphere
    pub radius: f32,
    is_set: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// An unset box
    pub fn empty() -> Self {
        Self {
            min: Vec3::zeros(),
            max: Vec3::zeros(),
            center: Vec3::zeros(),
            radius: 0.0,
            is_set: false,
        }
    }

    /// Box spanning two corners, given in any order
    pub fn new(a: Vec3, b: Vec3) -> Self {
        let mut bbox = Self {
            min: a.inf(&b),
            max: a.sup(&b),
            center: Vec3::zeros(),
            radius: 0.0,
            is_set: true,
        };
        bbox.update_sphere();
        bbox
    }

    /// Box centered on `center` with half-size `extents`
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Smallest box holding every point, unset for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.union_point(p);
        }
        bbox
    }

    /// Whether the box holds anything
    pub fn is_set(&self) -> bool {
        self.is_set
    }

    /// Geometric center
    pub fn box_center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    fn update_sphere(&mut self) {
        self.center = self.box_center();
        self.radius = (self.max - self.center).norm();
    }

    /// Grow to include a point
    pub fn union_point(&mut self, point: Vec3) {
        if self.is_set {
            self.min = self.min.inf(&point);
            self.max = self.max.sup(&point);
        } else {
            self.min = point;
            self.max = point;
            self.is_set = true;
        }
        self.update_sphere();
    }

    /// Grow to include another box; unset boxes are ignored
    pub fn union(&mut self, other: &Self) {
        if !other.is_set {
            return;
        }
        if self.is_set {
            self.min = self.min.inf(&other.min);
            self.max = self.max.sup(&other.max);
            self.update_sphere();
        } else {
            *self = *other;
        }
    }

    /// The eight corners; bit 0 of the index selects max x, bit 1 max y, bit 2 max z
    pub fn vertices(&self) -> [Vec3; 8] {
        let mut out = [Vec3::zeros(); 8];
        for (i, v) in out.iter_mut().enumerate() {
            *v = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }

    /// Axis-aligned box around the transformed corners
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if !self.is_set {
            return *self;
        }
        Self::from_points(self.vertices().iter().map(|v| matrix.transform_point3(v)))
    }

    /// Check if point is inside (boundary included)
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.is_set
            && point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if two boxes overlap
    pub fn intersects(&self, other: &Self) -> bool {
        self.is_set && other.is_set
            && self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Slab test, returns the entry distance (0 when the origin is inside)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if !self.is_set || !ray.is_valid() {
            return None;
        }
        let inv = |d: f32| if d == 0.0 { f32::INFINITY } else { 1.0 / d };
        let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

        let t1 = (self.min.x - ray.origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray.origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray.origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray.origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray.origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray.origin.z) * inv_dir.z;

        let tmin = nan_min(t1, t2).max(nan_min(t3, t4)).max(nan_min(t5, t6));
        let tmax = nan_max(t1, t2).min(nan_max(t3, t4)).min(nan_max(t5, t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Index of the corner farthest along `normal`
    pub fn p_vertex_index(normal: &Vec3) -> usize {
        usize::from(normal.x >= 0.0)
            | (usize::from(normal.y >= 0.0) << 1)
            | (usize::from(normal.z >= 0.0) << 2)
    }

    /// Which side of `plane` the box lies on
    pub fn plane_relation(&self, plane: &Plane) -> PlaneRelation {
        let vertices = self.vertices();
        let p = Self::p_vertex_index(&plane.normal);
        if plane.distance_to_point(vertices[p]) < 0.0 {
            return PlaneRelation::Back;
        }
        if plane.distance_to_point(vertices[7 - p]) > 0.0 {
            return PlaneRelation::Front;
        }
        PlaneRelation::Intersect
    }
}

// A ray running inside a slab boundary yields 0 * inf = NaN; treat it as unbounded
fn nan_min(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() { f32::NEG_INFINITY } else { a.min(b) }
}

fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() { f32::INFINITY } else { a.max(b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box_absorbed_by_union() {
        let mut bbox = BoundingBox::empty();
        assert!(!bbox.is_set());
        bbox.union(&BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        assert!(bbox.is_set());
        bbox.union(&BoundingBox::empty());
        assert_eq!(bbox.max, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_union_of_two_boxes() {
        let mut bbox = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        bbox.union(&BoundingBox::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 6.0, 6.0)));
        assert_eq!(bbox.min, Vec3::zeros());
        assert_eq!(bbox.max, Vec3::new(6.0, 6.0, 6.0));
        assert!((bbox.radius - 27.0_f32.sqrt()).abs() < 0.001);
    }

    #[test]
    fn test_transformed_box_is_axis_aligned_hull() {
        let bbox = BoundingBox::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let rot = Mat4::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let out = bbox.transformed(&rot);
        assert!((out.max.x - 2.0_f32.sqrt()).abs() < 0.001);
        assert!((out.max.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_ray_slab() {
        let bbox = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let hit = bbox.intersect_ray(&Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0)));
        assert!((hit.unwrap() - 4.0).abs() < 0.001);
        let miss = bbox.intersect_ray(&Ray::new(Vec3::new(3.0, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0)));
        assert!(miss.is_none());
    }

    #[test]
    fn test_plane_relation() {
        let bbox = BoundingBox::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        let plane = Plane::from_point_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::x());
        assert_eq!(bbox.plane_relation(&plane), PlaneRelation::Front);
        let flipped = Plane::from_point_normal(Vec3::new(1.0, 0.0, 0.0), -Vec3::x());
        assert_eq!(bbox.plane_relation(&flipped), PlaneRelation::Back);
        let cutting = Plane::from_point_normal(Vec3::new(2.5, 0.0, 0.0), Vec3::x());
        assert_eq!(bbox.plane_relation(&cutting), PlaneRelation::Intersect);
    }

    #[test]
    fn test_corner_indexing_matches_p_vertex() {
        let bbox = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));
        let idx = BoundingBox::p_vertex_index(&Vec3::new(1.0, -1.0, 1.0));
        assert_eq!(bbox.vertices()[idx], Vec3::new(1.0, 0.0, 3.0));
        assert_eq!(bbox.vertices()[7 - idx], Vec3::new(0.0, 2.0, 0.0));
    }
}
