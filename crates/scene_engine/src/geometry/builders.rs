//! Built-in geometry builders

use crate::foundation::math::{constants::PI, Vec2, Vec3};
use super::bounds::BoundingBox;
use super::mesh::{Mesh, MeshHit, MeshType, Vertex};
use super::primitives::{BoundingSphere, Ray};
use super::GeometryBuilder;

/// Axis-aligned box centered on the origin
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGeometry {
    /// Full size along each axis
    pub size: Vec3,
}

impl BoxGeometry {
    /// Box of the given full size
    pub fn new(size: Vec3) -> Self {
        Self { size }
    }

    /// Cube with edge length `edge`
    pub fn cube(edge: f32) -> Self {
        Self::new(Vec3::repeat(edge))
    }
}

impl GeometryBuilder for BoxGeometry {
    fn build(&self) -> Mesh {
        let h = self.size * 0.5;
        let mut mesh = Mesh::new(MeshType::Triangles);
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::x(), Vec3::z(), Vec3::y()),
            (-Vec3::x(), -Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
        ];
        for (n, u, v) in faces {
            let center = n.component_mul(&h);
            let du = u.component_mul(&h);
            let dv = v.component_mul(&h);
            // counter-clockwise seen from outside: u x v == n
            let (du, dv) = if du.cross(&dv).dot(&n) < 0.0 { (dv, du) } else { (du, dv) };
            let a = mesh.add_vertex(Vertex::new(center - du - dv, n, Vec2::new(0.0, 0.0)));
            let b = mesh.add_vertex(Vertex::new(center + du - dv, n, Vec2::new(1.0, 0.0)));
            let c = mesh.add_vertex(Vertex::new(center + du + dv, n, Vec2::new(1.0, 1.0)));
            let d = mesh.add_vertex(Vertex::new(center - du + dv, n, Vec2::new(0.0, 1.0)));
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
        }
        mesh
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit> {
        let bbox = BoundingBox::from_center_extents(Vec3::zeros(), self.size * 0.5);
        let t = bbox.intersect_ray(ray)?;
        let point = ray.point_at(t);
        let h = self.size * 0.5;
        // the face whose plane the point sits on, relative to half-size
        let rel = Vec3::new(
            if h.x > 0.0 { point.x / h.x } else { 0.0 },
            if h.y > 0.0 { point.y / h.y } else { 0.0 },
            if h.z > 0.0 { point.z / h.z } else { 0.0 },
        );
        let axis = rel.iamax();
        let mut normal = Vec3::zeros();
        normal[axis] = rel[axis].signum();
        let (a, b) = match axis {
            0 => (2, 1),
            1 => (0, 2),
            _ => (0, 1),
        };
        let tex_coords = Vec2::new((rel[a] + 1.0) * 0.5, (rel[b] + 1.0) * 0.5);
        Some(MeshHit { distance: t, point, normal, tex_coords })
    }

    fn has_exact_intersection(&self) -> bool {
        true
    }
}

/// UV sphere centered on the origin
#[derive(Debug, Clone, PartialEq)]
pub struct SphereGeometry {
    /// Radius
    pub radius: f32,
    /// Longitudinal subdivisions
    pub segments: u32,
    /// Latitudinal subdivisions
    pub rings: u32,
}

impl SphereGeometry {
    /// Sphere with a default tessellation
    pub fn new(radius: f32) -> Self {
        Self { radius, segments: 24, rings: 12 }
    }
}

impl GeometryBuilder for SphereGeometry {
    #[allow(clippy::cast_precision_loss)]
    fn build(&self) -> Mesh {
        let mut mesh = Mesh::new(MeshType::Triangles);
        let segments = self.segments.max(3);
        let rings = self.rings.max(2);
        for r in 0..=rings {
            let v = r as f32 / rings as f32;
            let phi = v * PI;
            for s in 0..=segments {
                let u = s as f32 / segments as f32;
                let theta = u * 2.0 * PI;
                let n = Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
                mesh.add_vertex(Vertex::new(n * self.radius, n, Vec2::new(u, 1.0 - v)));
            }
        }
        let stride = segments + 1;
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = a + stride;
                mesh.add_triangle(a, b, a + 1);
                mesh.add_triangle(a + 1, b, b + 1);
            }
        }
        mesh
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit> {
        let (distance, point, normal) = BoundingSphere::new(Vec3::zeros(), self.radius).intersect_ray(ray)?;
        let u = 0.5 + normal.x.atan2(normal.z) / (2.0 * PI);
        let v = 0.5 + normal.y.asin() / PI;
        Some(MeshHit { distance, point, normal, tex_coords: Vec2::new(u, v) })
    }

    fn has_exact_intersection(&self) -> bool {
        true
    }
}

/// Arbitrary indexed triangles with optional per-vertex colors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedTriangleSet {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle indices, three per face
    pub indices: Vec<u32>,
    /// Optional RGBA color per vertex
    pub colors: Option<Vec<[f32; 4]>>,
}

impl IndexedTriangleSet {
    /// Triangle set from positions and indices
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices, colors: None }
    }

    /// Attach per-vertex colors
    #[must_use]
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.colors = Some(colors);
        self
    }
}

impl GeometryBuilder for IndexedTriangleSet {
    fn build(&self) -> Mesh {
        let mut mesh = Mesh::new(MeshType::Triangles);
        for (i, p) in self.positions.iter().enumerate() {
            let mut vertex = Vertex::new(*p, Vec3::z(), Vec2::zeros());
            if let Some(color) = self.colors.as_ref().and_then(|c| c.get(i)) {
                vertex = vertex.with_color(*color);
            }
            mesh.add_vertex(vertex);
        }
        let count = self.positions.len();
        for tri in self.indices.chunks_exact(3) {
            if tri.iter().any(|&i| i as usize >= count) {
                log::warn!("Skipping triangle {:?} with out-of-range index ({} vertices)", tri, count);
                continue;
            }
            mesh.add_triangle(tri[0], tri[1], tri[2]);
        }
        mesh
    }
}

/// Indexed line segments; never picked or collided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedLineSet {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Segment indices, two per line
    pub indices: Vec<u32>,
}

impl GeometryBuilder for IndexedLineSet {
    fn build(&self) -> Mesh {
        let mut mesh = Mesh::new(MeshType::Lines);
        for p in &self.positions {
            mesh.add_vertex(Vertex::new(*p, Vec3::z(), Vec2::zeros()));
        }
        for seg in self.indices.chunks_exact(2) {
            mesh.add_line(seg[0], seg[1]);
        }
        mesh
    }
}

/// Flat rectangle in the z = 0 plane
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle2D {
    /// Width and height
    pub size: Vec2,
}

impl Rectangle2D {
    /// Rectangle of the given size centered on the origin
    pub fn new(width: f32, height: f32) -> Self {
        Self { size: Vec2::new(width, height) }
    }
}

impl GeometryBuilder for Rectangle2D {
    fn build(&self) -> Mesh {
        let hw = self.size.x * 0.5;
        let hh = self.size.y * 0.5;
        let n = Vec3::z();
        let mut mesh = Mesh::new(MeshType::Triangles);
        let a = mesh.add_vertex(Vertex::new(Vec3::new(-hw, -hh, 0.0), n, Vec2::new(0.0, 0.0)));
        let b = mesh.add_vertex(Vertex::new(Vec3::new(hw, -hh, 0.0), n, Vec2::new(1.0, 0.0)));
        let c = mesh.add_vertex(Vertex::new(Vec3::new(hw, hh, 0.0), n, Vec2::new(1.0, 1.0)));
        let d = mesh.add_vertex(Vertex::new(Vec3::new(-hw, hh, 0.0), n, Vec2::new(0.0, 1.0)));
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
        mesh
    }

    fn is_2d(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_mesh_bounds_match_size() {
        let mesh = BoxGeometry::new(Vec3::new(2.0, 4.0, 6.0)).build();
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds().max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_box_faces_point_outward() {
        let mesh = BoxGeometry::cube(2.0).build();
        for (_, tri) in mesh.triangles() {
            let centroid = (tri.v0 + tri.v1 + tri.v2) / 3.0;
            assert!(tri.normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_box_exact_hit_matches_mesh_hit() {
        let geometry = BoxGeometry::cube(2.0);
        let ray = Ray::new(Vec3::new(0.3, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let exact = geometry.intersect_ray(&ray).unwrap();
        let tessellated = geometry.build().intersect_ray(&ray).unwrap();
        assert!((exact.distance - tessellated.distance).abs() < 0.001);
        assert!((exact.normal - Vec3::z()).norm() < 0.001);
    }

    #[test]
    fn test_sphere_bounds() {
        let mesh = SphereGeometry::new(2.0).build();
        assert!((mesh.bounds().max.y - 2.0).abs() < 0.001);
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn test_triangle_set_skips_bad_indices_and_reports_alpha() {
        let set = IndexedTriangleSet::new(
            vec![Vec3::zeros(), Vec3::x(), Vec3::y()],
            vec![0, 1, 2, 0, 1, 9],
        )
        .with_colors(vec![[1.0, 0.0, 0.0, 0.5]; 3]);
        let mesh = set.build();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.has_alpha());
    }

    #[test]
    fn test_line_set_has_no_triangles() {
        let lines = IndexedLineSet { positions: vec![Vec3::zeros(), Vec3::x()], indices: vec![0, 1] };
        assert_eq!(lines.build().triangle_count(), 0);
    }

    #[test]
    fn test_rectangle_is_flat() {
        let rect = Rectangle2D::new(4.0, 2.0);
        assert!(rect.is_2d());
        let mesh = rect.build();
        assert!(mesh.bounds().max.z.abs() < f32::EPSILON);
        assert!((mesh.bounds().max.x - 2.0).abs() < f32::EPSILON);
    }
}
