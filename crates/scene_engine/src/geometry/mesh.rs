//! Triangle meshes produced by geometry builders
//!
//! Meshes live in the local coordinates of the shape that owns them. Ray and
//! proximity queries are answered in the same space; callers transform rays
//! into mesh space before asking.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec2, Vec3};
use super::bounds::BoundingBox;
use super::primitives::{Ray, Triangle};

/// Interleaved vertex layout handed to backends
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position
    pub position: [f32; 3],
    /// Normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
    /// RGBA color
    pub color: [f32; 4],
}

impl Vertex {
    /// White, opaque vertex
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coord: tex_coord.into(),
            color: [1.0; 4],
        }
    }

    /// Same vertex with a per-vertex color
    #[must_use]
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Position as a vector
    pub fn pos(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshType {
    /// Indexed triangle list
    #[default]
    Triangles,
    /// Indexed line list
    Lines,
    /// Point cloud
    Points,
}

/// Ray hit on a mesh, in mesh-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Distance along the (normalized) ray
    pub distance: f32,
    /// Hit point
    pub point: Vec3,
    /// Face normal
    pub normal: Vec3,
    /// Interpolated texture coordinates
    pub tex_coords: Vec2,
}

/// Renderable mesh with cached bounds
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Primitive topology
    pub mesh_type: MeshType,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: BoundingBox,
    has_alpha: bool,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new(mesh_type: MeshType) -> Self {
        Self {
            mesh_type,
            ..Default::default()
        }
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        if vertex.color[3] < 1.0 {
            self.has_alpha = true;
        }
        self.bounds.union_point(vertex.pos());
        let index = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        self.vertices.push(vertex);
        index
    }

    /// Append a triangle by vertex indices
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append a line segment by vertex indices
    pub fn add_line(&mut self, a: u32, b: u32) {
        self.indices.extend_from_slice(&[a, b]);
    }

    /// Vertex storage
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index storage
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex storage as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Local bounds
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// True when any vertex color is translucent
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Number of indexed triangles
    pub fn triangle_count(&self) -> usize {
        if self.mesh_type == MeshType::Triangles {
            self.indices.len() / 3
        } else {
            0
        }
    }

    /// Iterate triangles with their vertex indices
    pub fn triangles(&self) -> impl Iterator<Item = ([usize; 3], Triangle)> + '_ {
        let count = self.triangle_count();
        self.indices[..count * 3].chunks_exact(3).filter_map(move |tri| {
            let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let v0 = self.vertices.get(idx[0])?.pos();
            let v1 = self.vertices.get(idx[1])?.pos();
            let v2 = self.vertices.get(idx[2])?.pos();
            Some((idx, Triangle::new(v0, v1, v2)))
        })
    }

    /// Closest ray hit on any triangle
    pub fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit> {
        self.bounds.intersect_ray(ray)?;

        let mut best: Option<MeshHit> = None;
        for (idx, tri) in self.triangles() {
            let Some((t, u, v)) = tri.intersect_ray(ray) else { continue };
            if best.as_ref().is_some_and(|b| b.distance <= t) {
                continue;
            }
            let tc = |i: usize| Vec2::from(self.vertices[idx[i]].tex_coord);
            let tex_coords = tc(0) * (1.0 - u - v) + tc(1) * u + tc(2) * v;
            best = Some(MeshHit {
                distance: t,
                point: ray.point_at(t),
                normal: tri.normal(),
                tex_coords,
            });
        }
        best
    }

    /// Closest surface point within `max_dist` of `point`
    pub fn closest_face(&self, point: Vec3, max_dist: f32) -> Option<Vec3> {
        if !self.bounds.is_set() {
            return None;
        }
        let reach = BoundingBox::from_center_extents(point, Vec3::repeat(max_dist));
        if !self.bounds.intersects(&reach) {
            return None;
        }

        let limit = max_dist * max_dist;
        let mut best: Option<(f32, Vec3)> = None;
        for (_, tri) in self.triangles() {
            let candidate = tri.closest_point(point);
            let dist = (candidate - point).norm_squared();
            if dist > limit {
                continue;
            }
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, candidate));
            }
        }
        best.map(|(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new(MeshType::Triangles);
        let n = Vec3::z();
        let a = mesh.add_vertex(Vertex::new(Vec3::new(-1.0, -1.0, 0.0), n, Vec2::new(0.0, 0.0)));
        let b = mesh.add_vertex(Vertex::new(Vec3::new(1.0, -1.0, 0.0), n, Vec2::new(1.0, 0.0)));
        let c = mesh.add_vertex(Vertex::new(Vec3::new(1.0, 1.0, 0.0), n, Vec2::new(1.0, 1.0)));
        let d = mesh.add_vertex(Vertex::new(Vec3::new(-1.0, 1.0, 0.0), n, Vec2::new(0.0, 1.0)));
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
        mesh
    }

    #[test]
    fn test_bounds_follow_vertices() {
        let mesh = quad();
        assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(mesh.bounds().max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_ray_hit_interpolates_tex_coords() {
        let mesh = quad();
        let hit = mesh
            .intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0)))
            .unwrap();
        assert!((hit.distance - 3.0).abs() < 0.001);
        assert!((hit.tex_coords.x - 0.5).abs() < 0.001);
        assert!((hit.tex_coords.y - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_closest_face_respects_max_distance() {
        let mesh = quad();
        let near = mesh.closest_face(Vec3::new(0.2, 0.3, 0.5), 1.0).unwrap();
        assert!((near - Vec3::new(0.2, 0.3, 0.0)).norm() < 0.001);
        assert!(mesh.closest_face(Vec3::new(0.0, 0.0, 2.0), 1.0).is_none());
    }

    #[test]
    fn test_alpha_detected_from_vertex_color() {
        let mut mesh = quad();
        assert!(!mesh.has_alpha());
        mesh.add_vertex(Vertex::new(Vec3::zeros(), Vec3::z(), Vec2::zeros()).with_color([1.0, 1.0, 1.0, 0.5]));
        assert!(mesh.has_alpha());
    }

    #[test]
    fn test_vertex_bytes_length() {
        let mesh = quad();
        assert_eq!(mesh.vertex_bytes().len(), 4 * std::mem::size_of::<Vertex>());
    }
}
