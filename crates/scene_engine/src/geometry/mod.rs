//! Geometry: primitives, bounds, meshes and the builders that produce them

pub mod primitives;
pub mod bounds;
pub mod mesh;
pub mod builders;

pub use bounds::{BoundingBox, PlaneRelation};
pub use builders::{BoxGeometry, IndexedLineSet, IndexedTriangleSet, Rectangle2D, SphereGeometry};
pub use mesh::{Mesh, MeshHit, MeshType, Vertex};
pub use primitives::{BoundingSphere, Plane, Ray, Triangle};

/// Source of a shape's mesh
///
/// Builders are evaluated lazily by the owning shape whenever its geometry is
/// marked dirty. Analytic shapes may answer ray queries directly instead of
/// going through the tessellated mesh.
pub trait GeometryBuilder: std::fmt::Debug {
    /// Tessellate into a mesh in local coordinates
    fn build(&self) -> Mesh;

    /// Exact ray query in local coordinates, `None` defers to the mesh
    fn intersect_ray(&self, _ray: &Ray) -> Option<MeshHit> {
        None
    }

    /// Whether the exact query above is implemented
    fn has_exact_intersection(&self) -> bool {
        false
    }

    /// Flat geometry drawn in the 2D layer; never deferred or collided
    fn is_2d(&self) -> bool {
        false
    }
}
