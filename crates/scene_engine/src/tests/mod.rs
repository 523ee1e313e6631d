//! Whole-scene scenarios driven through [`VisualSurface`]

mod frame;

use crate::prelude::*;
use crate::render::BackendCall;

/// Shape under a translation, attached to `parent`; returns the shape
fn shape_at(graph: &mut SceneGraph, parent: NodeId, center: Vec3, shape: Shape) -> NodeId {
    let transform = graph.insert(TransformNode::new(Mat4::new_translation(&center)));
    let shape = graph.insert(shape);
    graph.add_child(transform, shape).unwrap();
    graph.add_child(parent, transform).unwrap();
    shape
}

fn unit_cube() -> Shape {
    Shape::new(BoxGeometry::cube(1.0))
}

fn glass_cube() -> Shape {
    let material = Material::diffuse(Vec3::new(0.2, 0.4, 0.8)).with_transparency(0.5);
    unit_cube().with_appearance(Appearance::with_material(material))
}

fn surface() -> VisualSurface {
    VisualSurface::new(800.0, 600.0, EngineConfig::default())
}

fn draw_translations(backend: &RecordingBackend) -> Vec<Vec3> {
    backend
        .calls
        .iter()
        .filter_map(|call| match call {
            BackendCall::DrawMesh { model_matrix, .. } => {
                Some(Vec3::new(model_matrix[(0, 3)], model_matrix[(1, 3)], model_matrix[(2, 3)]))
            }
            _ => None,
        })
        .collect()
}
