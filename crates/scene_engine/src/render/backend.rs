//! Backend abstraction for the traversal engine
//!
//! Nodes never talk to a graphics API directly. Every drawing or state
//! change goes through [`RenderBackend`], which keeps the traversal testable
//! with [`NullBackend`] and [`RecordingBackend`].

use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
use crate::geometry::{Mesh, Plane};
use crate::traversal::cull::CullFlag;
use super::camera::Camera;
use super::lighting::{LightDesc, LightType};
use super::material::{ColorTransform, Material, TextureInfo};

/// Axis-aligned clip rectangle in world units (x right, y up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl ClipRect {
    /// Create a rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle centered on the origin
    pub fn centered(width: f32, height: f32) -> Self {
        Self::new(-width * 0.5, -height * 0.5, width, height)
    }

    /// Whether a point lies inside (edges included)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Overlap of two rectangles; empty overlaps collapse to zero size
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        Self::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0))
    }

    /// Bounds of the rectangle after an affine transform of the XY plane
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = [
            (self.x, self.y),
            (self.x + self.width, self.y),
            (self.x, self.y + self.height),
            (self.x + self.width, self.y + self.height),
        ];
        let mut min = Vec3::repeat(f32::MAX);
        let mut max = Vec3::repeat(f32::MIN);
        for (x, y) in corners {
            let p = matrix.transform_point3(&Vec3::new(x, y, 0.0));
            min = min.inf(&p);
            max = max.sup(&p);
        }
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

/// Fog parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FogDesc {
    /// Fog color
    pub color: Vec3,
    /// Distance at which objects are fully fogged, 0 disables fog
    pub visibility_range: f32,
    /// Exponential instead of linear falloff
    pub exponential: bool,
}

/// Background parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundDesc {
    /// Clear color
    pub color: Vec4,
    /// Camera rotation to apply to sky geometry
    pub orientation: Mat4,
}

impl Default for BackgroundDesc {
    fn default() -> Self {
        Self {
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            orientation: Mat4::identity(),
        }
    }
}

/// State accompanying a mesh draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    /// Local to world matrix
    pub model_matrix: Mat4,
    /// Color transform in effect
    pub color_transform: ColorTransform,
    /// Visibility of the mesh volume; `Inside` lets the backend skip clipping
    pub cull_flag: CullFlag,
}

/// Main rendering backend trait
pub trait RenderBackend {
    /// Camera used for the next draws
    fn set_viewport_camera(&mut self, camera: &Camera);

    /// Clear and draw the background
    fn draw_background(&mut self, background: &BackgroundDesc);

    /// Enable fog, or disable it with `None`
    fn set_fog(&mut self, fog: Option<&FogDesc>);

    /// Material for the next draws; `None` draws unlit
    fn set_material(&mut self, material: Option<&Material>, color: &ColorTransform);

    /// Bind a texture
    fn enable_texture(&mut self, texture: &TextureInfo);

    /// Unbind the current texture
    fn disable_texture(&mut self);

    /// Draw a mesh
    fn draw_mesh(&mut self, mesh: &Mesh, state: &DrawState);

    /// Save the current backend matrix
    fn push_matrix(&mut self);

    /// Restore the last saved matrix
    fn pop_matrix(&mut self);

    /// Multiply the current backend matrix
    fn mult_matrix(&mut self, matrix: &Mat4);

    /// Restrict drawing to a rectangle
    fn set_clip_rect(&mut self, rect: &ClipRect);

    /// Remove the rectangle restriction
    fn reset_clip_rect(&mut self);

    /// Activate one more clip half-space (world coordinates)
    fn set_clip_plane(&mut self, plane: &Plane);

    /// Deactivate the most recent clip half-space
    fn reset_clip_plane(&mut self);

    /// Activate one more light, returns false when the backend is full
    fn add_light(&mut self, light: &LightDesc) -> bool;

    /// Deactivate the most recently added light
    fn remove_last_light(&mut self);

    /// Deactivate every light
    fn clear_lights(&mut self);
}

/// Backend that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl RenderBackend for NullBackend {
    fn set_viewport_camera(&mut self, _camera: &Camera) {}
    fn draw_background(&mut self, _background: &BackgroundDesc) {}
    fn set_fog(&mut self, _fog: Option<&FogDesc>) {}
    fn set_material(&mut self, _material: Option<&Material>, _color: &ColorTransform) {}
    fn enable_texture(&mut self, _texture: &TextureInfo) {}
    fn disable_texture(&mut self) {}
    fn draw_mesh(&mut self, _mesh: &Mesh, _state: &DrawState) {}
    fn push_matrix(&mut self) {}
    fn pop_matrix(&mut self) {}
    fn mult_matrix(&mut self, _matrix: &Mat4) {}
    fn set_clip_rect(&mut self, _rect: &ClipRect) {}
    fn reset_clip_rect(&mut self) {}
    fn set_clip_plane(&mut self, _plane: &Plane) {}
    fn reset_clip_plane(&mut self) {}
    fn add_light(&mut self, _light: &LightDesc) -> bool {
        true
    }
    fn remove_last_light(&mut self) {}
    fn clear_lights(&mut self) {}
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// `set_viewport_camera` with the camera position
    SetViewportCamera(Vec3),
    /// `draw_background` with the clear color
    DrawBackground(Vec4),
    /// `set_fog`, true when enabled
    SetFog(bool),
    /// `set_material` with the material transparency (`None` for unlit)
    SetMaterial(Option<f32>),
    /// `enable_texture`
    EnableTexture(u32),
    /// `disable_texture`
    DisableTexture,
    /// `draw_mesh`
    DrawMesh {
        /// Model matrix used
        model_matrix: Mat4,
        /// Triangles in the mesh
        triangles: usize,
        /// Cull state handed over
        cull_flag: CullFlag,
    },
    /// `push_matrix`
    PushMatrix,
    /// `pop_matrix`
    PopMatrix,
    /// `mult_matrix`
    MultMatrix(Mat4),
    /// `set_clip_rect`
    SetClipRect(ClipRect),
    /// `reset_clip_rect`
    ResetClipRect,
    /// `set_clip_plane`
    SetClipPlane(Plane),
    /// `reset_clip_plane`
    ResetClipPlane,
    /// `add_light`
    AddLight(LightType),
    /// `remove_last_light`
    RemoveLastLight,
    /// `clear_lights`
    ClearLights,
}

/// Backend that records every call, for inspection in tests and tools
#[derive(Debug, Default, Clone)]
pub struct RecordingBackend {
    /// Calls in order
    pub calls: Vec<BackendCall>,
    /// Lights the recorder accepts before refusing, unlimited when `None`
    pub light_capacity: Option<usize>,
    active_lights: usize,
    peak_lights: usize,
}

impl RecordingBackend {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that refuses lights past `capacity`
    pub fn with_light_capacity(capacity: usize) -> Self {
        Self {
            light_capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Model matrices of every draw, in order
    pub fn draws(&self) -> Vec<Mat4> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::DrawMesh { model_matrix, .. } => Some(*model_matrix),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls matching a predicate
    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Lights active right now
    pub fn active_lights(&self) -> usize {
        self.active_lights
    }

    /// Largest number of simultaneously active lights seen
    pub fn peak_lights(&self) -> usize {
        self.peak_lights
    }

    /// Forget recorded calls
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn set_viewport_camera(&mut self, camera: &Camera) {
        self.calls.push(BackendCall::SetViewportCamera(camera.position));
    }

    fn draw_background(&mut self, background: &BackgroundDesc) {
        self.calls.push(BackendCall::DrawBackground(background.color));
    }

    fn set_fog(&mut self, fog: Option<&FogDesc>) {
        self.calls.push(BackendCall::SetFog(fog.is_some()));
    }

    fn set_material(&mut self, material: Option<&Material>, _color: &ColorTransform) {
        self.calls.push(BackendCall::SetMaterial(material.map(|m| m.transparency)));
    }

    fn enable_texture(&mut self, texture: &TextureInfo) {
        self.calls.push(BackendCall::EnableTexture(texture.id));
    }

    fn disable_texture(&mut self) {
        self.calls.push(BackendCall::DisableTexture);
    }

    fn draw_mesh(&mut self, mesh: &Mesh, state: &DrawState) {
        self.calls.push(BackendCall::DrawMesh {
            model_matrix: state.model_matrix,
            triangles: mesh.triangle_count(),
            cull_flag: state.cull_flag,
        });
    }

    fn push_matrix(&mut self) {
        self.calls.push(BackendCall::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        self.calls.push(BackendCall::PopMatrix);
    }

    fn mult_matrix(&mut self, matrix: &Mat4) {
        self.calls.push(BackendCall::MultMatrix(*matrix));
    }

    fn set_clip_rect(&mut self, rect: &ClipRect) {
        self.calls.push(BackendCall::SetClipRect(*rect));
    }

    fn reset_clip_rect(&mut self) {
        self.calls.push(BackendCall::ResetClipRect);
    }

    fn set_clip_plane(&mut self, plane: &Plane) {
        self.calls.push(BackendCall::SetClipPlane(*plane));
    }

    fn reset_clip_plane(&mut self) {
        self.calls.push(BackendCall::ResetClipPlane);
    }

    fn add_light(&mut self, light: &LightDesc) -> bool {
        if self.light_capacity.is_some_and(|cap| self.active_lights >= cap) {
            return false;
        }
        self.calls.push(BackendCall::AddLight(light.light_type));
        self.active_lights += 1;
        self.peak_lights = self.peak_lights.max(self.active_lights);
        true
    }

    fn remove_last_light(&mut self) {
        self.calls.push(BackendCall::RemoveLastLight);
        self.active_lights = self.active_lights.saturating_sub(1);
    }

    fn clear_lights(&mut self) {
        self.calls.push(BackendCall::ClearLights);
        self.active_lights = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_rect_intersection() {
        let a = ClipRect::new(0.0, 0.0, 10.0, 10.0);
        let b = ClipRect::new(5.0, 5.0, 10.0, 10.0);
        let i = a.intersection(&b);
        assert_eq!(i, ClipRect::new(5.0, 5.0, 5.0, 5.0));
        let disjoint = a.intersection(&ClipRect::new(20.0, 20.0, 1.0, 1.0));
        assert!(disjoint.width.abs() < f32::EPSILON);
    }

    #[test]
    fn test_clip_rect_transformed_by_translation() {
        let rect = ClipRect::centered(2.0, 2.0);
        let moved = rect.transformed(&Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
        assert!(moved.contains(5.0, 0.0));
        assert!(!moved.contains(0.0, 0.0));
    }

    #[test]
    fn test_recording_backend_light_capacity() {
        let mut backend = RecordingBackend::with_light_capacity(1);
        let light = LightDesc::headlight(-Vec3::z());
        assert!(backend.add_light(&light));
        assert!(!backend.add_light(&light));
        backend.remove_last_light();
        assert_eq!(backend.active_lights(), 0);
        assert_eq!(backend.peak_lights(), 1);
    }
}
