//! Rendering-side types: camera, lights, materials and the backend seam

pub mod backend;
pub mod camera;
pub mod lighting;
pub mod material;

pub use backend::{
    BackendCall, BackgroundDesc, ClipRect, DrawState, FogDesc, NullBackend, RecordingBackend,
    RenderBackend,
};
pub use camera::{AvatarSize, Camera, CollideFlags, Frustum, FrustumPlane, NavigationMode};
pub use lighting::{LightDesc, LightType};
pub use material::{Appearance, ColorTransform, Material, TextureInfo};
