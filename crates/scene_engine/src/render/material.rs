//! Surface appearance and color transforms

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Fixed-function material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Diffuse color
    pub diffuse: Vec3,
    /// Emissive color
    pub emissive: Vec3,
    /// Specular color
    pub specular: Vec3,
    /// Ambient reflection factor
    pub ambient_intensity: f32,
    /// Specular exponent factor in `[0, 1]`
    pub shininess: f32,
    /// 0 is opaque, 1 fully transparent
    pub transparency: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec3::new(0.8, 0.8, 0.8),
            emissive: Vec3::zeros(),
            specular: Vec3::zeros(),
            ambient_intensity: 0.2,
            shininess: 0.2,
            transparency: 0.0,
        }
    }
}

impl Material {
    /// Material with the given diffuse color
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            diffuse: color,
            ..Default::default()
        }
    }

    /// Set transparency
    #[must_use]
    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }

    /// Whether blending is needed
    pub fn has_alpha(&self) -> bool {
        self.transparency > 0.0
    }
}

/// Reference to a texture living in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Backend texture id
    pub id: u32,
    /// Texture carries an alpha channel
    pub transparent: bool,
}

/// Material plus optional texture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    /// Lighting material, unlit when `None`
    pub material: Option<Material>,
    /// Bound texture
    pub texture: Option<TextureInfo>,
}

impl Appearance {
    /// Appearance using only a material
    pub fn with_material(material: Material) -> Self {
        Self {
            material: Some(material),
            texture: None,
        }
    }

    /// Attach a texture
    #[must_use]
    pub fn textured(mut self, texture: TextureInfo) -> Self {
        self.texture = Some(texture);
        self
    }
}

/// Affine RGBA transform: `out = matrix * color + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    /// Channel mixing matrix
    pub matrix: Mat4,
    /// Added after mixing
    pub offset: Vec4,
    identity: bool,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorTransform {
    /// The transform that leaves colors untouched
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
            offset: Vec4::zeros(),
            identity: true,
        }
    }

    /// Transform from a mixing matrix and offset
    pub fn new(matrix: Mat4, offset: Vec4) -> Self {
        let identity = matrix == Mat4::identity() && offset == Vec4::zeros();
        Self { matrix, offset, identity }
    }

    /// Scale alpha only
    pub fn alpha_scale(alpha: f32) -> Self {
        let mut matrix = Mat4::identity();
        matrix[(3, 3)] = alpha;
        Self::new(matrix, Vec4::zeros())
    }

    /// Whether this transform changes anything
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// `self` applied after `inner`
    #[must_use]
    pub fn compose(&self, inner: &Self) -> Self {
        if inner.identity {
            return *self;
        }
        if self.identity {
            return *inner;
        }
        Self::new(self.matrix * inner.matrix, self.matrix * inner.offset + self.offset)
    }

    /// Transform one RGBA color
    pub fn apply(&self, color: Vec4) -> Vec4 {
        if self.identity {
            color
        } else {
            self.matrix * color + self.offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_detection() {
        assert!(ColorTransform::identity().is_identity());
        assert!(ColorTransform::new(Mat4::identity(), Vec4::zeros()).is_identity());
        assert!(!ColorTransform::alpha_scale(0.5).is_identity());
    }

    #[test]
    fn test_compose_applies_inner_first() {
        let half_alpha = ColorTransform::alpha_scale(0.5);
        let add_red = ColorTransform::new(Mat4::identity(), Vec4::new(0.1, 0.0, 0.0, 0.0));
        let composed = add_red.compose(&half_alpha);
        let out = composed.apply(Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!((out.x - 0.1).abs() < 0.001);
        assert!((out.w - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_material_alpha() {
        assert!(!Material::default().has_alpha());
        assert!(Material::default().with_transparency(0.3).has_alpha());
    }
}
