//! Light descriptions handed to backends

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct LightDesc {
    /// Light type
    pub light_type: LightType,
    /// Light position (for point/spot lights)
    pub position: Vec3,
    /// Light direction (for directional/spot lights)
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Ambient contribution
    pub ambient_intensity: f32,
    /// Constant, linear and quadratic attenuation
    pub attenuation: Vec3,
    /// Light range (for point/spot lights)
    pub range: f32,
    /// Full-intensity cone angle for spot lights (in radians)
    pub beam_width: f32,
    /// Cutoff cone angle for spot lights (in radians)
    pub cutoff_angle: f32,
}

impl LightDesc {
    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction: direction.normalize(),
            color,
            intensity,
            ambient_intensity: 0.0,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            range: 0.0,
            beam_width: 0.0,
            cutoff_angle: 0.0,
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            direction: Vec3::zeros(),
            range,
            ..Self::directional(-Vec3::z(), color, intensity)
        }
    }

    /// Create a spot light
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        beam_width: f32,
        cutoff_angle: f32,
    ) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            direction: direction.normalize(),
            range,
            beam_width,
            cutoff_angle,
            ..Self::directional(direction, color, intensity)
        }
    }

    /// White directional light shining along the view direction
    pub fn headlight(view_direction: Vec3) -> Self {
        Self::directional(view_direction, Vec3::new(1.0, 1.0, 1.0), 1.0)
    }

    /// Same light expressed in world space given its node's model matrix
    #[must_use]
    pub fn transformed(&self, model: &Mat4) -> Self {
        let mut out = self.clone();
        out.position = model.transform_point3(&self.position);
        if self.light_type != LightType::Point {
            out.direction = model
                .transform_dir(&self.direction)
                .try_normalize(f32::EPSILON)
                .unwrap_or(self.direction);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_keeps_type_and_range() {
        let light = LightDesc::point(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 1.0, 1.0), 0.5, 10.0);
        assert_eq!(light.light_type, LightType::Point);
        assert!((light.range - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_transformed_moves_position_and_rotates_direction() {
        let light = LightDesc::spot(Vec3::zeros(), -Vec3::z(), Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0, 0.5, 0.8);
        let model = Mat4::new_translation(&Vec3::new(0.0, 3.0, 0.0))
            * Mat4::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let world = light.transformed(&model);
        assert!((world.position.y - 3.0).abs() < 0.001);
        assert!((world.direction.x + 1.0).abs() < 0.001);
    }
}
