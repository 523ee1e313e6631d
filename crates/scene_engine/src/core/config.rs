//! # Unified Configuration System
//!
//! Configuration for the traversal engine. Everything here can be loaded from
//! TOML or RON through the [`Config`] trait and is validated before use.
//!
//! ## Configuration Categories
//!
//! - **Limits**: hardware-like caps on simultaneous lights and clip planes
//! - **Collision**: avatar collision response and gravity
//! - **Culling**: global switch for frustum culling
//! - **Picking**: hit comparison tolerance

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// # Limits Configuration
///
/// Caps mirroring what a fixed-function backend can hold at once. Lights and
/// clip planes past the cap are skipped, first registered wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of simultaneously active lights
    pub max_lights: usize,
    /// Maximum number of simultaneously active clip planes
    pub max_clip_planes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_lights: 8,
            max_clip_planes: 6,
        }
    }
}

/// How the camera reacts when a move hits geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionMode {
    /// No collision detection at all
    None,
    /// Cancel the offending step
    Revert,
    /// Push the camera back out of the obstacle
    #[default]
    Slide,
}

/// # Collision Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Collision response
    pub mode: CollisionMode,
    /// Whether the avatar is kept on the ground
    pub gravity: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            mode: CollisionMode::Slide,
            gravity: true,
        }
    }
}

/// # Culling Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CullingConfig {
    /// When false every volume is treated as fully visible
    pub enabled: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// # Picking Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickingConfig {
    /// A candidate hit replaces the current one only when closer by more than this
    pub hit_epsilon: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self { hit_epsilon: 1e-6 }
    }
}

/// # Engine Configuration
///
/// Top-level configuration for a visual surface and the traversals it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter handed to `foundation::logging::init_with_level`
    pub log_level: String,
    /// Backend capacity limits
    pub limits: LimitsConfig,
    /// Collision settings
    pub collision: CollisionConfig,
    /// Culling settings
    pub culling: CullingConfig,
    /// Picking settings
    pub picking: PickingConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            limits: LimitsConfig::default(),
            collision: CollisionConfig::default(),
            culling: CullingConfig::default(),
            picking: PickingConfig::default(),
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set light and clip plane caps
    #[must_use]
    pub fn with_limits(mut self, max_lights: usize, max_clip_planes: usize) -> Self {
        self.limits = LimitsConfig { max_lights, max_clip_planes };
        self
    }

    /// Set collision behaviour
    #[must_use]
    pub fn with_collision(mut self, mode: CollisionMode, gravity: bool) -> Self {
        self.collision = CollisionConfig { mode, gravity };
        self
    }

    /// Enable or disable frustum culling
    #[must_use]
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.culling.enabled = enabled;
        self
    }

    /// Set the picking tolerance
    #[must_use]
    pub fn with_hit_epsilon(mut self, epsilon: f32) -> Self {
        self.picking.hit_epsilon = epsilon;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_lights == 0 {
            return Err("max_lights must be at least 1".to_string());
        }
        if self.limits.max_clip_planes == 0 {
            return Err("max_clip_planes must be at least 1".to_string());
        }
        if !self.picking.hit_epsilon.is_finite() || self.picking.hit_epsilon < 0.0 {
            return Err(format!("hit_epsilon must be a non-negative number, got {}", self.picking.hit_epsilon));
        }
        Ok(())
    }

    /// Load from file and validate in one step
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Flatten into the copyable settings consulted during traversal
    pub fn traversal_settings(&self) -> TraversalSettings {
        TraversalSettings {
            max_lights: self.limits.max_lights,
            max_clip_planes: self.limits.max_clip_planes,
            culling_enabled: self.culling.enabled,
            hit_epsilon: self.picking.hit_epsilon,
            collision_mode: self.collision.mode,
            gravity: self.collision.gravity,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-traversal copy of the settings a [`TraversalContext`](crate::traversal::TraversalContext) reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalSettings {
    /// See [`LimitsConfig::max_lights`]
    pub max_lights: usize,
    /// See [`LimitsConfig::max_clip_planes`]
    pub max_clip_planes: usize,
    /// See [`CullingConfig::enabled`]
    pub culling_enabled: bool,
    /// See [`PickingConfig::hit_epsilon`]
    pub hit_epsilon: f32,
    /// See [`CollisionConfig::mode`]
    pub collision_mode: CollisionMode,
    /// See [`CollisionConfig::gravity`]
    pub gravity: bool,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        EngineConfig::new().traversal_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.max_lights, 8);
        assert_eq!(config.limits.max_clip_planes, 6);
        assert_eq!(config.collision.mode, CollisionMode::Slide);
    }

    #[test]
    fn test_zero_lights_rejected() {
        let config = EngineConfig::new().with_limits(0, 6);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = std::env::temp_dir().join("scene_engine_config_test.toml");
        let path = path.to_string_lossy().to_string();
        let config = EngineConfig::new()
            .with_limits(2, 1)
            .with_collision(CollisionMode::Revert, false);
        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_validated(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let loaded: EngineConfig = ron::from_str("(limits: (max_lights: 3, max_clip_planes: 2))").unwrap();
        assert_eq!(loaded.limits.max_lights, 3);
        assert!(loaded.culling.enabled);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = EngineConfig::load_from_file("settings.ini");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
    }
}
