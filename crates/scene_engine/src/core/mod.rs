//! # Core Module
//!
//! Shared configuration for every traversal subsystem.
//!
//! ## Organization
//!
//! - **Config**: engine limits, collision, culling and picking settings

pub mod config;

pub use config::{
    CollisionConfig,
    CollisionMode,
    CullingConfig,
    EngineConfig,
    LimitsConfig,
    PickingConfig,
    TraversalSettings,
    Config,
    ConfigError,
};
