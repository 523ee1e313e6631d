//! # Scene Engine
//!
//! Traversal core of a scene-graph presentation engine: one graph, walked
//! several times per frame for different purposes.
//!
//! ## Features
//!
//! - **Multi-pass traversal**: bounds, lighting, sort, render, pick and collide walks
//! - **Hierarchical culling**: sphere and plane tests against the view frustum
//! - **Deferred transparency**: back-to-front queue flushed after the sort walk
//! - **Bindable stacks**: background, viewpoint, fog and navigation resolution
//! - **Picking and collision**: closest-hit ray queries, stepped camera collision with gravity
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let root = graph.insert(Group::new());
//! let cube = graph.insert(Shape::new(BoxGeometry::cube(1.0)));
//! graph.add_child(root, cube)?;
//!
//! let mut surface = VisualSurface::new(800.0, 600.0, EngineConfig::default());
//! let mut backend = RecordingBackend::new();
//! let stats = surface.draw_frame(&mut graph, root, &mut backend);
//! assert_eq!(stats.drawn, 1);
//! # Ok::<(), scene_engine::SceneError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod error;
pub mod events;
pub mod foundation;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;
pub mod traversal;

pub use error::{SceneError, SceneResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{CollisionMode, EngineConfig},
        error::{SceneError, SceneResult},
        events::{EventHandler, EventQueue, EventType, SceneEvent},
        foundation::{
            collections::NodeId,
            math::{Mat4, Transform, Vec3},
        },
        geometry::{BoxGeometry, GeometryBuilder, IndexedTriangleSet, Mesh, Ray, Rectangle2D, SphereGeometry},
        input::{InputEvent, Modifiers, PointerEventKind},
        render::{
            Appearance, Camera, ClipRect, ColorTransform, Material, NavigationMode, RecordingBackend,
            RenderBackend,
        },
        scene::{
            Background, Clipper, ColorTransformGroup, DirectionalLight, Fog, Group, Layer, NavigationInfo,
            NodeBehavior, OrderedGroup, PointLight, SceneGraph, Shape, SpotLight, Switch, TouchSensor,
            TransformNode, Viewpoint,
        },
        traversal::{BindableKind, FrameStats, HitInfo, TraversalContext, TraversalPass, VisualSurface},
    };
}

#[cfg(test)]
mod tests;
