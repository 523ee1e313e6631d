//! Scene graph storage and the node catalogue
//!
//! The [`SceneGraph`] arena owns every node; node types implement
//! [`NodeBehavior`] and branch on the traversal pass in their `render`.
//!
//! ## Node families
//!
//! - Grouping: [`Group`], [`TransformNode`], [`OrderedGroup`], [`Switch`],
//!   [`ColorTransformGroup`], [`Clipper`], [`Layer`]
//! - Drawables: [`Shape`]
//! - Lights: [`DirectionalLight`] (local), [`PointLight`], [`SpotLight`] (global)
//! - Bindables: [`Background`], [`Viewpoint`], [`Fog`], [`NavigationInfo`]
//! - Sensors: [`TouchSensor`]

mod graph;
mod grouping;
mod layer;
mod shape;
mod lights;
mod environment;
mod touch_sensor;

pub use graph::{AsAny, DirtyFlags, NodeBehavior, NodeKind, SceneGraph};
pub use grouping::{Clipper, ColorTransformGroup, Group, OrderedGroup, Switch, TransformNode};
pub use layer::Layer;
pub use shape::Shape;
pub use lights::{DirectionalLight, PointLight, SpotLight};
pub use environment::{Background, Fog, NavigationInfo, Viewpoint};
pub use touch_sensor::TouchSensor;
