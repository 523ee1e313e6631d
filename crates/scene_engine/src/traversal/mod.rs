//! Multi-pass scene traversal
//!
//! Every frame walks the same graph several times, once per
//! [`TraversalPass`], threading a single [`TraversalContext`] through the
//! visits. Picking and collision run their own walks on demand.

pub mod bindable;
pub mod collide;
pub mod context;
pub mod cull;
pub mod deferred;
pub mod frame;
pub mod group;
pub mod pass;
pub mod pick;
pub mod sensors;
pub mod surface;

pub use bindable::{BindableKind, BindableNode, BindableStack, BindableStacks};
pub use collide::{check_collisions, collide_drawable, CollisionOutcome};
pub use context::{ContextSnapshot, FrameStats, LightContext, TraversalContext};
pub use cull::{classify, node_cull, CullFlag};
pub use deferred::{DeferredEntry, DeferredQueue};
pub use frame::render_passes;
pub use group::GroupCache;
pub use pass::TraversalPass;
pub use pick::{pick_drawable, HitInfo, PickState};
pub use sensors::{SensorManager, SensorNode};
pub use surface::VisualSurface;

