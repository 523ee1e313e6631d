//! Traversal pass identifiers

/// Purpose of the walk currently in progress
///
/// A frame issues `RenderBindable`, `Lighting` and `Sort` in that order and
/// then flushes the deferred queue with `Render`. `Pick` and `Collide` run
/// on demand. `Bounds` runs as a nested walk whenever cached bounds are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraversalPass {
    /// Recompute bounding volumes
    Bounds,
    /// Activate global lights
    Lighting,
    /// Cull, draw opaque content, queue transparent content
    Sort,
    /// Draw one node with state prepared by the caller
    Render,
    /// Hit-test a ray
    Pick,
    /// Probe for obstacles around the camera
    Collide,
    /// Register and apply bindable nodes
    #[default]
    RenderBindable,
}

impl TraversalPass {
    /// Passes that draw and so touch backend render state
    pub fn is_drawing(self) -> bool {
        matches!(self, Self::Sort | Self::Render)
    }
}
