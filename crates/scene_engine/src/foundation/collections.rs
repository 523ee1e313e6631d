//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle of a node stored in a [`SceneGraph`](crate::scene::SceneGraph)
    pub struct NodeId;
}

/// Handle-based map keyed by node handles
pub type NodeMap<T> = SlotMap<NodeId, T>;

