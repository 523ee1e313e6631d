//! Node storage and dispatch
//!
//! Nodes live in a slot map and are addressed by [`NodeId`]. A node may have
//! several parents, so the structure is a DAG and may even contain cycles
//! created by careless edits; traversal guards against revisiting a node that
//! is already on the current path.
//!
//! Dispatch works by temporarily taking a node's behavior out of its slot for
//! the duration of its `render` call. The behavior then gets `&mut SceneGraph`
//! to visit its children, and a re-entrant visit of the same node finds the
//! slot empty and is skipped.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use crate::error::{SceneError, SceneResult};
use crate::foundation::collections::{NodeId, NodeMap};
use crate::traversal::bindable::{BindableKind, BindableNode};
use crate::traversal::context::TraversalContext;
use crate::traversal::sensors::SensorNode;

bitflags! {
    /// Cached-state invalidation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u8 {
        /// The node's own fields changed
        const NODE_DIRTY = 1 << 0;
        /// Something below the node changed; cached bounds are stale
        const CHILD_DIRTY = 1 << 1;
        /// The node's mesh must be rebuilt
        const GEOMETRY_DIRTY = 1 << 2;
    }
}

/// Coarse node category used by groups to classify their children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Composite node with children
    Grouping,
    /// Isolated sub-scene with its own bindables
    Layer,
    /// Drawable geometry
    Shape,
    /// Light affecting only its siblings' subtrees
    LocalLight,
    /// Light affecting the whole scene
    GlobalLight,
    /// Environment node
    Bindable(BindableKind),
    /// Pointer sensor
    Sensor,
    /// Anything else
    Other,
}

impl NodeKind {
    /// Whether children may be attached
    pub fn can_have_children(self) -> bool {
        matches!(self, Self::Grouping | Self::Layer)
    }
}

/// Helper giving every node `Any` access without per-type boilerplate
pub trait AsAny {
    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior attached to a node
///
/// `render` is called once per visit, in every pass; implementations branch
/// on `ctx.pass` and return immediately for passes they ignore.
pub trait NodeBehavior: AsAny + std::fmt::Debug {
    /// Category of this node
    fn kind(&self) -> NodeKind;

    /// Visit the node
    fn render(&mut self, node: NodeId, graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>);

    /// Release resources; called exactly once when the node leaves the graph
    fn destroy(&mut self) {}

    /// Sensor capability
    fn as_sensor(&mut self) -> Option<&mut dyn SensorNode> {
        None
    }

    /// Bindable capability
    fn as_bindable(&mut self) -> Option<&mut dyn BindableNode> {
        None
    }
}

struct NodeSlot {
    behavior: Option<Box<dyn NodeBehavior>>,
    kind: NodeKind,
    name: Option<String>,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
    dirty: DirtyFlags,
}

/// The scene graph
#[derive(Default)]
pub struct SceneGraph {
    nodes: NodeMap<NodeSlot>,
    names: HashMap<String, NodeId>,
    removed: Vec<NodeId>,
}

impl SceneGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node is stored
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Store a node; it starts fully dirty
    pub fn insert<N: NodeBehavior + 'static>(&mut self, behavior: N) -> NodeId {
        let kind = behavior.kind();
        let id = self.nodes.insert(NodeSlot {
            behavior: Some(Box::new(behavior)),
            kind,
            name: None,
            children: Vec::new(),
            parents: Vec::new(),
            dirty: DirtyFlags::all(),
        });
        log::trace!("Inserted {:?} node {:?}", kind, id);
        id
    }

    /// Store a node under a unique name
    pub fn insert_named<N: NodeBehavior + 'static>(&mut self, name: impl Into<String>, behavior: N) -> SceneResult<NodeId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(SceneError::DuplicateName(name));
        }
        let id = self.insert(behavior);
        if let Some(slot) = self.nodes.get_mut(id) {
            slot.name = Some(name.clone());
        }
        self.names.insert(name, id);
        Ok(id)
    }

    /// Look a node up by name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Name given at insertion
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node)?.name.as_deref()
    }

    /// Category of a node
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(node).map(|slot| slot.kind)
    }

    /// Children in order; empty for unknown nodes
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[], |slot| slot.children.as_slice())
    }

    /// Parents in attachment order; empty for unknown nodes
    pub fn parents(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[], |slot| slot.parents.as_slice())
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        let parent_slot = self.nodes.get(parent).ok_or(SceneError::UnknownNode(parent))?;
        if !self.nodes.contains_key(child) {
            return Err(SceneError::UnknownNode(child));
        }
        if !parent_slot.kind.can_have_children() {
            return Err(SceneError::NotAGroup(parent));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Whether `ancestor` is reachable upward from `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = self.parents(node).to_vec();
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if seen.insert(current) {
                stack.extend_from_slice(self.parents(current));
            }
        }
        false
    }

    /// Append a child
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Insert a child at `index` (clamped to the child count)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> SceneResult<()> {
        self.check_attach(parent, child)?;
        if let Some(slot) = self.nodes.get_mut(parent) {
            let index = index.min(slot.children.len());
            slot.children.insert(index, child);
        }
        if let Some(slot) = self.nodes.get_mut(child) {
            slot.parents.push(parent);
        }
        self.mark_dirty(parent, DirtyFlags::CHILD_DIRTY);
        Ok(())
    }

    /// Detach the first occurrence of `child` under `parent`; returns whether it was attached
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<bool> {
        let slot = self.nodes.get_mut(parent).ok_or(SceneError::UnknownNode(parent))?;
        let Some(pos) = slot.children.iter().position(|&c| c == child) else {
            return Ok(false);
        };
        slot.children.remove(pos);
        if let Some(child_slot) = self.nodes.get_mut(child) {
            if let Some(p) = child_slot.parents.iter().position(|&p| p == parent) {
                child_slot.parents.remove(p);
            }
        }
        self.mark_dirty(parent, DirtyFlags::CHILD_DIRTY);
        Ok(true)
    }

    /// Remove a node from the graph and destroy it
    ///
    /// The node is detached from its parents and children; children stay in
    /// the graph. Its handle is reported by [`take_removed`](Self::take_removed).
    pub fn remove(&mut self, node: NodeId) -> SceneResult<()> {
        let slot = self.nodes.remove(node).ok_or(SceneError::UnknownNode(node))?;
        for parent in &slot.parents {
            if let Some(p) = self.nodes.get_mut(*parent) {
                p.children.retain(|&c| c != node);
            }
            self.mark_dirty(*parent, DirtyFlags::CHILD_DIRTY);
        }
        for child in &slot.children {
            if let Some(c) = self.nodes.get_mut(*child) {
                c.parents.retain(|&p| p != node);
            }
        }
        if let Some(name) = &slot.name {
            self.names.remove(name);
        }
        if let Some(mut behavior) = slot.behavior {
            behavior.destroy();
        }
        // a node removed while its own render is running is destroyed by traverse
        self.removed.push(node);
        log::debug!("Removed node {:?}", node);
        Ok(())
    }

    /// Handles removed since the last call
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed)
    }

    /// Current dirty flags; empty for unknown nodes
    pub fn dirty(&self, node: NodeId) -> DirtyFlags {
        self.nodes.get(node).map_or(DirtyFlags::empty(), |slot| slot.dirty)
    }

    /// Set `flags` on `node` and mark every ancestor `CHILD_DIRTY`
    pub fn mark_dirty(&mut self, node: NodeId, flags: DirtyFlags) {
        let Some(slot) = self.nodes.get_mut(node) else { return };
        slot.dirty |= flags;
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = slot.parents.clone();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(p) = self.nodes.get_mut(current) {
                p.dirty |= DirtyFlags::CHILD_DIRTY;
                stack.extend_from_slice(&p.parents);
            }
        }
    }

    /// Clear `flags` on `node` only
    pub fn clear_dirty(&mut self, node: NodeId, flags: DirtyFlags) {
        if let Some(slot) = self.nodes.get_mut(node) {
            slot.dirty.remove(flags);
        }
    }

    /// The node's fields changed in a way that affects bounds
    pub fn invalidate(&mut self, node: NodeId) {
        self.mark_dirty(node, DirtyFlags::NODE_DIRTY | DirtyFlags::CHILD_DIRTY);
    }

    /// The node's geometry must be rebuilt
    pub fn set_geometry_dirty(&mut self, node: NodeId) {
        self.mark_dirty(node, DirtyFlags::NODE_DIRTY | DirtyFlags::GEOMETRY_DIRTY);
    }

    /// Borrow a node's concrete behavior
    ///
    /// Returns `None` for unknown nodes, other types, and nodes whose
    /// `render` is currently running.
    pub fn get<T: NodeBehavior + 'static>(&self, node: NodeId) -> Option<&T> {
        let behavior = self.nodes.get(node)?.behavior.as_deref()?;
        behavior.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow a node's concrete behavior; see [`get`](Self::get)
    pub fn get_mut<T: NodeBehavior + 'static>(&mut self, node: NodeId) -> Option<&mut T> {
        let behavior = self.nodes.get_mut(node)?.behavior.as_deref_mut()?;
        behavior.as_any_mut().downcast_mut::<T>()
    }

    /// Edit a node and invalidate its cached state
    pub fn edit<T: NodeBehavior + 'static, R>(&mut self, node: NodeId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let result = f(self.get_mut::<T>(node)?);
        self.invalidate(node);
        Some(result)
    }

    /// Run `f` on a node's sensor capability
    pub fn with_sensor<R>(&mut self, node: NodeId, f: impl FnOnce(&mut dyn SensorNode) -> R) -> Option<R> {
        let behavior = self.nodes.get_mut(node)?.behavior.as_deref_mut()?;
        behavior.as_sensor().map(f)
    }

    /// Run `f` on a node's bindable capability
    pub fn with_bindable<R>(&mut self, node: NodeId, f: impl FnOnce(&mut dyn BindableNode) -> R) -> Option<R> {
        let behavior = self.nodes.get_mut(node)?.behavior.as_deref_mut()?;
        behavior.as_bindable().map(f)
    }

    /// Apply the active bindable of `node` to the context, without a full visit
    pub fn apply_bindable(&mut self, node: NodeId, ctx: &mut TraversalContext<'_>) -> bool {
        let Some(slot) = self.nodes.get_mut(node) else { return false };
        let Some(mut behavior) = slot.behavior.take() else { return false };
        let applied = match behavior.as_bindable() {
            Some(bindable) => {
                bindable.apply(node, ctx);
                true
            }
            None => false,
        };
        self.put_back(node, behavior);
        applied
    }

    /// Visit `node` with the context's current pass
    pub fn traverse(&mut self, node: NodeId, ctx: &mut TraversalContext<'_>) {
        let Some(slot) = self.nodes.get_mut(node) else {
            log::trace!("Skipping unknown node {:?}", node);
            return;
        };
        let Some(mut behavior) = slot.behavior.take() else {
            log::debug!("Node {:?} is already being visited, skipping re-entrant visit", node);
            return;
        };
        behavior.render(node, self, ctx);
        self.put_back(node, behavior);
    }

    fn put_back(&mut self, node: NodeId, mut behavior: Box<dyn NodeBehavior>) {
        match self.nodes.get_mut(node) {
            Some(slot) => slot.behavior = Some(behavior),
            None => behavior.destroy(),
        }
    }
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .field("named", &self.names.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoxGeometry;
    use crate::scene::{Group, Shape};

    #[test]
    fn test_cycle_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(Group::new());
        let b = graph.insert(Group::new());
        graph.add_child(a, b).unwrap();
        assert!(matches!(graph.add_child(b, a), Err(SceneError::Cycle { .. })));
        assert!(matches!(graph.add_child(a, a), Err(SceneError::Cycle { .. })));
    }

    #[test]
    fn test_shape_cannot_have_children() {
        let mut graph = SceneGraph::new();
        let shape = graph.insert(Shape::new(BoxGeometry::cube(1.0)));
        let group = graph.insert(Group::new());
        assert!(matches!(graph.add_child(shape, group), Err(SceneError::NotAGroup(_))));
    }

    #[test]
    fn test_dirty_propagates_to_every_ancestor() {
        let mut graph = SceneGraph::new();
        let left = graph.insert(Group::new());
        let right = graph.insert(Group::new());
        let shared = graph.insert(Shape::new(BoxGeometry::cube(1.0)));
        graph.add_child(left, shared).unwrap();
        graph.add_child(right, shared).unwrap();
        for node in [left, right, shared] {
            graph.clear_dirty(node, DirtyFlags::all());
        }

        graph.set_geometry_dirty(shared);
        assert!(graph.dirty(shared).contains(DirtyFlags::GEOMETRY_DIRTY));
        assert_eq!(graph.dirty(left), DirtyFlags::CHILD_DIRTY);
        assert_eq!(graph.dirty(right), DirtyFlags::CHILD_DIRTY);
    }

    #[test]
    fn test_remove_detaches_and_reports() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Group::new());
        let child = graph.insert_named("child", Group::new()).unwrap();
        graph.add_child(root, child).unwrap();

        graph.remove(child).unwrap();
        assert!(graph.children(root).is_empty());
        assert_eq!(graph.find("child"), None);
        assert_eq!(graph.take_removed(), vec![child]);
        assert!(graph.take_removed().is_empty());
        assert!(matches!(graph.remove(child), Err(SceneError::UnknownNode(_))));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut graph = SceneGraph::new();
        graph.insert_named("a", Group::new()).unwrap();
        assert!(matches!(graph.insert_named("a", Group::new()), Err(SceneError::DuplicateName(_))));
    }
}
