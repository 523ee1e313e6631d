//! Bindable stacks
//!
//! Each environment category (background, viewpoint, fog, navigation) keeps an
//! ordered stack of the nodes of that category seen in the scene. Only the
//! front entry is active, and only when the stack is bound. Every change of
//! the active node is reported exactly once as a
//! [`SceneEvent::BindableChanged`].

use crate::events::SceneEvent;
use crate::foundation::collections::NodeId;
use super::context::TraversalContext;

/// Bindable categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindableKind {
    /// Scene background
    Background,
    /// Camera placement
    Viewpoint,
    /// Distance fog
    Fog,
    /// Navigation parameters and avatar size
    NavigationInfo,
}

impl BindableKind {
    /// Every category, in the order they are applied each frame
    pub const ALL: [Self; 4] = [Self::Viewpoint, Self::NavigationInfo, Self::Background, Self::Fog];
}

/// Node side of the bindable protocol
pub trait BindableNode {
    /// Category this node belongs to
    fn bindable_kind(&self) -> BindableKind;

    /// Whether the node asks to become active when first registered
    fn wants_bind(&self) -> bool {
        false
    }

    /// Apply the node's environment to the context; called on the active node once per frame
    fn apply(&mut self, node: NodeId, ctx: &mut TraversalContext<'_>);
}

/// One category's stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindableStack {
    entries: Vec<NodeId>,
    bound: bool,
}

impl BindableStack {
    /// Active node, if any
    pub fn top(&self) -> Option<NodeId> {
        if self.bound {
            self.entries.first().copied()
        } else {
            None
        }
    }

    /// Whether `node` was ever registered
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains(&node)
    }

    /// Registered nodes, front first
    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a node at the back; the first node, or one that asks for it, becomes active.
    /// Returns true when the active node changed.
    pub fn register(&mut self, node: NodeId, wants_bind: bool) -> bool {
        if self.contains(node) {
            return false;
        }
        self.entries.push(node);
        if self.entries.len() == 1 || wants_bind {
            return self.activate(node);
        }
        false
    }

    /// Move `node` to the front and bind it. Returns true when the active node changed.
    pub fn activate(&mut self, node: NodeId) -> bool {
        if self.top() == Some(node) {
            return false;
        }
        self.entries.retain(|&n| n != node);
        self.entries.insert(0, node);
        self.bound = true;
        true
    }

    /// Unbind `node` if it is active: it moves to the back and the next entry takes over.
    /// Inactive nodes are left alone. Returns true when the active node changed.
    pub fn deactivate(&mut self, node: NodeId) -> bool {
        if self.top() != Some(node) {
            return false;
        }
        if self.entries.len() == 1 {
            self.bound = false;
        } else {
            self.entries.remove(0);
            self.entries.push(node);
        }
        true
    }

    /// Forget a node entirely. Returns true when the active node changed.
    pub fn unregister(&mut self, node: NodeId) -> bool {
        let was_top = self.top() == Some(node);
        self.entries.retain(|&n| n != node);
        if self.entries.is_empty() {
            self.bound = false;
        }
        was_top
    }
}

/// The four stacks of one surface or layer
#[derive(Debug, Clone, Default)]
pub struct BindableStacks {
    background: BindableStack,
    viewpoint: BindableStack,
    fog: BindableStack,
    navigation: BindableStack,
    changes: Vec<SceneEvent>,
}

impl BindableStacks {
    /// Empty stacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack for a category
    pub fn stack(&self, kind: BindableKind) -> &BindableStack {
        match kind {
            BindableKind::Background => &self.background,
            BindableKind::Viewpoint => &self.viewpoint,
            BindableKind::Fog => &self.fog,
            BindableKind::NavigationInfo => &self.navigation,
        }
    }

    fn stack_mut(&mut self, kind: BindableKind) -> &mut BindableStack {
        match kind {
            BindableKind::Background => &mut self.background,
            BindableKind::Viewpoint => &mut self.viewpoint,
            BindableKind::Fog => &mut self.fog,
            BindableKind::NavigationInfo => &mut self.navigation,
        }
    }

    fn note_change(&mut self, kind: BindableKind, changed: bool) -> bool {
        if changed {
            let active = self.stack(kind).top();
            log::debug!("Bindable {:?} now {:?}", kind, active);
            self.changes.push(SceneEvent::BindableChanged { kind, active });
        }
        changed
    }

    /// Active node of a category
    pub fn top(&self, kind: BindableKind) -> Option<NodeId> {
        self.stack(kind).top()
    }

    /// See [`BindableStack::register`]
    pub fn register(&mut self, kind: BindableKind, node: NodeId, wants_bind: bool) -> bool {
        let changed = self.stack_mut(kind).register(node, wants_bind);
        self.note_change(kind, changed)
    }

    /// See [`BindableStack::activate`]; unknown nodes are registered first
    pub fn activate(&mut self, kind: BindableKind, node: NodeId) -> bool {
        let changed = self.stack_mut(kind).activate(node);
        self.note_change(kind, changed)
    }

    /// See [`BindableStack::deactivate`]
    pub fn deactivate(&mut self, kind: BindableKind, node: NodeId) -> bool {
        let changed = self.stack_mut(kind).deactivate(node);
        self.note_change(kind, changed)
    }

    /// Drop a node from whichever stack holds it
    pub fn forget(&mut self, node: NodeId) -> bool {
        let mut any = false;
        for kind in BindableKind::ALL {
            let changed = self.stack_mut(kind).unregister(node);
            any |= self.note_change(kind, changed);
        }
        any
    }

    /// Take the change notifications accumulated so far
    pub fn drain_changes(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.changes)
    }

    /// Whether changes are waiting to be drained
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_first_registration_binds() {
        let n = ids(2);
        let mut stacks = BindableStacks::new();
        assert!(stacks.register(BindableKind::Viewpoint, n[0], false));
        assert!(!stacks.register(BindableKind::Viewpoint, n[1], false));
        assert_eq!(stacks.top(BindableKind::Viewpoint), Some(n[0]));
        assert_eq!(stacks.drain_changes().len(), 1);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let n = ids(1);
        let mut stacks = BindableStacks::new();
        stacks.register(BindableKind::Fog, n[0], false);
        stacks.register(BindableKind::Fog, n[0], true);
        assert_eq!(stacks.stack(BindableKind::Fog).len(), 1);
        assert_eq!(stacks.drain_changes().len(), 1);
    }

    #[test]
    fn test_activate_then_deactivate_restores_previous_top() {
        let n = ids(2);
        let mut stacks = BindableStacks::new();
        stacks.register(BindableKind::Background, n[0], false);
        stacks.register(BindableKind::Background, n[1], false);
        stacks.drain_changes();

        assert!(stacks.activate(BindableKind::Background, n[1]));
        assert_eq!(stacks.top(BindableKind::Background), Some(n[1]));
        assert!(stacks.deactivate(BindableKind::Background, n[1]));
        assert_eq!(stacks.top(BindableKind::Background), Some(n[0]));

        let changes = stacks.drain_changes();
        assert_eq!(
            changes,
            vec![
                SceneEvent::BindableChanged { kind: BindableKind::Background, active: Some(n[1]) },
                SceneEvent::BindableChanged { kind: BindableKind::Background, active: Some(n[0]) },
            ]
        );
    }

    #[test]
    fn test_repeated_activation_notifies_once() {
        let n = ids(2);
        let mut stacks = BindableStacks::new();
        stacks.register(BindableKind::Viewpoint, n[0], false);
        stacks.register(BindableKind::Viewpoint, n[1], false);
        stacks.drain_changes();
        assert!(stacks.activate(BindableKind::Viewpoint, n[1]));
        assert!(!stacks.activate(BindableKind::Viewpoint, n[1]));
        assert_eq!(stacks.drain_changes().len(), 1);
    }

    #[test]
    fn test_deactivating_sole_entry_unbinds() {
        let n = ids(1);
        let mut stacks = BindableStacks::new();
        stacks.register(BindableKind::NavigationInfo, n[0], false);
        assert!(stacks.deactivate(BindableKind::NavigationInfo, n[0]));
        assert_eq!(stacks.top(BindableKind::NavigationInfo), None);
        assert!(stacks.stack(BindableKind::NavigationInfo).contains(n[0]));
        assert!(stacks.activate(BindableKind::NavigationInfo, n[0]));
        assert_eq!(stacks.top(BindableKind::NavigationInfo), Some(n[0]));
    }

    #[test]
    fn test_deactivating_inactive_entry_is_noop() {
        let n = ids(2);
        let mut stacks = BindableStacks::new();
        stacks.register(BindableKind::Viewpoint, n[0], false);
        stacks.register(BindableKind::Viewpoint, n[1], false);
        stacks.drain_changes();
        assert!(!stacks.deactivate(BindableKind::Viewpoint, n[1]));
        assert!(!stacks.has_changes());
    }

    #[test]
    fn test_forget_active_node_promotes_next() {
        let n = ids(2);
        let mut stacks = BindableStacks::new();
        stacks.register(BindableKind::Viewpoint, n[0], false);
        stacks.register(BindableKind::Viewpoint, n[1], false);
        stacks.drain_changes();
        assert!(stacks.forget(n[0]));
        assert_eq!(stacks.top(BindableKind::Viewpoint), Some(n[1]));
    }
}
