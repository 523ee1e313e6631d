//! Scene notifications raised during traversal
//!
//! Key principles:
//! - Traversal code only queues events, it never calls handlers directly
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)

use std::collections::HashMap;

use crate::foundation::collections::NodeId;
use crate::foundation::math::Vec3;
use crate::traversal::bindable::BindableKind;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Top of a bindable stack changed
    BindableChanged,
    /// Pointer entered geometry governed by a sensor
    SensorOver,
    /// Pointer left geometry governed by a sensor
    SensorOut,
    /// Sensor became active or inactive
    SensorActivate,
    /// Pointer moved over an active or hovered sensor
    SensorMove,
    /// Camera movement touched an obstacle
    CollisionDetected,
    /// Avatar gained or lost ground contact
    GroundContactChanged,
}

/// Event payloads
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// New top of the `kind` stack, `None` when nothing is bound anymore
    BindableChanged {
        /// Stack category
        kind: BindableKind,
        /// Newly active node
        active: Option<NodeId>,
    },
    /// Pointer is now over the sensor's geometry
    SensorOver {
        /// Sensor node
        sensor: NodeId,
    },
    /// Pointer is no longer over the sensor's geometry
    SensorOut {
        /// Sensor node
        sensor: NodeId,
    },
    /// Sensor activation state changed
    SensorActivate {
        /// Sensor node
        sensor: NodeId,
        /// New activation state
        active: bool,
    },
    /// Pointer moved while over the sensor
    SensorMove {
        /// Sensor node
        sensor: NodeId,
        /// World-space hit point
        point: Vec3,
        /// Surface normal at the hit, local coordinates
        normal: Vec3,
    },
    /// A camera step touched geometry
    CollisionDetected {
        /// Closest world-space contact point
        point: Vec3,
    },
    /// Ground contact toggled
    GroundContactChanged {
        /// True when the avatar now stands on something
        on_ground: bool,
    },
}

impl SceneEvent {
    /// Type tag used for handler lookup
    pub fn event_type(&self) -> EventType {
        match self {
            Self::BindableChanged { .. } => EventType::BindableChanged,
            Self::SensorOver { .. } => EventType::SensorOver,
            Self::SensorOut { .. } => EventType::SensorOut,
            Self::SensorActivate { .. } => EventType::SensorActivate,
            Self::SensorMove { .. } => EventType::SensorMove,
            Self::CollisionDetected { .. } => EventType::CollisionDetected,
            Self::GroundContactChanged { .. } => EventType::GroundContactChanged,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &SceneEvent) -> bool;
}

/// Pending notifications plus the handlers interested in them
#[derive(Default)]
pub struct EventQueue {
    pending: Vec<SceneEvent>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl EventQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a specific event type
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Queue an event
    pub fn push(&mut self, event: SceneEvent) {
        log::trace!("Queued scene event {:?}", event);
        self.pending.push(event);
    }

    /// Number of undelivered events
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending events, oldest first
    pub fn pending(&self) -> &[SceneEvent] {
        &self.pending
    }

    /// Take every pending event without notifying handlers
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Deliver every pending event, returns how many were consumed
    pub fn dispatch(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut consumed = 0;
        for event in &pending {
            if let Some(handlers) = self.handlers.get_mut(&event.event_type()) {
                for handler in handlers.iter_mut() {
                    if handler.on_event(event) {
                        consumed += 1;
                        break;
                    }
                }
            }
        }
        consumed
    }

    /// Move pending events of `other` to the back of this queue
    pub fn append(&mut self, other: &mut Self) {
        self.pending.append(&mut other.pending);
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending)
            .field("handler_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counter {
        seen: Rc<RefCell<u32>>,
        consume: bool,
    }

    impl EventHandler for Counter {
        fn on_event(&mut self, _event: &SceneEvent) -> bool {
            *self.seen.borrow_mut() += 1;
            self.consume
        }
    }

    #[test]
    fn test_consumed_event_stops_forwarding() {
        let first = Rc::new(RefCell::new(0));
        let second = Rc::new(RefCell::new(0));
        let mut queue = EventQueue::new();
        queue.register_handler(EventType::GroundContactChanged, Box::new(Counter { seen: first.clone(), consume: true }));
        queue.register_handler(EventType::GroundContactChanged, Box::new(Counter { seen: second.clone(), consume: false }));

        queue.push(SceneEvent::GroundContactChanged { on_ground: true });
        assert_eq!(queue.dispatch(), 1);
        assert_eq!(*first.borrow(), 1);
        assert_eq!(*second.borrow(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unregistered_types_are_dropped_on_dispatch() {
        let mut queue = EventQueue::new();
        queue.push(SceneEvent::CollisionDetected { point: Vec3::zeros() });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dispatch(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_keeps_order() {
        let mut queue = EventQueue::new();
        queue.push(SceneEvent::GroundContactChanged { on_ground: true });
        queue.push(SceneEvent::GroundContactChanged { on_ground: false });
        let drained = queue.drain();
        assert_eq!(drained[0], SceneEvent::GroundContactChanged { on_ground: true });
        assert_eq!(drained[1], SceneEvent::GroundContactChanged { on_ground: false });
    }
}
