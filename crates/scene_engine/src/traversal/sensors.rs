//! Pointer sensor bookkeeping
//!
//! Sensors declare themselves to their enclosing group; a pick walk records
//! the sensors in scope at the best hit. The [`SensorManager`] then diffs that
//! list against the previous one so each sensor learns whether the pointer
//! is over it, and a sensor holding the pointer keeps receiving events after
//! the pointer has left its geometry.

use crate::events::EventQueue;
use crate::foundation::collections::NodeId;
use crate::input::InputEvent;
use crate::scene::SceneGraph;
use super::pick::HitInfo;

/// Node side of the sensor protocol
pub trait SensorNode {
    /// Disabled sensors are not collected by their group
    fn is_enabled(&self) -> bool;

    /// Deliver a pointer event
    ///
    /// `is_over` tells whether the pointer is over geometry governed by the
    /// sensor. `hit` is the current pick result, if any.
    fn on_user_event(
        &mut self,
        sensor: NodeId,
        is_over: bool,
        event: &InputEvent,
        hit: Option<&HitInfo>,
        events: &mut EventQueue,
    );

    /// Whether the sensor holds the pointer
    fn is_grabbed(&self) -> bool;
}

/// Sensors under the pointer across pick events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorManager {
    previous: Vec<NodeId>,
    grabbed: Option<NodeId>,
}

impl SensorManager {
    /// No sensor active
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensors notified by the last event, including grabbed leftovers
    pub fn active(&self) -> &[NodeId] {
        &self.previous
    }

    /// Sensor holding the pointer
    pub fn grabbed(&self) -> Option<NodeId> {
        self.grabbed
    }

    /// Drop a destroyed node
    pub fn forget(&mut self, node: NodeId) {
        self.previous.retain(|&s| s != node);
        if self.grabbed == Some(node) {
            self.grabbed = None;
        }
    }

    /// Deliver `event` to the sensors in `current` and to those that left
    ///
    /// Returns true when at least one sensor was notified.
    pub fn process(
        &mut self,
        graph: &mut SceneGraph,
        current: Vec<NodeId>,
        event: &InputEvent,
        hit: Option<&HitInfo>,
        events: &mut EventQueue,
    ) -> bool {
        let mut notified = false;
        for &sensor in &current {
            self.previous.retain(|&s| s != sensor);
            notified |= graph
                .with_sensor(sensor, |s| s.on_user_event(sensor, true, event, hit, events))
                .is_some();
        }

        let mut next = current;
        for sensor in std::mem::take(&mut self.previous) {
            let still_grabbed = graph.with_sensor(sensor, |s| {
                s.on_user_event(sensor, false, event, hit, events);
                s.is_grabbed()
            });
            notified |= still_grabbed.is_some();
            if still_grabbed == Some(true) {
                next.push(sensor);
            }
        }

        self.grabbed = next
            .iter()
            .copied()
            .find(|&sensor| graph.with_sensor(sensor, |s| s.is_grabbed()) == Some(true));
        self.previous = next;
        notified
    }
}
