//! Pointer touch sensor
//!
//! Governs the geometry of its siblings: the enclosing group collects it and
//! a pick that lands in that group's subtree reports it.

use crate::events::{EventQueue, SceneEvent};
use crate::foundation::collections::NodeId;
use crate::foundation::math::Vec3;
use crate::input::{InputEvent, PointerEventKind};
use crate::traversal::{HitInfo, SensorNode, TraversalContext};
use super::graph::{NodeBehavior, NodeKind, SceneGraph};

/// Reports pointer over, press and movement on sibling geometry
#[derive(Debug, Clone, PartialEq)]
pub struct TouchSensor {
    /// Disabled sensors are ignored by picking
    pub enabled: bool,
    is_over: bool,
    is_active: bool,
    hit_point: Option<Vec3>,
}

impl Default for TouchSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchSensor {
    /// Enabled sensor, idle
    pub fn new() -> Self {
        Self { enabled: true, is_over: false, is_active: false, hit_point: None }
    }

    /// Pointer currently over the governed geometry
    pub fn is_over(&self) -> bool {
        self.is_over
    }

    /// Button pressed over the geometry and not released yet
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Last world-space point under the pointer
    pub fn hit_point(&self) -> Option<Vec3> {
        self.hit_point
    }
}

impl SensorNode for TouchSensor {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn on_user_event(
        &mut self,
        sensor: NodeId,
        is_over: bool,
        event: &InputEvent,
        hit: Option<&HitInfo>,
        events: &mut EventQueue,
    ) {
        if is_over != self.is_over {
            self.is_over = is_over;
            events.push(if is_over { SceneEvent::SensorOver { sensor } } else { SceneEvent::SensorOut { sensor } });
        }

        match event.kind {
            PointerEventKind::Down if is_over && !self.is_active => {
                self.is_active = true;
                events.push(SceneEvent::SensorActivate { sensor, active: true });
            }
            PointerEventKind::Up if self.is_active => {
                self.is_active = false;
                events.push(SceneEvent::SensorActivate { sensor, active: false });
            }
            _ => {}
        }

        if !is_over {
            return;
        }
        if let Some(hit) = hit {
            if self.hit_point != Some(hit.world_point) {
                self.hit_point = Some(hit.world_point);
                events.push(SceneEvent::SensorMove { sensor, point: hit.world_point, normal: hit.normal });
            }
        }
    }

    fn is_grabbed(&self) -> bool {
        self.is_active
    }
}

impl NodeBehavior for TouchSensor {
    fn kind(&self) -> NodeKind {
        NodeKind::Sensor
    }

    fn render(&mut self, _node: NodeId, _graph: &mut SceneGraph, _ctx: &mut TraversalContext<'_>) {}

    fn as_sensor(&mut self) -> Option<&mut dyn SensorNode> {
        Some(self)
    }
}
