//! Light nodes
//!
//! Directional lights are scoped: they light only their siblings' subtrees,
//! so the enclosing group switches them on and off around its children and
//! the deferred queue replays them for transparent draws. Point and spot
//! lights light the whole scene and are switched on during `Lighting`.

use crate::foundation::collections::NodeId;
use crate::foundation::math::Vec3;
use crate::render::LightDesc;
use crate::traversal::{TraversalContext, TraversalPass};
use super::graph::{NodeBehavior, NodeKind, SceneGraph};

/// Scoped directional light
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Light parameters in local coordinates
    pub light: LightDesc,
    /// Switched on
    pub on: bool,
}

impl DirectionalLight {
    /// White light shining along `direction`
    pub fn new(direction: Vec3) -> Self {
        Self { light: LightDesc::directional(direction, Vec3::new(1.0, 1.0, 1.0), 1.0), on: true }
    }
}

impl NodeBehavior for DirectionalLight {
    fn kind(&self) -> NodeKind {
        NodeKind::LocalLight
    }

    fn render(&mut self, _node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        if ctx.pass != TraversalPass::Render || !self.on {
            return;
        }
        if ctx.local_light_on {
            ctx.activate_light(&self.light.transformed(&ctx.model_matrix));
        } else {
            ctx.deactivate_light();
        }
    }
}

fn activate_global(light: &LightDesc, on: bool, ctx: &mut TraversalContext<'_>) {
    if ctx.pass == TraversalPass::Lighting && on {
        ctx.activate_light(&light.transformed(&ctx.model_matrix));
    }
}

/// Global point light
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// Light parameters in local coordinates
    pub light: LightDesc,
    /// Switched on
    pub on: bool,
}

impl PointLight {
    /// White light at `position` reaching `range`
    pub fn new(position: Vec3, range: f32) -> Self {
        Self { light: LightDesc::point(position, Vec3::new(1.0, 1.0, 1.0), 1.0, range), on: true }
    }
}

impl NodeBehavior for PointLight {
    fn kind(&self) -> NodeKind {
        NodeKind::GlobalLight
    }

    fn render(&mut self, _node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        activate_global(&self.light, self.on, ctx);
    }
}

/// Global spot light
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    /// Light parameters in local coordinates
    pub light: LightDesc,
    /// Switched on
    pub on: bool,
}

impl SpotLight {
    /// White spot at `position` pointing along `direction`, reaching 100 units
    pub fn new(position: Vec3, direction: Vec3, cutoff_angle: f32) -> Self {
        let white = Vec3::new(1.0, 1.0, 1.0);
        let light = LightDesc::spot(position, direction, white, 1.0, 100.0, cutoff_angle, cutoff_angle);
        Self { light, on: true }
    }
}

impl NodeBehavior for SpotLight {
    fn kind(&self) -> NodeKind {
        NodeKind::GlobalLight
    }

    fn render(&mut self, _node: NodeId, _graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
        activate_global(&self.light, self.on, ctx);
    }
}
