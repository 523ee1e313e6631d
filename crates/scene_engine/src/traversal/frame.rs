//! The per-frame pass sequence
//!
//! `RenderBindable`, bindable application, `Lighting`, `Sort`, deferred
//! flush, light teardown. Shared by the top-level surface and by layers,
//! which run the same sequence on their own camera and stacks.

use crate::render::{BackgroundDesc, LightDesc};
use crate::scene::SceneGraph;
use super::bindable::BindableKind;
use super::context::TraversalContext;
use super::pass::TraversalPass;

/// Run one frame's passes, calling `walk` once per pass to visit the scene
pub fn render_passes<F>(graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>, mut walk: F)
where
    F: FnMut(&mut SceneGraph, &mut TraversalContext<'_>),
{
    let light_depth = ctx.light_depth();
    let saved_pass = ctx.pass;
    let base = ctx.snapshot();

    ctx.pass = TraversalPass::RenderBindable;
    walk(graph, ctx);
    ctx.restore(&base);
    ctx.flush_bindable_changes();
    apply_bindables(graph, ctx);

    ctx.camera.update_frustum();
    let camera = ctx.camera.clone();
    ctx.backend().set_viewport_camera(&camera);
    if camera.headlight && camera.is_3d {
        ctx.activate_light(&LightDesc::headlight(camera.direction()));
    }

    ctx.pass = TraversalPass::Lighting;
    walk(graph, ctx);
    ctx.restore(&base);

    ctx.pass = TraversalPass::Sort;
    walk(graph, ctx);
    ctx.restore(&base);

    let queue = std::mem::take(&mut ctx.deferred);
    if !queue.is_empty() {
        log::trace!("Flushing {} deferred draws", queue.len());
    }
    queue.flush(graph, ctx);

    ctx.release_lights_to(light_depth);
    ctx.pass = saved_pass;
}

/// Apply the active node of every bindable category, or its default
fn apply_bindables(graph: &mut SceneGraph, ctx: &mut TraversalContext<'_>) {
    for kind in BindableKind::ALL {
        let applied = match ctx.bindables.top(kind) {
            Some(node) => graph.apply_bindable(node, ctx),
            None => false,
        };
        if applied {
            continue;
        }
        match kind {
            BindableKind::Viewpoint => {
                if ctx.camera.bound_viewpoint.is_some() {
                    log::debug!("No viewpoint bound anymore, using default placement");
                    ctx.camera.reset_placement();
                }
            }
            BindableKind::Background => ctx.backend().draw_background(&BackgroundDesc::default()),
            BindableKind::Fog => ctx.backend().set_fog(None),
            BindableKind::NavigationInfo => {}
        }
    }
}
