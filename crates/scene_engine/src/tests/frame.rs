use approx::assert_relative_eq;

use super::*;
use crate::foundation::math::Vec4;

#[test]
fn test_two_boxes_bounds_and_draw() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    shape_at(&mut graph, root, Vec3::repeat(0.5), unit_cube());
    shape_at(&mut graph, root, Vec3::repeat(5.5), unit_cube());

    let mut surface = surface();
    let eye = Vec3::repeat(15.0);
    surface.camera_mut().look_at(eye, Vec3::repeat(3.0), Vec3::y());
    surface.camera_mut().last_position = eye;

    let mut backend = RecordingBackend::new();
    let stats = surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.drawn, 2);
    assert_eq!(stats.culled, 0);

    let bbox = *graph.get::<Group>(root).unwrap().cache().bbox();
    assert_relative_eq!(bbox.min, Vec3::zeros(), epsilon = 1e-5);
    assert_relative_eq!(bbox.max, Vec3::repeat(6.0), epsilon = 1e-5);
}

#[test]
fn test_box_outside_view_is_culled() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    shape_at(&mut graph, root, Vec3::zeros(), unit_cube());
    shape_at(&mut graph, root, Vec3::new(0.0, 0.0, 50.0), unit_cube());

    let mut backend = RecordingBackend::new();
    let stats = surface().draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.drawn, 1);
    assert!(stats.culled >= 1);
    assert_eq!(draw_translations(&backend), vec![Vec3::zeros()]);
}

#[test]
fn test_transparent_draws_back_to_front_after_opaque() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    shape_at(&mut graph, root, Vec3::zeros(), glass_cube());
    shape_at(&mut graph, root, Vec3::new(2.0, 0.0, 0.0), unit_cube());
    shape_at(&mut graph, root, Vec3::new(0.0, 0.0, -5.0), glass_cube());

    let mut backend = RecordingBackend::new();
    let stats = surface().draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.drawn, 3);
    assert_eq!(stats.deferred, 2);
    assert_eq!(
        draw_translations(&backend),
        vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -5.0), Vec3::zeros()]
    );
}

#[test]
fn test_bindable_notifications() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let first = graph.insert(Background::new(Vec3::new(0.1, 0.1, 0.1)));
    let second = graph.insert(Background::new(Vec3::new(0.9, 0.2, 0.2)));
    let viewpoint = graph.insert(Viewpoint::new(Vec3::new(0.0, 0.0, 5.0)));
    for node in [first, second, viewpoint] {
        graph.add_child(root, node).unwrap();
    }

    let mut surface = surface();
    let mut backend = RecordingBackend::new();
    surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(
        surface.drain_events(),
        vec![
            SceneEvent::BindableChanged { kind: BindableKind::Background, active: Some(first) },
            SceneEvent::BindableChanged { kind: BindableKind::Viewpoint, active: Some(viewpoint) },
        ]
    );
    assert_relative_eq!(surface.camera().position, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);

    // re-registration on later frames is silent
    surface.draw_frame(&mut graph, root, &mut backend);
    assert!(surface.drain_events().is_empty());

    assert!(surface.bind(BindableKind::Background, second));
    assert!(!surface.bind(BindableKind::Background, second));
    assert_eq!(
        surface.drain_events(),
        vec![SceneEvent::BindableChanged { kind: BindableKind::Background, active: Some(second) }]
    );

    backend.clear();
    surface.draw_frame(&mut graph, root, &mut backend);
    assert!(backend.calls.contains(&BackendCall::DrawBackground(Vec4::new(0.9, 0.2, 0.2, 1.0))));

    graph.remove(second).unwrap();
    surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(
        surface.drain_events(),
        vec![SceneEvent::BindableChanged { kind: BindableKind::Background, active: Some(first) }]
    );
}

#[test]
fn test_default_background_when_nothing_bound() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let mut backend = RecordingBackend::new();
    surface().draw_frame(&mut graph, root, &mut backend);
    assert_eq!(backend.count(|c| matches!(c, BackendCall::DrawBackground(_))), 1);
    assert!(backend.calls.contains(&BackendCall::SetFog(false)));
}

#[test]
fn test_dirty_recompute_is_idempotent() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let shape = shape_at(&mut graph, root, Vec3::zeros(), unit_cube());
    let transform = graph.parents(shape)[0];

    let mut surface = surface();
    let mut backend = RecordingBackend::new();
    let stats = surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.bounds_refreshes, 1);

    graph.edit::<TransformNode, _>(transform, |t| t.set_matrix(Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0))));
    let stats = surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.bounds_refreshes, 1);
    let refreshed = *graph.get::<Group>(root).unwrap().cache().bbox();

    let stats = surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.bounds_refreshes, 0);
    assert_eq!(*graph.get::<Group>(root).unwrap().cache().bbox(), refreshed);
    assert_relative_eq!(refreshed.min, Vec3::new(1.5, -0.5, -0.5), epsilon = 1e-5);
}

#[test]
fn test_light_limit_is_deterministic() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    for x in [-4.0, 0.0, 4.0] {
        let light = graph.insert(PointLight::new(Vec3::new(x, 3.0, 0.0), 20.0));
        graph.add_child(root, light).unwrap();
    }
    shape_at(&mut graph, root, Vec3::zeros(), unit_cube());

    let mut surface = VisualSurface::new(800.0, 600.0, EngineConfig::default().with_limits(2, 6));
    for _ in 0..2 {
        let mut backend = RecordingBackend::new();
        let stats = surface.draw_frame(&mut graph, root, &mut backend);
        // headlight plus the first point light
        assert_eq!(backend.count(|c| matches!(c, BackendCall::AddLight(_))), 2);
        assert_eq!(stats.lights_skipped, 2);
        assert_eq!(backend.active_lights(), 0);
    }
}

#[test]
fn test_scoped_light_only_reaches_its_group() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let lit = graph.insert(Group::new());
    let light = graph.insert(DirectionalLight::new(-Vec3::y()));
    graph.add_child(lit, light).unwrap();
    shape_at(&mut graph, lit, Vec3::zeros(), unit_cube());
    graph.add_child(root, lit).unwrap();
    shape_at(&mut graph, root, Vec3::new(2.0, 0.0, 0.0), unit_cube());

    let mut backend = RecordingBackend::new();
    surface().draw_frame(&mut graph, root, &mut backend);

    let draws: Vec<usize> = backend
        .calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, BackendCall::DrawMesh { .. }))
        .map(|(i, _)| i)
        .collect();
    let add = backend.calls.iter().rposition(|c| matches!(c, BackendCall::AddLight(_))).unwrap();
    let remove = backend.calls.iter().position(|c| matches!(c, BackendCall::RemoveLastLight)).unwrap();
    assert_eq!(draws.len(), 2);
    assert!(add < draws[0] && draws[0] < remove);
    assert!(remove < draws[1]);
}

#[test]
fn test_switch_ignores_lights_of_hidden_children() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let switch = graph.insert(Switch::new(Some(0)));
    shape_at(&mut graph, switch, Vec3::zeros(), unit_cube());
    let light = graph.insert(DirectionalLight::new(-Vec3::y()));
    graph.add_child(switch, light).unwrap();
    graph.add_child(root, switch).unwrap();

    let mut backend = RecordingBackend::new();
    let stats = surface().draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.drawn, 1);
    // headlight only
    assert_eq!(backend.count(|c| matches!(c, BackendCall::AddLight(_))), 1);
    assert!(graph.get::<Switch>(switch).unwrap().cache().local_lights().is_empty());
}

#[test]
fn test_every_pass_leaves_the_context_as_found() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let moved = graph.insert(TransformNode::new(Mat4::new_translation(&Vec3::new(0.5, 0.0, 0.0))));
    let clipper = graph.insert(
        Clipper::rect(ClipRect::centered(4.0, 4.0)).with_plane(crate::geometry::Plane::new(Vec3::x(), 1.0)),
    );
    let tinted = graph.insert(ColorTransformGroup::new(ColorTransform::alpha_scale(0.5)));
    let light = graph.insert(DirectionalLight::new(-Vec3::y()));
    graph.add_child(tinted, light).unwrap();
    shape_at(&mut graph, tinted, Vec3::zeros(), unit_cube());
    graph.add_child(clipper, tinted).unwrap();
    graph.add_child(moved, clipper).unwrap();
    graph.add_child(root, moved).unwrap();

    let settings = EngineConfig::default().traversal_settings();
    let mut backend = RecordingBackend::new();
    {
        let mut ctx = TraversalContext::new(&mut backend, settings, Camera::default_placement(800.0, 600.0));
        ctx.ray = Some(Ray::new(Vec3::new(0.5, 0.0, 10.0), -Vec3::z()));
        for pass in [
            TraversalPass::Bounds,
            TraversalPass::RenderBindable,
            TraversalPass::Lighting,
            TraversalPass::Sort,
            TraversalPass::Pick,
            TraversalPass::Collide,
        ] {
            ctx.pass = pass;
            let before = ctx.snapshot();
            let depth = ctx.light_depth();
            graph.traverse(root, &mut ctx);
            assert_eq!(ctx.snapshot(), before, "{pass:?} left state behind");
            assert_eq!(ctx.light_depth(), depth, "{pass:?} left lights behind");
            assert!(ctx.clip_planes.is_empty());
            assert!(ctx.clip_rect.is_none());
        }
        assert!(ctx.pick.hit.is_some());

        // the tinted cube was deferred and replays its light and clip state in `Render`
        let before = ctx.snapshot();
        let queue = std::mem::take(&mut ctx.deferred);
        assert_eq!(queue.len(), 1);
        queue.flush(&mut graph, &mut ctx);
        assert_eq!(ctx.snapshot(), before);
        assert_eq!(ctx.light_depth(), 0);
        assert_eq!(ctx.stats.deferred, 1);
    }

    let sets = backend.count(|c| matches!(c, BackendCall::SetClipRect(_)));
    assert!(sets > 0);
    assert_eq!(sets, backend.count(|c| *c == BackendCall::ResetClipRect));
    assert_eq!(
        backend.count(|c| matches!(c, BackendCall::SetClipPlane(_))),
        backend.count(|c| *c == BackendCall::ResetClipPlane)
    );
    assert!(backend.count(|c| matches!(c, BackendCall::AddLight(_))) > 0);
    assert_eq!(backend.active_lights(), 0);
    assert_eq!(backend.count(|c| *c == BackendCall::PushMatrix), backend.count(|c| *c == BackendCall::PopMatrix));
}

#[test]
fn test_layer_keeps_its_own_bindables() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    shape_at(&mut graph, root, Vec3::zeros(), unit_cube());
    let layer = graph.insert(Layer::new_3d());
    let background = graph.insert(Background::new(Vec3::new(0.0, 0.5, 0.0)));
    graph.add_child(layer, background).unwrap();
    shape_at(&mut graph, layer, Vec3::zeros(), unit_cube());
    graph.add_child(root, layer).unwrap();

    let mut surface = surface();
    let mut backend = RecordingBackend::new();
    let stats = surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.drawn, 2);
    assert_eq!(surface.bindables().top(BindableKind::Background), None);
    assert_eq!(graph.get::<Layer>(layer).unwrap().bindables().top(BindableKind::Background), Some(background));
}

#[test]
fn test_switch_draws_only_its_choice() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let switch = graph.insert(Switch::new(Some(1)));
    shape_at(&mut graph, switch, Vec3::new(-2.0, 0.0, 0.0), unit_cube());
    shape_at(&mut graph, switch, Vec3::new(2.0, 0.0, 0.0), unit_cube());
    graph.add_child(root, switch).unwrap();

    let mut surface = surface();
    let mut backend = RecordingBackend::new();
    surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(draw_translations(&backend), vec![Vec3::new(2.0, 0.0, 0.0)]);

    graph.edit::<Switch, _>(switch, |s| s.set_which_choice(None));
    backend.clear();
    let stats = surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(stats.drawn, 0);
}

#[test]
fn test_removing_bound_viewpoint_restores_default_placement() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(Group::new());
    let viewpoint = graph.insert(Viewpoint::new(Vec3::new(3.0, 0.0, 4.0)));
    graph.add_child(root, viewpoint).unwrap();

    let mut surface = surface();
    let mut backend = RecordingBackend::new();
    surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(surface.camera().bound_viewpoint, Some(viewpoint));

    graph.remove(viewpoint).unwrap();
    surface.draw_frame(&mut graph, root, &mut backend);
    assert_eq!(surface.camera().bound_viewpoint, None);
    assert_relative_eq!(surface.camera().position, Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-5);
}
