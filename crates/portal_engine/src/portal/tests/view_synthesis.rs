use approx::assert_relative_eq;

use crate::core::PortalConfig;
use crate::foundation::math::Vec3;
use crate::render::{CaptureEvent, ClipPlane, LinearColor, PostProcessSettings, Projection, Viewer};
use crate::scene::SceneObject;
use super::*;

fn half_scale() -> Scenario {
    Scenario::new(PortalConfig::new().with_render_scale(0.5))
}

#[test]
fn test_unlinked_portal_is_cleared_to_mask() {
    let mut s = Scenario::linked();
    s.system.unlink(s.a).unwrap();

    s.frame();

    assert_eq!(s.capture.clear_count(s.a), 1);
    assert_eq!(s.capture.capture_count(s.a), 0);
    assert!(s
        .capture
        .events()
        .iter()
        .any(|e| *e == CaptureEvent::Cleared { portal: s.a, color: LinearColor::MASK }));
}

#[test]
fn test_linked_capture_matches_player_camera() {
    let mut s = half_scale();
    let projection = Projection::perspective(75.0, 16.0 / 9.0, 5.0, 50_000.0);
    let post_process = PostProcessSettings { exposure_bias: 1.5, ..Default::default() };
    s.system.set_viewer(Some(
        Viewer::new(s.observer, VIEWPORT)
            .with_projection(projection)
            .with_post_process(post_process.clone()),
    ));

    s.frame();

    let Some(CaptureEvent::Captured { transform, size, clip_plane, camera_cut, .. }) = s.capture.last_capture(s.a).cloned() else {
        panic!("portal A was not captured");
    };
    assert_eq!(size, (640, 360));
    assert!(!camera_cut);

    // Clip plane one unit behind B's surface, facing out of B.
    let ClipPlane { base, normal } = clip_plane.unwrap();
    assert_relative_eq!(base, Vec3::new(0.0, 999.0, 0.0), epsilon = 1e-3);
    assert_relative_eq!(normal, Vec3::y(), epsilon = 1e-5);

    // Observer camera at (-500, 0, 60) looking +X.
    assert_relative_eq!(transform.position, Vec3::new(0.0, 1500.0, 60.0), epsilon = 1e-3);
    assert_relative_eq!(transform.forward(), -Vec3::y(), epsilon = 1e-5);

    let camera = s.system.portal(s.a).unwrap().camera();
    assert_eq!(camera.projection, projection);
    assert_eq!(camera.post_process, post_process);
}

#[test]
fn test_viewport_resize_resizes_target() {
    let mut s = half_scale();
    s.frame();

    if let Some(viewer) = s.system.viewer_mut() {
        viewer.resize(800, 600);
    }
    s.frame();

    assert_eq!(s.system.portal(s.b).unwrap().camera().target.size(), (400, 300));
}

#[test]
fn test_teleport_cuts_source_and_refreshes_destination_immediately() {
    let mut s = Scenario::linked();
    s.throw_crate(Vec3::new(5.0, 0.0, 0.0), Vec3::new(-100.0, 0.0, 0.0));

    let crossings = s.frame();
    assert_eq!(crossings.len(), 1);

    let cut = |event: &CaptureEvent| matches!(event, CaptureEvent::Captured { camera_cut: true, .. });
    assert!(cut(s.capture.last_capture(s.a).unwrap()));
    assert_eq!(s.capture.capture_count(s.a), 1);
    // Once from the teleport, once from render prep.
    assert_eq!(s.capture.capture_count(s.b), 2);

    s.capture.reset();
    s.frame();
    assert!(!cut(s.capture.last_capture(s.a).unwrap()));
}

#[test]
fn test_surface_offset_follows_player_camera() {
    let mut s = Scenario::linked();
    let player = s.world.spawn(SceneObject::pawn("player", Vec3::zeros(), Vec3::new(0.0, 0.0, 60.0)));
    s.system.set_viewer(Some(Viewer::new(player, VIEWPORT)));

    s.frame();

    assert!(s.system.portal(s.a).unwrap().surface_offset_active());
    assert!(!s.system.portal(s.b).unwrap().surface_offset_active());

    s.system.unlink(s.a).unwrap();
    s.frame();
    assert!(!s.system.portal(s.a).unwrap().surface_offset_active());
}
