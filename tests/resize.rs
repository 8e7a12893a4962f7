mod common;

use approx::assert_relative_eq;
use canopy_engine::platform::{post, PlatformEvent, ScriptedPlatform};
use canopy_engine::render::RenderPath;
use canopy_engine::{DummyBackend, FrameDriver, SessionState};
use rstest::rstest;

#[rstest]
#[case(1024, 512)]
#[case(640, 960)]
#[case(1920, 1080)]
fn resize_events_reach_the_camera_and_both_paths(#[case] width: u32, #[case] height: u32) {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);

    post(&driver.queue(), PlatformEvent::Resize { width, height });
    common::tick(&mut driver, 1);

    let renderer = driver.renderer();
    assert_relative_eq!(renderer.rig().aspect(), width as f32 / height as f32);
    assert_relative_eq!(renderer.camera().aspect(), width as f32 / height as f32);
    assert_eq!(renderer.standard().output_size(), (width, height));
    assert_eq!(renderer.overlay().output_size(), (width, height));
}

#[test]
fn minimised_windows_keep_the_last_size() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    post(&driver.queue(), PlatformEvent::Resize { width: 0, height: 0 });
    common::tick(&mut driver, 0);

    let renderer = driver.renderer();
    assert_eq!(
        renderer.standard().output_size(),
        (common::WIDTH, common::HEIGHT)
    );
    assert_relative_eq!(
        renderer.rig().aspect(),
        common::WIDTH as f32 / common::HEIGHT as f32
    );
}

#[test]
fn clicks_after_a_resize_use_the_new_viewport() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    post(&driver.queue(), PlatformEvent::Resize { width: 400, height: 400 });
    common::tick(&mut driver, 0);

    let ndc = driver
        .renderer()
        .camera()
        .project(glam::Vec3::new(0.0, 2.2, -3.94))
        .unwrap();
    let (x, y) = ((ndc.x + 1.0) * 200.0, (1.0 - ndc.y) * 200.0);
    post(&driver.queue(), PlatformEvent::PointerClick { x, y });
    common::tick(&mut driver, 1);
    assert!(driver.video().borrow().is_playing());
}

/// Drive a fresh stage into `state`
fn stage_in(platform: &ScriptedPlatform, state: SessionState) -> FrameDriver {
    let mut driver = common::mount(platform);
    common::tick(&mut driver, 0);
    if state != SessionState::Inactive {
        driver.request_immersive();
    }
    if matches!(state, SessionState::Immersive | SessionState::ExitingImmersive) {
        platform.start_session();
        common::tick(&mut driver, 1);
    }
    if state == SessionState::ExitingImmersive {
        platform.end_from_device();
        common::tick(&mut driver, 2);
    }
    assert_eq!(driver.session_state(), state);
    driver
}

#[rstest]
#[case::requesting(SessionState::Requesting)]
#[case::immersive(SessionState::Immersive)]
#[case::exiting(SessionState::ExitingImmersive)]
fn resizing_mid_session_is_safe(#[case] state: SessionState) {
    let platform = ScriptedPlatform::new(true);
    let mut driver = stage_in(&platform, state);

    post(&driver.queue(), PlatformEvent::Resize { width: 1000, height: 250 });
    let first = common::tick(&mut driver, 3);
    let second = common::tick(&mut driver, 4);

    assert_eq!(driver.session_state(), state);
    let renderer = driver.renderer();
    assert_relative_eq!(renderer.rig().aspect(), 4.0);
    assert_eq!(renderer.standard().output_size(), (1000, 250));
    assert_eq!(renderer.overlay().output_size(), (1000, 250));

    let bindings = renderer.mirrors().bindings().len();
    let expected = if state == SessionState::Immersive { bindings } else { 0 };
    assert_eq!(first.mirror_refreshes, expected);
    assert_eq!(second.mirror_refreshes, expected);
}

#[test]
fn a_failed_resize_does_not_swallow_later_events() {
    let platform = ScriptedPlatform::new(true);
    let config = common::stage_config();
    let backend = DummyBackend::new(common::WIDTH, common::HEIGHT).with_max_texture_dimension(2048);
    let mut driver = common::mount_on(backend, &config, &platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();

    // the depth target cannot be this wide
    post(&driver.queue(), PlatformEvent::Resize { width: 4096, height: 600 });
    platform.start_session();
    let report = common::tick(&mut driver, 1);

    assert_eq!(driver.session_state(), SessionState::Immersive);
    assert!(report.immersive);
    assert!(!driver.renderer().overlay().is_visible());

    // a later valid size restores the depth target
    post(&driver.queue(), PlatformEvent::Resize { width: 1024, height: 768 });
    let report = common::tick(&mut driver, 2);
    assert_eq!(driver.renderer().standard().output_size(), (1024, 768));
    assert!(report.draw_calls > 0);
}
