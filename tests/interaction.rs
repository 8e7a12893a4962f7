mod common;

use std::time::Duration;

use canopy_engine::interaction::ControllerTrigger;
use canopy_engine::platform::{post, PlatformEvent, ScriptedPlatform};
use canopy_engine::scene::CameraInput;
use canopy_engine::FrameDriver;
use glam::{Vec2, Vec3};

const SCREEN_CENTRE: Vec3 = Vec3::new(0.0, 2.2, -3.94);

/// Where the video screen's centre lands in viewport pixels
fn screen_centre_pixels(driver: &FrameDriver) -> Vec2 {
    let ndc = driver
        .renderer()
        .camera()
        .project(SCREEN_CENTRE)
        .expect("screen is in front of the camera");
    Vec2::new(
        (ndc.x + 1.0) / 2.0 * common::WIDTH as f32,
        (1.0 - ndc.y) / 2.0 * common::HEIGHT as f32,
    )
}

fn click(driver: &FrameDriver, at: Vec2) {
    post(&driver.queue(), PlatformEvent::PointerClick { x: at.x, y: at.y });
}

#[test]
fn clicking_the_video_screen_starts_playback() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    assert!(!driver.video().borrow().is_playing());

    let at = screen_centre_pixels(&driver);
    click(&driver, at);
    common::tick(&mut driver, 1);
    assert!(driver.video().borrow().is_playing());
    assert!(driver.renderer().overlay().pointer_through());

    click(&driver, at);
    common::tick(&mut driver, 2);
    assert!(!driver.video().borrow().is_playing());
}

#[test]
fn pointer_through_reverts_after_the_grace_window() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    click(&driver, screen_centre_pixels(&driver));
    common::tick(&mut driver, 1);
    assert!(driver.renderer().overlay().pointer_through());

    let input = CameraInput::new();
    driver.tick(Duration::from_millis(4_900), &input).unwrap();
    assert!(driver.renderer().overlay().pointer_through());

    driver.tick(Duration::from_millis(5_100), &input).unwrap();
    assert!(!driver.renderer().overlay().pointer_through());
    assert_eq!(driver.renderer().overlay().pending_reverts(), 0);
}

#[test]
fn the_earliest_revert_wins_over_a_later_click() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    let at = screen_centre_pixels(&driver);
    click(&driver, at);
    common::tick(&mut driver, 1);

    let input = CameraInput::new();
    driver.tick(Duration::from_secs(3), &input).unwrap();
    click(&driver, at);
    driver.tick(Duration::from_millis(3_016), &input).unwrap();
    assert_eq!(driver.renderer().overlay().pending_reverts(), 2);

    driver.tick(Duration::from_millis(5_100), &input).unwrap();
    assert!(!driver.renderer().overlay().pointer_through());
    assert_eq!(driver.renderer().overlay().pending_reverts(), 1);
}

#[test]
fn clicking_empty_sky_does_nothing() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);

    click(&driver, Vec2::new(2.0, 2.0));
    common::tick(&mut driver, 1);
    assert!(!driver.video().borrow().is_playing());
    assert!(!driver.renderer().overlay().pointer_through());
    assert!(!driver.assistant().is_open());
}

#[test]
fn controller_triggers_toggle_without_pointer_through() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();
    platform.start_session();
    common::tick(&mut driver, 1);

    let trigger = ControllerTrigger {
        origin: Vec3::new(0.0, 2.2, 0.0),
        direction: Vec3::NEG_Z,
    };
    post(&driver.queue(), PlatformEvent::ControllerTrigger(trigger));
    common::tick(&mut driver, 2);
    assert!(driver.video().borrow().is_playing());
    assert!(!driver.renderer().overlay().pointer_through());
}
