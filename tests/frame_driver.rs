mod common;

use canopy_engine::platform::{post, ImmersivePlatform, PlatformEvent, ScriptedPlatform};
use canopy_engine::scene::CameraInput;
use canopy_engine::session::{RejectReason, RequestOutcome};
use canopy_engine::SessionState;

#[test]
fn mount_attaches_listeners_and_asks_for_capability_once() {
    let platform = ScriptedPlatform::new(true);
    let driver = common::mount(&platform);
    assert_eq!(platform.attached_listeners(), 3);
    assert_eq!(driver.listener_count(), 3);
    assert!(driver.is_scheduled());
    assert!(driver.audio().is_playing());
    assert_eq!(driver.renderer().overlay().element_count(), 2);
}

#[test]
fn teardown_during_an_immersive_session_ends_it_and_frees_everything() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();
    platform.start_session();
    common::tick(&mut driver, 1);
    assert_eq!(driver.session_state(), SessionState::Immersive);

    driver.teardown();
    assert!(!driver.is_scheduled());
    assert_eq!(platform.attached_listeners(), 0);
    assert_eq!(driver.listener_count(), 0);
    assert_eq!(platform.ends(), 1);
    assert!(!driver.audio().is_playing());
    assert!(driver.renderer().is_released());

    let dummy = driver.renderer().backend().as_dummy().unwrap();
    assert_eq!(dummy.live_buffers(), 0);
    assert_eq!(dummy.live_textures(), 0);
    assert_eq!(dummy.live_bind_groups(), 0);
    assert_eq!(dummy.live_pipeline_objects(), 0);

    driver.teardown();
    assert_eq!(platform.ends(), 1);
    assert!(driver
        .tick(common::at(2), &CameraInput::new())
        .unwrap()
        .is_none());
    assert_eq!(
        driver.request_immersive(),
        RequestOutcome::Rejected(RejectReason::Busy)
    );
    assert!(!driver.toggle_assistant());
}

#[test]
fn teardown_while_inactive_leaves_the_runtime_alone() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.teardown();
    assert_eq!(platform.ends(), 0);
    assert_eq!(platform.attached_listeners(), 0);
}

#[test]
fn a_session_granted_after_teardown_is_ended_at_once() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();
    assert_eq!(driver.session_state(), SessionState::Requesting);

    driver.teardown();
    assert_eq!(platform.ends(), 1);

    // the runtime answers the request only now
    platform.start_session();
    assert!(!platform.is_presenting());
    assert_eq!(platform.discarded_sessions(), 1);
    assert!(driver.queue().lock().is_empty());
}

#[test]
fn events_posted_after_teardown_are_dropped() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    let queue = driver.queue();
    driver.teardown();
    post(&queue, PlatformEvent::Resize { width: 10, height: 10 });
    assert!(driver
        .tick(common::at(1), &CameraInput::new())
        .unwrap()
        .is_none());
}

#[test]
fn dropping_the_driver_tears_it_down() {
    let platform = ScriptedPlatform::new(true);
    {
        let mut driver = common::mount(&platform);
        common::tick(&mut driver, 0);
        driver.request_immersive();
    }
    assert_eq!(platform.attached_listeners(), 0);
    assert_eq!(platform.ends(), 1);
}

#[test]
fn the_assistant_fails_softly_without_a_token_service() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.toggle_assistant();
    assert!(driver.assistant().token().is_none());
    // frames keep rendering after the failed connection
    common::tick(&mut driver, 1);
}
