mod common;

use canopy_engine::platform::ScriptedPlatform;
use canopy_engine::render::RenderPathKind;
use canopy_engine::session::{Capability, RejectReason, RequestOutcome, UNSUPPORTED_NOTICE};
use canopy_engine::SessionState;

#[test]
fn unsupported_runtime_keeps_the_desktop_stage() {
    let platform = ScriptedPlatform::new(false);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    assert_eq!(driver.session().capability(), Capability::Unsupported);

    let outcome = driver.request_immersive();
    assert_eq!(outcome, RequestOutcome::Rejected(RejectReason::Unsupported));
    assert_eq!(platform.requests(), 0);

    let report = common::tick(&mut driver, 1);
    assert_eq!(driver.session_state(), SessionState::Inactive);
    assert!(driver.renderer().overlay().is_visible());
    assert!(report.rendered(RenderPathKind::Overlay));

    assert!(!driver.session().capability().offers_immersive());
    assert_eq!(driver.take_notices(), vec![UNSUPPORTED_NOTICE.to_string()]);
}

#[test]
fn requests_wait_for_the_capability_answer() {
    let platform = ScriptedPlatform::silent();
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    assert_eq!(
        driver.request_immersive(),
        RequestOutcome::Rejected(RejectReason::CapabilityPending)
    );
    assert_eq!(platform.requests(), 0);
}

#[test]
fn starting_a_session_hides_the_overlay_before_the_next_frame() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);

    assert_eq!(driver.request_immersive(), RequestOutcome::Requested);
    assert_eq!(driver.session_state(), SessionState::Requesting);
    assert_eq!(platform.requests(), 1);
    assert_eq!(
        driver.request_immersive(),
        RequestOutcome::Rejected(RejectReason::Busy)
    );

    platform.start_session();
    let report = common::tick(&mut driver, 1);
    assert_eq!(driver.session_state(), SessionState::Immersive);
    assert!(!driver.renderer().overlay().is_visible());
    assert!(driver.renderer().mirrors().is_active());
    assert!(report.immersive);
    assert_eq!(report.paths, vec![RenderPathKind::Standard]);
}

#[test]
fn leaving_from_the_headset_restores_the_overlay() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();
    platform.start_session();
    common::tick(&mut driver, 1);

    platform.end_from_device();
    let report = common::tick(&mut driver, 2);
    // still presenting, so the exit is not complete yet
    assert_eq!(driver.session_state(), SessionState::ExitingImmersive);
    assert!(driver.renderer().overlay().is_visible());
    assert!(!driver.renderer().mirrors().is_active());
    assert!(report.rendered(RenderPathKind::Overlay));

    platform.stop_presenting();
    common::tick(&mut driver, 3);
    assert_eq!(driver.session_state(), SessionState::Inactive);
    assert_eq!(driver.request_immersive(), RequestOutcome::Requested);
}

#[test]
fn a_refused_request_returns_to_inactive_with_a_notice() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    platform.refuse_requests("user denied");

    assert_eq!(driver.request_immersive(), RequestOutcome::Requested);
    assert_eq!(driver.session_state(), SessionState::Inactive);
    let notices = driver.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("user denied"));
    assert!(driver.take_notices().is_empty());
}

#[test]
fn losing_the_session_falls_back_to_the_desktop_stage() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();
    platform.start_session();
    common::tick(&mut driver, 1);

    platform.fail("tracking lost");
    let report = common::tick(&mut driver, 2);
    assert_eq!(driver.session_state(), SessionState::Inactive);
    assert!(driver.renderer().overlay().is_visible());
    assert!(!driver.renderer().mirrors().is_active());
    assert!(!report.immersive);
    assert!(driver
        .take_notices()
        .iter()
        .any(|n| n.contains("tracking lost")));
}

#[test]
fn a_failed_capability_check_reads_as_unsupported() {
    let platform = ScriptedPlatform::answering(Err("SecurityError".into()));
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    assert_eq!(driver.session().capability(), Capability::Unsupported);
    assert_eq!(
        driver.request_immersive(),
        RequestOutcome::Rejected(RejectReason::Unsupported)
    );
}
