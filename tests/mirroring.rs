mod common;

use canopy_engine::platform::ScriptedPlatform;

#[test]
fn mirrors_refresh_once_per_immersive_frame_and_never_otherwise() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);

    for frame in 0..3 {
        let report = common::tick(&mut driver, frame);
        assert_eq!(report.mirror_refreshes, 0);
        assert_eq!(report.textures_uploaded, 0);
    }

    driver.request_immersive();
    platform.start_session();
    let mirrors = driver.renderer().mirrors().bindings().len();
    for frame in 3..8 {
        let report = common::tick(&mut driver, frame);
        assert_eq!(report.mirror_refreshes, mirrors);
        assert_eq!(report.textures_uploaded, mirrors);
    }
    assert!(driver
        .renderer()
        .mirrors()
        .bindings()
        .iter()
        .all(|b| b.refresh_count() == 5));

    platform.end_from_device();
    platform.stop_presenting();
    let report = common::tick(&mut driver, 8);
    assert_eq!(report.mirror_refreshes, 0);
    assert!(driver
        .renderer()
        .mirrors()
        .bindings()
        .iter()
        .all(|b| b.refresh_count() == 5));
}

#[test]
fn immersive_uploads_reach_the_mirror_textures() {
    let platform = ScriptedPlatform::new(true);
    let mut driver = common::mount(&platform);
    common::tick(&mut driver, 0);
    driver.request_immersive();
    platform.start_session();

    let texture = driver.renderer().mirrors().bindings()[0]
        .texture()
        .expect("mirror texture exists after mount")
        .gpu
        .handle;
    let dummy = driver.renderer().backend().as_dummy().unwrap();
    let before = dummy.texture_writes(texture);

    common::tick(&mut driver, 1);
    common::tick(&mut driver, 2);
    let dummy = driver.renderer().backend().as_dummy().unwrap();
    assert_eq!(dummy.texture_writes(texture), before + 2);
}
