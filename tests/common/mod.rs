//! Shared setup for the integration tests: a headless stage on the dummy backend

#![allow(dead_code)]

use std::time::Duration;

use canopy_engine::platform::ScriptedPlatform;
use canopy_engine::scene::CameraInput;
use canopy_engine::{
    Backend, Collaborators, DummyBackend, FrameDriver, FrameReport, NullCompositor, StageConfig,
};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// Seeded config without vines or butterflies, so nothing hangs between the camera and the stage
pub fn stage_config() -> StageConfig {
    let mut config = StageConfig::default();
    config.world.seed = Some(7);
    config.world.vines.count = 0;
    config.world.butterflies.count = 0;
    config.window.width = WIDTH;
    config.window.height = HEIGHT;
    config
}

pub fn mount(platform: &ScriptedPlatform) -> FrameDriver {
    mount_with(&stage_config(), platform)
}

pub fn mount_with(config: &StageConfig, platform: &ScriptedPlatform) -> FrameDriver {
    mount_on(
        DummyBackend::new(config.window.width, config.window.height),
        config,
        platform,
    )
}

pub fn mount_on(backend: DummyBackend, config: &StageConfig, platform: &ScriptedPlatform) -> FrameDriver {
    FrameDriver::mount(
        config,
        Backend::Dummy(backend),
        Box::new(NullCompositor::default()),
        Box::new(platform.clone()),
        Collaborators::offline(),
    )
    .expect("stage mounts on the dummy backend")
}

/// Time of the n-th frame at 60 Hz
pub fn at(frame: u64) -> Duration {
    Duration::from_millis(frame * 16)
}

pub fn tick(driver: &mut FrameDriver, frame: u64) -> FrameReport {
    driver
        .tick(at(frame), &CameraInput::new())
        .expect("frame renders")
        .expect("driver is mounted")
}
