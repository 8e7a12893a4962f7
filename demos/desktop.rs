//! Desktop stage viewer
//!
//! ```text
//! cargo run --example desktop -- --config stage.toml --seed 7
//! cargo run --example desktop -- --headless 120
//! ```
//!
//! Controls: drag to orbit, scroll to zoom, click the video screen to play or pause,
//! `M` toggles the voice assistant, `V` requests VR, `Esc` quits.

use std::path::PathBuf;
use std::time::Duration;

use canopy_engine::platform::ScriptedPlatform;
use canopy_engine::scene::CameraInput;
use canopy_engine::{
    Backend, Collaborators, DummyBackend, FrameDriver, NullCompositor, StageConfig,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Explore the rainforest stage")]
struct Args {
    /// Stage config (TOML); defaults are used when missing
    #[arg(long, default_value = "stage.toml")]
    config: PathBuf,

    /// Seed for a reproducible layout
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Render this many frames without a window and print a summary
    #[arg(long)]
    headless: Option<u32>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = StageConfig::load_or_default(&args.config);
    if args.seed.is_some() {
        config.world.seed = args.seed;
    }
    if let Some(width) = args.width {
        config.window.width = width;
    }
    if let Some(height) = args.height {
        config.window.height = height;
    }

    let result = match args.headless {
        Some(frames) => run_headless(&config, frames),
        None => canopy_engine::window::run(config),
    };
    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run_headless(config: &StageConfig, frames: u32) -> canopy_engine::EngineResult<()> {
    let backend = Backend::Dummy(DummyBackend::new(config.window.width, config.window.height));
    let mut driver = FrameDriver::mount(
        config,
        backend,
        Box::new(NullCompositor::default()),
        Box::new(ScriptedPlatform::new(false)),
        Collaborators::offline(),
    )?;

    let input = CameraInput::new();
    let mut draws = 0;
    for frame in 0..frames {
        let now = Duration::from_millis(u64::from(frame) * 16);
        if let Some(report) = driver.tick(now, &input)? {
            draws += report.draw_calls;
        }
    }
    println!(
        "{} frames, {} draw calls, {} objects, session {}",
        frames,
        draws,
        driver.renderer().standard().object_count(),
        driver.session_state()
    );
    driver.teardown();
    Ok(())
}
