//! Canopy Engine - a dual-mode stage renderer for an explorable rainforest clearing
//!
//! The stage is viewed two ways:
//! - **Standard**: a wgpu render of the 3D scene with interactive widgets (a video player and a
//!   voice-assistant panel) composited over it through egui
//! - **Immersive**: a head-mounted session where the same widgets are mirrored into textures on
//!   their in-world surfaces
//!
//! # Layout
//! - [`world`] builds the scene graph procedurally
//! - [`render`] holds both render paths and the [`render::DualRenderer`] that owns them
//! - [`session`] is the immersive lifecycle state machine
//! - [`interaction`] resolves clicks and controller triggers into surface actions
//! - [`frame::FrameDriver`] ties everything together once per host frame

pub mod backend;
pub mod collaborators;
pub mod config;
pub mod egui_integration;
pub mod error;
pub mod frame;
pub mod interaction;
pub mod mirror;
pub mod platform;
pub mod render;
pub mod resources;
pub mod scene;
pub mod session;
pub mod surface;
pub mod window;
pub mod world;

// Web-specific modules
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
mod web_app;

pub use backend::{Backend, DummyBackend, WgpuBackend};
pub use config::StageConfig;
pub use egui_integration::EguiCompositor;
pub use error::{EngineError, EngineResult};
pub use frame::{Collaborators, FrameDriver};
pub use render::{DualRenderer, FrameReport, NullCompositor};
pub use session::{SessionController, SessionState};
pub use window::Window;

/// Backend selection for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendType {
    /// wgpu backend - cross-platform (supports web)
    #[default]
    Wgpu,
    /// Records operations without touching a GPU; used headless and in tests
    Dummy,
}

/// Renderer-facing window and surface settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Which backend to use
    pub backend: BackendType,
    /// Enable vsync
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Rainforest Classroom".to_string(),
            width: 1280,
            height: 720,
            backend: BackendType::Wgpu,
            vsync: true,
        }
    }
}

// Web initialization helper
#[cfg(target_arch = "wasm32")]
pub fn init_web_logging() {
    // Set up panic hook for better error messages in console
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the first logger
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}
