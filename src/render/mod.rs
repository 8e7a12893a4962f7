//! Rendering: the standard 3D path, the overlay path and the coordinator that drives both

mod coordinator;
mod overlay;
mod standard;

pub use coordinator::*;
pub use overlay::*;
pub use standard::*;

use crate::backend::{Backend, BackendResult};

/// The two display paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPathKind {
    /// The 3D scene; always rendered
    Standard,
    /// Widgets composited over the 3D output; only outside immersive sessions
    Overlay,
}

/// Behaviour shared by both paths
pub trait RenderPath {
    fn kind(&self) -> RenderPathKind;

    /// Resize the path's output target
    fn resize(&mut self, backend: &mut Backend, width: u32, height: u32) -> BackendResult<()>;

    fn output_size(&self) -> (u32, u32);

    /// Free every GPU resource the path owns; calling it twice is harmless
    fn release(&mut self, backend: &mut Backend);
}

/// What one call to [`DualRenderer::render_frame`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Paths in the order they executed
    pub paths: Vec<RenderPathKind>,
    pub immersive: bool,
    /// Mirror bindings refreshed this frame
    pub mirror_refreshes: usize,
    /// Mirror textures uploaded this frame
    pub textures_uploaded: usize,
    /// Overlay elements that landed on screen
    pub overlay_elements: usize,
    /// Draw calls issued by the standard path
    pub draw_calls: usize,
}

impl FrameReport {
    pub fn rendered(&self, kind: RenderPathKind) -> bool {
        self.paths.contains(&kind)
    }
}
