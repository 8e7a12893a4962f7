//! egui integration
//!
//! egui draws the overlay path's widget quads over the 3D output on the wgpu backend.

mod wgpu;

pub use self::wgpu::EguiCompositor;
