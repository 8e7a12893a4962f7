//! Backend abstraction layer
//!
//! Provides common traits and types that both the wgpu and the dummy backend implement.
//! [`Backend`] dispatches to whichever one was selected at startup.

pub mod dummy;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use dummy::DummyBackend;
pub use traits::*;
pub use types::*;
pub use wgpu_backend::WgpuBackend;

use std::ops::Range;
use std::sync::Arc;

use crate::{BackendType, EngineConfig};

/// A concrete backend chosen at startup
pub enum Backend {
    Wgpu(WgpuBackend),
    Dummy(DummyBackend),
}

macro_rules! dispatch {
    ($self:ident, $b:ident => $body:expr) => {
        match $self {
            Backend::Wgpu($b) => $body,
            Backend::Dummy($b) => $body,
        }
    };
}

impl Backend {
    /// Create the backend `config` selects (blocking; native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(window: Arc<winit::window::Window>, config: &EngineConfig) -> BackendResult<Self> {
        match config.backend {
            BackendType::Wgpu => Ok(Backend::Wgpu(WgpuBackend::new(window, config.vsync)?)),
            BackendType::Dummy => Ok(Backend::Dummy(DummyBackend::new(config.width, config.height))),
        }
    }

    /// Create the backend `config` selects (async; required on web)
    pub async fn new_async(window: Arc<winit::window::Window>, config: &EngineConfig) -> BackendResult<Self> {
        match config.backend {
            BackendType::Wgpu => Ok(Backend::Wgpu(WgpuBackend::new_async(window, config.vsync).await?)),
            BackendType::Dummy => Ok(Backend::Dummy(DummyBackend::new(config.width, config.height))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Wgpu(_) => "wgpu",
            Backend::Dummy(b) => b.name(),
        }
    }

    pub fn as_wgpu(&self) -> Option<&WgpuBackend> {
        match self {
            Backend::Wgpu(b) => Some(b),
            Backend::Dummy(_) => None,
        }
    }

    pub fn as_wgpu_mut(&mut self) -> Option<&mut WgpuBackend> {
        match self {
            Backend::Wgpu(b) => Some(b),
            Backend::Dummy(_) => None,
        }
    }

    pub fn as_dummy(&self) -> Option<&DummyBackend> {
        match self {
            Backend::Dummy(b) => Some(b),
            Backend::Wgpu(_) => None,
        }
    }
}

impl GraphicsBackend for Backend {
    fn resize(&mut self, width: u32, height: u32) {
        dispatch!(self, b => b.resize(width, height))
    }

    fn surface_size(&self) -> (u32, u32) {
        dispatch!(self, b => b.surface_size())
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        dispatch!(self, b => b.begin_frame())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        dispatch!(self, b => b.end_frame())
    }

    fn swapchain_format(&self) -> TextureFormat {
        dispatch!(self, b => b.swapchain_format())
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        dispatch!(self, b => b.create_buffer(desc))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        dispatch!(self, b => b.create_buffer_init(desc, data))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        dispatch!(self, b => b.write_buffer(buffer, offset, data))
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        dispatch!(self, b => b.create_texture(desc))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        dispatch!(self, b => b.create_texture_view(texture))
    }

    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        dispatch!(self, b => b.write_texture(texture, data, width, height))
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        dispatch!(self, b => b.create_sampler(desc))
    }

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        dispatch!(self, b => b.create_bind_group_layout(entries))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        dispatch!(self, b => b.create_bind_group(layout, entries))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        dispatch!(self, b => b.create_render_pipeline(desc))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        dispatch!(self, b => b.begin_render_pass(desc))
    }

    fn end_render_pass(&mut self) {
        dispatch!(self, b => b.end_render_pass())
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        dispatch!(self, b => b.set_render_pipeline(pipeline))
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        dispatch!(self, b => b.set_bind_group(index, bind_group))
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        dispatch!(self, b => b.set_vertex_buffer(slot, buffer))
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        dispatch!(self, b => b.set_index_buffer(buffer, format))
    }

    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        dispatch!(self, b => b.set_viewport(x, y, width, height))
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        dispatch!(self, b => b.draw(vertices, instances))
    }

    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        dispatch!(self, b => b.draw_indexed(indices, instances))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        dispatch!(self, b => b.destroy_buffer(buffer))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        dispatch!(self, b => b.destroy_texture(texture))
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        dispatch!(self, b => b.destroy_bind_group(bind_group))
    }

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutHandle) {
        dispatch!(self, b => b.destroy_bind_group_layout(layout))
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        dispatch!(self, b => b.destroy_sampler(sampler))
    }

    fn destroy_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        dispatch!(self, b => b.destroy_render_pipeline(pipeline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::dummy(Backend::Dummy(DummyBackend::new(320, 240)))]
    fn resize_ignores_zero_sizes(#[case] mut backend: Backend) {
        backend.resize(0, 100);
        assert_eq!(backend.surface_size(), (320, 240));
        backend.resize(640, 480);
        assert_eq!(backend.surface_size(), (640, 480));
    }

    #[rstest]
    #[case::dummy(Backend::Dummy(DummyBackend::new(320, 240)))]
    fn frames_begin_and_end(#[case] mut backend: Backend) {
        let ctx = backend.begin_frame().unwrap();
        assert_eq!((ctx.width, ctx.height), (320, 240));
        backend.end_frame().unwrap();
        assert_eq!(backend.as_dummy().map(|d| d.frames_presented()), Some(1));
    }
}
