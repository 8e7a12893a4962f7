//! Dummy GPU backend for testing and headless runs.
//!
//! This backend doesn't perform actual GPU operations. It hands out valid
//! handles, tracks which resources are alive and counts the work it was asked
//! to do, so the renderer can be exercised without GPU hardware.

use std::collections::{HashMap, HashSet};

use crate::backend::traits::*;
use crate::backend::types::*;

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    width: u32,
    height: u32,
    next_id: u64,
    max_texture_dimension: u32,
    in_frame: bool,
    in_pass: bool,

    buffers: HashSet<u64>,
    textures: HashMap<u64, (u32, u32)>,
    views: HashMap<u64, u64>,
    bind_groups: HashSet<u64>,
    layouts: HashSet<u64>,
    samplers: HashSet<u64>,
    pipelines: HashSet<u64>,
    texture_writes: HashMap<u64, usize>,

    frames: u64,
    draw_calls: usize,
    frame_passes: Vec<String>,
}

impl DummyBackend {
    /// Create a new dummy backend with the given output size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            next_id: 1,
            max_texture_dimension: 8192,
            in_frame: false,
            in_pass: false,
            buffers: HashSet::new(),
            textures: HashMap::new(),
            views: HashMap::new(),
            bind_groups: HashSet::new(),
            layouts: HashSet::new(),
            samplers: HashSet::new(),
            pipelines: HashSet::new(),
            texture_writes: HashMap::new(),
            frames: 0,
            draw_calls: 0,
            frame_passes: Vec::new(),
        }
    }

    /// Refuse textures wider or taller than `max`, as a device limit would
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Draw calls recorded since the backend was created.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// Labels of the render passes recorded in the current (or last) frame, in order.
    pub fn frame_passes(&self) -> &[String] {
        &self.frame_passes
    }

    /// Number of uploads written into a texture.
    pub fn texture_writes(&self, texture: TextureHandle) -> usize {
        self.texture_writes.get(&texture.0).copied().unwrap_or(0)
    }

    /// Dimensions of a live texture.
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(&texture.0).copied()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_bind_groups(&self) -> usize {
        self.bind_groups.len()
    }

    /// Layouts, samplers and pipelines still alive
    pub fn live_pipeline_objects(&self) -> usize {
        self.layouts.len() + self.samplers.len() + self.pipelines.len()
    }
}

impl GraphicsBackend for DummyBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            log::trace!("DummyBackend: resize to {}x{}", width, height);
            self.width = width;
            self.height = height;
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        self.in_frame = true;
        self.frame_passes.clear();
        let view = self.allocate();
        Ok(FrameContext {
            swapchain_view: TextureViewHandle(view),
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if self.in_frame {
            self.in_frame = false;
            self.frames += 1;
        }
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        TextureFormat::Bgra8UnormSrgb
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        let id = self.allocate();
        self.buffers.insert(id);
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        _data: &[u8],
    ) -> BackendResult<BufferHandle> {
        self.create_buffer(desc)
    }

    fn write_buffer(&mut self, _buffer: BufferHandle, _offset: u64, _data: &[u8]) {}

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{})",
            desc.label,
            desc.width,
            desc.height
        );
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::InvalidTexture(
                "zero-sized texture".into(),
            ));
        }
        if desc.width > self.max_texture_dimension || desc.height > self.max_texture_dimension {
            return Err(BackendError::InvalidTexture(format!(
                "{}x{} exceeds {}",
                desc.width, desc.height, self.max_texture_dimension
            )));
        }
        let id = self.allocate();
        self.textures.insert(id, (desc.width, desc.height));
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::Released("texture view".into()));
        }
        let id = self.allocate();
        self.views.insert(id, texture.0);
        Ok(TextureViewHandle(id))
    }

    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        let Some(&(w, h)) = self.textures.get(&texture.0) else {
            log::trace!("DummyBackend: write to missing texture {:?}", texture);
            return;
        };
        debug_assert_eq!((w, h), (width, height));
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        *self.texture_writes.entry(texture.0).or_insert(0) += 1;
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        log::trace!("DummyBackend: creating sampler {:?}", desc.label);
        let id = self.allocate();
        self.samplers.insert(id);
        Ok(SamplerHandle(id))
    }

    fn create_bind_group_layout(
        &mut self,
        _entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let id = self.allocate();
        self.layouts.insert(id);
        Ok(BindGroupLayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        _layout: BindGroupLayoutHandle,
        _entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        let id = self.allocate();
        self.bind_groups.insert(id);
        Ok(BindGroupHandle(id))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        log::trace!("DummyBackend: creating pipeline {:?}", desc.label);
        let id = self.allocate();
        self.pipelines.insert(id);
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.in_pass = true;
        self.frame_passes
            .push(desc.label.clone().unwrap_or_else(|| "unnamed".into()));
    }

    fn end_render_pass(&mut self) {
        self.in_pass = false;
    }

    fn set_render_pipeline(&mut self, _pipeline: RenderPipelineHandle) {}

    fn set_bind_group(&mut self, _index: u32, _bind_group: BindGroupHandle) {}

    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: BufferHandle) {}

    fn set_index_buffer(&mut self, _buffer: BufferHandle, _format: IndexFormat) {}

    fn set_viewport(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {}

    fn draw(&mut self, _vertices: std::ops::Range<u32>, _instances: std::ops::Range<u32>) {
        if self.in_pass {
            self.draw_calls += 1;
        }
    }

    fn draw_indexed(&mut self, _indices: std::ops::Range<u32>, _instances: std::ops::Range<u32>) {
        if self.in_pass {
            self.draw_calls += 1;
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
        self.texture_writes.remove(&texture.0);
        self.views.retain(|_, owner| *owner != texture.0);
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.bind_groups.remove(&bind_group.0);
    }

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutHandle) {
        self.layouts.remove(&layout.0);
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        self.samplers.remove(&sampler.0);
    }

    fn destroy_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.pipelines.remove(&pipeline.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroying_a_texture_drops_its_views() {
        let mut backend = DummyBackend::new(64, 64);
        let tex = backend
            .create_texture(&TextureDescriptor::sampled("t", 4, 4))
            .unwrap();
        backend.create_texture_view(tex).unwrap();
        assert_eq!(backend.live_textures(), 1);

        backend.destroy_texture(tex);
        assert_eq!(backend.live_textures(), 0);
        assert!(backend.views.is_empty());
    }

    #[test]
    fn draws_outside_a_pass_are_not_counted() {
        let mut backend = DummyBackend::new(64, 64);
        backend.draw(0..3, 0..1);
        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Pass".into()),
            color_attachments: Vec::new(),
            depth_stencil_attachment: None,
        });
        backend.draw_indexed(0..3, 0..1);
        backend.end_render_pass();
        assert_eq!(backend.draw_calls(), 1);
        assert_eq!(backend.frame_passes(), ["Pass".to_string()]);
    }
}
