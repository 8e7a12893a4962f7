//! wgpu backend: WebGL2 or WebGPU in the browser, the platform's native API on desktop

mod convert;

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Draw state recorded between `begin_render_pass` and `end_render_pass`
#[derive(Clone)]
enum RenderCommand {
    SetPipeline(RenderPipelineHandle),
    SetBindGroup(u32, BindGroupHandle),
    SetVertexBuffer(u32, BufferHandle),
    SetIndexBuffer(BufferHandle, IndexFormat),
    SetViewport([f32; 4]),
    Draw(Range<u32>, Range<u32>),
    DrawIndexed(Range<u32>, Range<u32>),
}

struct RecordedPass {
    descriptor: RenderPassDescriptor,
    commands: Vec<RenderCommand>,
}

/// Objects behind the handles, keyed by one shared id sequence
#[derive(Default)]
struct Objects {
    next_id: u64,
    buffers: HashMap<u64, wgpu::Buffer>,
    textures: HashMap<u64, wgpu::Texture>,
    /// View id to (owning texture id, view)
    views: HashMap<u64, (u64, wgpu::TextureView)>,
    samplers: HashMap<u64, wgpu::Sampler>,
    layouts: HashMap<u64, wgpu::BindGroupLayout>,
    bind_groups: HashMap<u64, wgpu::BindGroup>,
    pipelines: HashMap<u64, wgpu::RenderPipeline>,
}

impl Objects {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

type Opened = (wgpu::Surface<'static>, wgpu::Adapter, wgpu::Device, wgpu::Queue);

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    frame: Option<wgpu::SurfaceTexture>,
    /// Handle id standing for this frame's surface image
    frame_view_id: u64,
    objects: Objects,
    encoder: Option<wgpu::CommandEncoder>,
    pass: Option<RecordedPass>,
}

/// Largest size within `max_size` on both axes with the requested aspect; never zero
fn clamp_surface_size(max_size: u32, width: u32, height: u32) -> (u32, u32) {
    if width <= max_size && height <= max_size {
        return (width.max(1), height.max(1));
    }
    let scale = (max_size as f32 / width as f32).min(max_size as f32 / height as f32);
    (
        ((width as f32 * scale) as u32).max(1),
        ((height as f32 * scale) as u32).max(1),
    )
}

impl WgpuBackend {
    /// Blocking initialization for native targets
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    pub async fn new_async(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        #[cfg(target_arch = "wasm32")]
        let (surface, adapter, device, queue) = Self::open_web(window.clone()).await?;
        #[cfg(not(target_arch = "wasm32"))]
        let (surface, adapter, device, queue) = Self::open_native(window.clone()).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| BackendError::Unavailable("Surface reports no formats".into()))?;

        let size = window.inner_size();
        let (width, height) =
            clamp_surface_size(device.limits().max_texture_dimension_2d, size.width, size.height);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!("Surface configured: {}x{} {:?}", width, height, format);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            frame: None,
            frame_view_id: 0,
            objects: Objects::default(),
            encoder: None,
            pass: None,
        })
    }

    /// WebGL2 reaches the most browsers; WebGPU is the fallback
    #[cfg(target_arch = "wasm32")]
    async fn open_web(window: Arc<winit::window::Window>) -> BackendResult<Opened> {
        let attempts = [
            (wgpu::Backends::GL, wgpu::Limits::downlevel_webgl2_defaults()),
            (wgpu::Backends::BROWSER_WEBGPU, wgpu::Limits::default()),
        ];
        for (backends, limits) in attempts {
            match Self::open(window.clone(), backends, limits).await {
                Ok(parts) => return Ok(parts),
                Err(e) => log::warn!("{:?} unavailable: {}", backends, e),
            }
        }
        Err(BackendError::Unavailable(
            "Neither WebGL2 nor WebGPU could be initialized".into(),
        ))
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn open_native(window: Arc<winit::window::Window>) -> BackendResult<Opened> {
        // WGPU_BACKEND overrides the Windows preference for Vulkan
        let mut attempts = Vec::new();
        if cfg!(target_os = "windows") && std::env::var("WGPU_BACKEND").is_err() {
            attempts.push(wgpu::Backends::VULKAN);
        }
        attempts.push(wgpu::Backends::all());

        let mut last_error = None;
        for backends in attempts {
            match Self::open(window.clone(), backends, wgpu::Limits::default()).await {
                Ok(parts) => return Ok(parts),
                Err(e) => {
                    log::warn!("{:?} unavailable: {}", backends, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| BackendError::Unavailable("No suitable adapter found".into())))
    }

    async fn open(
        window: Arc<winit::window::Window>,
        backends: wgpu::Backends,
        limits: wgpu::Limits,
    ) -> BackendResult<Opened> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BackendError::Unavailable(format!("No {:?} adapter", backends)))?;

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Stage Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                },
                None,
            )
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok((surface, adapter, device, queue))
    }

    fn frame_view(&self) -> Option<wgpu::TextureView> {
        self.frame
            .as_ref()
            .map(|frame| frame.texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    fn resolve_view<'a>(
        &'a self,
        handle: TextureViewHandle,
        frame_view: Option<&'a wgpu::TextureView>,
    ) -> Option<&'a wgpu::TextureView> {
        if handle.0 == self.frame_view_id {
            frame_view
        } else {
            self.objects.views.get(&handle.0).map(|(_, view)| view)
        }
    }

    fn record(&mut self, command: RenderCommand) {
        match self.pass.as_mut() {
            Some(pass) => pass.commands.push(command),
            None => log::trace!("Draw state outside a render pass ignored"),
        }
    }

    fn replay<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, commands: &[RenderCommand]) {
        let objects = &self.objects;
        for command in commands {
            match command {
                RenderCommand::SetPipeline(h) => {
                    if let Some(pipeline) = objects.pipelines.get(&h.0) {
                        pass.set_pipeline(pipeline);
                    }
                }
                RenderCommand::SetBindGroup(index, h) => {
                    if let Some(group) = objects.bind_groups.get(&h.0) {
                        pass.set_bind_group(*index, group, &[]);
                    }
                }
                RenderCommand::SetVertexBuffer(slot, h) => {
                    if let Some(buffer) = objects.buffers.get(&h.0) {
                        pass.set_vertex_buffer(*slot, buffer.slice(..));
                    }
                }
                RenderCommand::SetIndexBuffer(h, format) => {
                    if let Some(buffer) = objects.buffers.get(&h.0) {
                        pass.set_index_buffer(buffer.slice(..), convert::index_format(*format));
                    }
                }
                RenderCommand::SetViewport([x, y, w, h]) => pass.set_viewport(*x, *y, *w, *h, 0.0, 1.0),
                RenderCommand::Draw(vertices, instances) => pass.draw(vertices.clone(), instances.clone()),
                RenderCommand::DrawIndexed(indices, instances) => {
                    pass.draw_indexed(indices.clone(), 0, instances.clone())
                }
            }
        }
    }
}

/// Lost and outdated surfaces are worth one reconfigure before giving up on the frame
fn is_recoverable(err: &wgpu::SurfaceError) -> bool {
    matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)
}

fn surface_error(err: wgpu::SurfaceError) -> BackendError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => BackendError::SurfaceLost,
        wgpu::SurfaceError::OutOfMemory => BackendError::OutOfMemory,
        other => BackendError::Acquire(other.to_string()),
    }
}

impl WgpuBackend {
    fn acquire(&mut self) -> BackendResult<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(err) if is_recoverable(&err) => {
                log::debug!("Surface {:?}, reconfiguring", err);
                self.surface.configure(&self.device, &self.surface_config);
                self.surface.get_current_texture().map_err(surface_error)
            }
            Err(err) => Err(surface_error(err)),
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let (w, h) = clamp_surface_size(self.device.limits().max_texture_dimension_2d, width, height);
        self.surface_config.width = w;
        self.surface_config.height = h;
        self.surface.configure(&self.device, &self.surface_config);
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        let frame = self.acquire()?;
        self.frame = Some(frame);
        self.frame_view_id = self.objects.allocate();
        self.encoder = Some(self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        }));

        Ok(FrameContext {
            swapchain_view: TextureViewHandle(self.frame_view_id),
            width: self.surface_config.width,
            height: self.surface_config.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        if let Some(frame) = self.frame.take() {
            frame.present();
        }
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        convert::surface_format(self.surface_config.format)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: desc.label.as_deref(),
            size: desc.size,
            usage: convert::buffer_usage(desc.usage),
            mapped_at_creation: false,
        });
        let id = self.objects.allocate();
        self.objects.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(&mut self, desc: &BufferDescriptor, data: &[u8]) -> BackendResult<BufferHandle> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: desc.label.as_deref(),
            contents: data,
            usage: convert::buffer_usage(desc.usage),
        });
        let id = self.objects.allocate();
        self.objects.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        if let Some(target) = self.objects.buffers.get(&buffer.0) {
            self.queue.write_buffer(target, offset, data);
        }
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(BackendError::InvalidTexture(format!(
                "{:?}: {}x{} outside 1..={}",
                desc.label, desc.width, desc.height, max
            )));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label.as_deref(),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::texture_format(desc.format),
            usage: convert::texture_usage(desc.usage),
            view_formats: &[],
        });
        let id = self.objects.allocate();
        self.objects.textures.insert(id, texture);
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        let view = self
            .objects
            .textures
            .get(&texture.0)
            .ok_or_else(|| BackendError::Released("texture view".into()))?
            .create_view(&wgpu::TextureViewDescriptor::default());
        let id = self.objects.allocate();
        self.objects.views.insert(id, (texture.0, view));
        Ok(TextureViewHandle(id))
    }

    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        let Some(target) = self.objects.textures.get(&texture.0) else {
            return;
        };
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            target.as_image_copy(),
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            extent,
        );
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        let address_mode = convert::address(desc.address_mode);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label.as_deref(),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: convert::filter(desc.mag_filter),
            min_filter: convert::filter(desc.min_filter),
            ..Default::default()
        });
        let id = self.objects.allocate();
        self.objects.samplers.insert(id, sampler);
        Ok(SamplerHandle(id))
    }

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = entries
            .iter()
            .map(|e| wgpu::BindGroupLayoutEntry {
                binding: e.binding,
                visibility: convert::shader_stages(e.visibility),
                ty: convert::binding_type(e.ty),
                count: None,
            })
            .collect();
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &entries,
            });
        let id = self.objects.allocate();
        self.objects.layouts.insert(id, layout);
        Ok(BindGroupLayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        let objects = &self.objects;
        let layout = objects
            .layouts
            .get(&layout.0)
            .ok_or_else(|| BackendError::Released("layout".into()))?;

        let entries = entries
            .iter()
            .map(|(binding, entry)| {
                let resource = match entry {
                    BindGroupEntry::Buffer(h) => objects.buffers.get(&h.0).map(|b| b.as_entire_binding()),
                    BindGroupEntry::Texture(h) => objects
                        .views
                        .get(&h.0)
                        .map(|(_, view)| wgpu::BindingResource::TextureView(view)),
                    BindGroupEntry::Sampler(h) => {
                        objects.samplers.get(&h.0).map(wgpu::BindingResource::Sampler)
                    }
                };
                resource
                    .map(|resource| wgpu::BindGroupEntry {
                        binding: *binding,
                        resource,
                    })
                    .ok_or_else(|| {
                        BackendError::Released(format!("binding {}", binding))
                    })
            })
            .collect::<BackendResult<Vec<_>>>()?;

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout,
            entries: &entries,
        });
        let id = self.objects.allocate();
        self.objects.bind_groups.insert(id, group);
        Ok(BindGroupHandle(id))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        let layouts = desc
            .bind_group_layouts
            .iter()
            .map(|h| self.objects.layouts.get(&h.0))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BackendError::Released("layout".into()))?;

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: desc.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(desc.shader.as_str().into()),
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> =
            desc.vertex_layouts.iter().map(convert::vertex_attributes).collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = desc
            .vertex_layouts
            .iter()
            .zip(&attributes)
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();
        let targets = [Some(convert::color_target(&desc.color_target))];

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: desc.label.as_deref(),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: convert::primitive(desc.primitive_topology, desc.cull_mode),
            depth_stencil: desc.depth_stencil.as_ref().map(convert::depth_stencil),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        let id = self.objects.allocate();
        self.objects.pipelines.insert(id, pipeline);
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.pass = Some(RecordedPass {
            descriptor: desc.clone(),
            commands: Vec::new(),
        });
    }

    /// The pass is encoded here, once every handle it uses is known
    fn end_render_pass(&mut self) {
        let Some(recorded) = self.pass.take() else {
            return;
        };
        let Some(mut encoder) = self.encoder.take() else {
            return;
        };
        let frame_view = self.frame_view();

        {
            let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = recorded
                .descriptor
                .color_attachments
                .iter()
                .filter_map(|attachment| {
                    let view = self.resolve_view(attachment.view, frame_view.as_ref())?;
                    Some(Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: convert::load_op(&attachment.load_op),
                            store: wgpu::StoreOp::Store,
                        },
                    }))
                })
                .collect();
            let depth_stencil_attachment =
                recorded
                    .descriptor
                    .depth_stencil_attachment
                    .as_ref()
                    .and_then(|attachment| {
                        Some(wgpu::RenderPassDepthStencilAttachment {
                            view: self.resolve_view(attachment.view, frame_view.as_ref())?,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(attachment.depth_clear_value),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        })
                    });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: recorded.descriptor.label.as_deref(),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.replay(&mut pass, &recorded.commands);
        }

        self.encoder = Some(encoder);
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(RenderCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(RenderCommand::SetBindGroup(index, bind_group));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.record(RenderCommand::SetVertexBuffer(slot, buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        self.record(RenderCommand::SetIndexBuffer(buffer, format));
    }

    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.record(RenderCommand::SetViewport([x, y, width, height]));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.record(RenderCommand::Draw(vertices, instances));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        self.record(RenderCommand::DrawIndexed(indices, instances));
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.objects.buffers.remove(&buffer.0) {
            buffer.destroy();
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.objects.views.retain(|_, (owner, _)| *owner != texture.0);
        if let Some(texture) = self.objects.textures.remove(&texture.0) {
            texture.destroy();
        }
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.objects.bind_groups.remove(&bind_group.0);
    }

    fn destroy_bind_group_layout(&mut self, layout: BindGroupLayoutHandle) {
        self.objects.layouts.remove(&layout.0);
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        self.objects.samplers.remove(&sampler.0);
    }

    fn destroy_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.objects.pipelines.remove(&pipeline.0);
    }
}

/// Access for the egui overlay compositor
impl WgpuBackend {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn wgpu_surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Device, queue and the frame's encoder at once, for egui-wgpu's buffer updates
    pub fn device_queue_encoder(
        &mut self,
    ) -> (&wgpu::Device, &wgpu::Queue, Option<&mut wgpu::CommandEncoder>) {
        (&self.device, &self.queue, self.encoder.as_mut())
    }

    /// Draw egui paint jobs over `target`, keeping what the scene already drew there
    pub fn render_egui(
        &mut self,
        renderer: &egui_wgpu::Renderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen: &egui_wgpu::ScreenDescriptor,
        target: TextureViewHandle,
    ) {
        let Some(mut encoder) = self.encoder.take() else {
            return;
        };
        let frame_view = self.frame_view();
        if let Some(view) = self.resolve_view(target, frame_view.as_ref()) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Composite"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            renderer.render(&mut pass, paint_jobs, screen);
        }
        self.encoder = Some(encoder);
    }
}
