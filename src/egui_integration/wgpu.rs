//! Overlay compositing with egui on the wgpu backend
//!
//! Each projected overlay quad becomes a textured egui mesh on the background layer; egui-wgpu
//! then draws the tessellated output over the 3D frame without clearing it.

use egui::epaint::Vertex;
use egui::{Color32, ColorImage, LayerId, Mesh, Pos2, Rect, Shape, TextureHandle, TextureOptions};
use egui_wgpu::ScreenDescriptor;

use crate::backend::traits::TextureViewHandle;
use crate::backend::Backend;
use crate::render::{OverlayCompositor, OverlayFrame};

const QUAD_UVS: [Pos2; 4] = [
    Pos2::new(0.0, 0.0),
    Pos2::new(1.0, 0.0),
    Pos2::new(1.0, 1.0),
    Pos2::new(0.0, 1.0),
];

/// [`OverlayCompositor`] backed by egui-wgpu
pub struct EguiCompositor {
    /// egui context (texture manager and tessellator)
    ctx: egui::Context,
    /// Created on the first frame that runs on a wgpu backend
    renderer: Option<egui_wgpu::Renderer>,
    /// One texture per overlay element, by element index
    textures: Vec<Option<TextureHandle>>,
    /// Paint jobs prepared for the next composite
    paint_jobs: Vec<egui::ClippedPrimitive>,
    /// Texture changes not yet pushed to the GPU
    textures_delta: egui::TexturesDelta,
    size: [u32; 2],
    warned: bool,
}

impl EguiCompositor {
    pub fn new() -> Self {
        Self {
            ctx: egui::Context::default(),
            renderer: None,
            textures: Vec::new(),
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            size: [1, 1],
            warned: false,
        }
    }

    /// The egui context, for hosts that add their own UI to the overlay
    pub fn context(&self) -> &egui::Context {
        &self.ctx
    }

    fn upload(&mut self, index: usize, image: &image::RgbaImage) {
        let color = ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        );
        if self.textures.len() <= index {
            self.textures.resize_with(index + 1, || None);
        }
        match self.textures[index].as_mut() {
            Some(handle) => handle.set(color, TextureOptions::LINEAR),
            None => {
                let handle = self
                    .ctx
                    .load_texture(format!("overlay-{index}"), color, TextureOptions::LINEAR);
                self.textures[index] = Some(handle);
            }
        }
    }
}

impl Default for EguiCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayCompositor for EguiCompositor {
    fn prepare(&mut self, backend: &mut Backend, frame: &OverlayFrame) {
        let Some(wgpu) = backend.as_wgpu_mut() else {
            if !self.warned {
                log::warn!("egui overlay needs the wgpu backend; overlay disabled");
                self.warned = true;
            }
            return;
        };
        if self.renderer.is_none() {
            self.renderer = Some(egui_wgpu::Renderer::new(
                wgpu.device(),
                wgpu.wgpu_surface_format(),
                None,
                1,
            ));
        }

        for &(index, image) in &frame.updates {
            self.upload(index, image);
        }

        self.size = [frame.size.0.max(1), frame.size.1.max(1)];
        let raw_input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(
                Pos2::ZERO,
                egui::vec2(self.size[0] as f32, self.size[1] as f32),
            )),
            ..Default::default()
        };

        self.ctx.begin_frame(raw_input);
        let painter = self.ctx.layer_painter(LayerId::background());
        for &(index, quad) in &frame.quads {
            let Some(Some(texture)) = self.textures.get(index) else {
                continue;
            };
            let mut mesh = Mesh::with_texture(texture.id());
            for (corner, uv) in quad.corners.iter().zip(QUAD_UVS) {
                mesh.vertices.push(Vertex {
                    pos: Pos2::new(corner.x, corner.y),
                    uv,
                    color: Color32::WHITE,
                });
            }
            mesh.add_triangle(0, 1, 2);
            mesh.add_triangle(0, 2, 3);
            painter.add(Shape::mesh(mesh));
        }
        let full_output = self.ctx.end_frame();

        self.paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        self.textures_delta.append(full_output.textures_delta);
    }

    fn composite(&mut self, backend: &mut Backend, target: TextureViewHandle) {
        let (Some(wgpu), Some(renderer)) = (backend.as_wgpu_mut(), self.renderer.as_mut()) else {
            return;
        };
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: self.size,
            pixels_per_point: self.ctx.pixels_per_point(),
        };

        let (device, queue, encoder) = wgpu.device_queue_encoder();
        for (id, image_delta) in &self.textures_delta.set {
            renderer.update_texture(device, queue, *id, image_delta);
        }
        if let Some(encoder) = encoder {
            renderer.update_buffers(device, queue, encoder, &self.paint_jobs, &screen_descriptor);
        }

        wgpu.render_egui(renderer, &self.paint_jobs, &screen_descriptor, target);

        for id in &self.textures_delta.free {
            renderer.free_texture(id);
        }
        self.textures_delta = egui::TexturesDelta::default();
    }

    fn release(&mut self, _backend: &mut Backend) {
        self.textures.clear();
        self.paint_jobs.clear();
        self.textures_delta = egui::TexturesDelta::default();
        // dropping the renderer frees its GPU textures and buffers
        self.renderer = None;
    }
}
