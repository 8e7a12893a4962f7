//! Mirroring of widgets into GPU textures for immersive display
//!
//! Every binding pairs a shared widget with a CPU buffer of the widget's size and, once the GPU
//! side exists, a sampled texture of the same size. Refreshing copies the widget's pixels (or its
//! placeholder) into the buffer and marks the texture dirty; uploading pushes dirty buffers.

pub mod canvas;
pub mod widget;

pub use canvas::{Canvas, TextRasterizer};
pub use widget::{
    AssistantPanelWidget, FrameSource, SharedWidget, TestPatternSource, VideoWidget, Widget,
};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;

use crate::backend::traits::{BackendResult, GraphicsBackend, TextureViewHandle};
use crate::resources::GpuTexture;

/// Mirroring errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("font unavailable: {0}")]
    FontUnavailable(String),
}

/// Whether a binding is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Active,
    Dormant,
}

/// GPU side of a binding
#[derive(Debug)]
pub struct MirrorTexture {
    pub gpu: GpuTexture,
    pub dirty: bool,
}

/// One widget mirrored into one texture
pub struct MirrorBinding {
    widget: SharedWidget,
    buffer: Option<RgbaImage>,
    texture: Option<MirrorTexture>,
    activity: Activity,
    refreshes: u64,
    warned: bool,
}

impl MirrorBinding {
    pub fn widget_name(&self) -> String {
        self.widget
            .try_borrow()
            .map(|w| w.name().to_string())
            .unwrap_or_else(|_| "<borrowed>".to_string())
    }

    pub fn buffer(&self) -> Option<&RgbaImage> {
        self.buffer.as_ref()
    }

    pub fn texture(&self) -> Option<&MirrorTexture> {
        self.texture.as_ref()
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Per-frame refreshes performed so far (priming excluded)
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    fn skip(&mut self, reason: &str) {
        if self.warned {
            log::debug!("Mirror {}: skipped, {reason}", self.widget_name());
        } else {
            log::warn!("Mirror {}: skipped, {reason}", self.widget_name());
            self.warned = true;
        }
    }

    /// Copy the widget's current look into the buffer; false if the binding was skipped
    fn paint(&mut self, text: Option<&TextRasterizer>) -> bool {
        let Ok(widget) = self.widget.try_borrow() else {
            log::debug!("Mirror widget is busy, skipping this frame");
            return false;
        };
        let live = widget.live_frame();
        if live.is_none() && widget.placeholder_needs_text() && text.is_none() {
            drop(widget);
            self.skip("no text rasterizer for the placeholder");
            return false;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            drop(widget);
            self.skip("buffer released");
            return false;
        };

        match live {
            Some(frame) if frame.dimensions() == buffer.dimensions() => {
                buffer.copy_from_slice(frame.as_raw());
            }
            Some(frame) => {
                *buffer = imageops::resize(frame, buffer.width(), buffer.height(), FilterType::Triangle);
            }
            None => widget.paint_placeholder(&mut Canvas::new(buffer), text),
        }
        drop(widget);

        if let Some(texture) = self.texture.as_mut() {
            texture.dirty = true;
        }
        true
    }
}

/// Owns every mirror binding
pub struct MirrorSystem {
    bindings: Vec<MirrorBinding>,
    text: Option<&'static TextRasterizer>,
}

impl MirrorSystem {
    /// Uses the shared bundled font for placeholders
    pub fn new() -> Self {
        Self::with_text(TextRasterizer::shared())
    }

    pub fn with_text(text: Option<&'static TextRasterizer>) -> Self {
        Self {
            bindings: Vec::new(),
            text,
        }
    }

    /// Add a dormant binding sized to the widget; returns its index
    pub fn bind(&mut self, widget: SharedWidget) -> usize {
        let (width, height) = widget.borrow().size();
        self.bindings.push(MirrorBinding {
            widget,
            buffer: Some(RgbaImage::new(width.max(1), height.max(1))),
            texture: None,
            activity: Activity::Dormant,
            refreshes: 0,
            warned: false,
        });
        self.bindings.len() - 1
    }

    pub fn bindings(&self) -> &[MirrorBinding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&MirrorBinding> {
        self.bindings.get(index)
    }

    /// Paint initial content into every buffer so textures never show garbage
    pub fn prime(&mut self) {
        for binding in &mut self.bindings {
            binding.paint(self.text);
        }
    }

    pub fn set_active(&mut self, active: bool) {
        let activity = if active {
            Activity::Active
        } else {
            Activity::Dormant
        };
        for binding in &mut self.bindings {
            binding.activity = activity;
        }
        log::debug!("Mirrors {activity:?}");
    }

    pub fn is_active(&self) -> bool {
        self.bindings
            .iter()
            .any(|b| b.activity == Activity::Active)
    }

    /// Refresh every active binding once; returns how many were refreshed
    pub fn refresh(&mut self) -> usize {
        let mut refreshed = 0;
        for binding in &mut self.bindings {
            if binding.activity != Activity::Active {
                continue;
            }
            if binding.paint(self.text) {
                binding.refreshes += 1;
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Allocate a texture per binding from its buffer's dimensions and upload the buffer
    pub fn create_textures<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) -> BackendResult<()> {
        for binding in &mut self.bindings {
            let Some(buffer) = binding.buffer.as_ref() else {
                continue;
            };
            if binding.texture.is_some() {
                continue;
            }
            let (width, height) = buffer.dimensions();
            let gpu = GpuTexture::allocate(backend, &format!("Mirror {}", binding.widget_name()), width, height)?;
            gpu.upload(backend, buffer.as_raw());
            binding.texture = Some(MirrorTexture { gpu, dirty: false });
        }
        Ok(())
    }

    /// Push dirty buffers to their textures; returns how many were uploaded
    pub fn upload<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let mut uploaded = 0;
        for binding in &mut self.bindings {
            if let (Some(buffer), Some(texture)) = (binding.buffer.as_ref(), binding.texture.as_mut()) {
                if texture.dirty {
                    texture.gpu.upload(backend, buffer.as_raw());
                    texture.dirty = false;
                    uploaded += 1;
                }
            }
        }
        uploaded
    }

    pub fn texture_view(&self, index: usize) -> Option<TextureViewHandle> {
        self.bindings
            .get(index)
            .and_then(|b| b.texture.as_ref())
            .map(|t| t.gpu.view)
    }

    /// Destroy every texture and drop every buffer; later refreshes skip
    pub fn release<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        for binding in &mut self.bindings {
            if let Some(texture) = binding.texture.take() {
                texture.gpu.destroy(backend);
            }
            binding.buffer = None;
            binding.activity = Activity::Dormant;
        }
    }
}

impl Default for MirrorSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn video() -> Rc<RefCell<VideoWidget>> {
        Rc::new(RefCell::new(
            VideoWidget::new("clip").with_source(Box::new(TestPatternSource::new(64, 36))),
        ))
    }

    #[test]
    fn dormant_bindings_are_not_refreshed() {
        let mut mirrors = MirrorSystem::new();
        mirrors.bind(video());
        assert_eq!(mirrors.refresh(), 0);

        mirrors.set_active(true);
        assert_eq!(mirrors.refresh(), 1);
        assert_eq!(mirrors.refresh(), 1);
        assert_eq!(mirrors.binding(0).map(|b| b.refresh_count()), Some(2));
    }

    #[test]
    fn buffer_and_texture_sizes_match() {
        let mut backend = DummyBackend::new(800, 600);
        let mut mirrors = MirrorSystem::new();
        let index = mirrors.bind(Rc::new(RefCell::new(AssistantPanelWidget::new())));
        mirrors.create_textures(&mut backend).unwrap();

        let binding = mirrors.binding(index).unwrap();
        let texture = binding.texture().unwrap();
        assert_eq!(binding.buffer().unwrap().dimensions(), (600, 800));
        assert_eq!(backend.texture_size(texture.gpu.handle), Some((600, 800)));
    }

    #[test]
    fn live_frames_are_resampled_to_the_buffer() {
        let widget = video();
        let mut mirrors = MirrorSystem::new();
        mirrors.bind(widget.clone());
        mirrors.set_active(true);

        widget.borrow_mut().toggle_playback();
        widget.borrow_mut().advance(Duration::from_millis(16));
        assert_eq!(mirrors.refresh(), 1);
        let buffer = mirrors.binding(0).unwrap().buffer().unwrap();
        assert_eq!(buffer.dimensions(), (VideoWidget::WIDTH, VideoWidget::HEIGHT));
        // first colour bar is light grey
        assert_eq!(buffer.get_pixel(0, 0)[0], 0xc0);
    }

    #[test]
    fn busy_widget_is_skipped_for_the_frame() {
        let widget = video();
        let mut mirrors = MirrorSystem::new();
        mirrors.bind(widget.clone());
        mirrors.set_active(true);

        let guard = widget.borrow_mut();
        assert_eq!(mirrors.refresh(), 0);
        drop(guard);
        assert_eq!(mirrors.refresh(), 1);
    }

    #[test]
    fn missing_text_skips_placeholders() {
        let mut mirrors = MirrorSystem::with_text(None);
        mirrors.bind(video());
        mirrors.set_active(true);
        assert_eq!(mirrors.refresh(), 0);
        assert_eq!(mirrors.refresh(), 0);
    }

    #[test]
    fn dirty_textures_upload_once_and_release_frees_everything() {
        let mut backend = DummyBackend::new(800, 600);
        let mut mirrors = MirrorSystem::new();
        mirrors.bind(video());
        mirrors.create_textures(&mut backend).unwrap();
        mirrors.set_active(true);

        mirrors.refresh();
        assert_eq!(mirrors.upload(&mut backend), 1);
        assert_eq!(mirrors.upload(&mut backend), 0);

        mirrors.release(&mut backend);
        assert_eq!(backend.live_textures(), 0);
        assert!(mirrors.texture_view(0).is_none());
        assert_eq!(mirrors.refresh(), 0);
    }
}
